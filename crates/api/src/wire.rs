//! JSON bodies exchanged over HTTP.
//!
//! These are the shapes clients depend on; they are shared with the CLI client
//! so both sides of the wire agree on field names.

use serde::{Deserialize, Serialize};

/// `POST /pipeline/` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePipelineIn {
    pub model_name: String,
}

/// `POST /pipeline/` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePipelineOut {
    pub model_name: String,
}

/// `GET /pipeline/` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineList {
    pub pipelines: Vec<String>,
}

/// `POST /pipeline/analyze/` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeIn {
    pub model_name: String,
    pub question: String,
    pub context: String,
}

/// `POST /pipeline/analyze/` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeOut {
    pub model_name: String,
    pub answer: String,
}

/// Body of every 4xx/5xx response produced by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// `GET /health` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
    pub pipelines: usize,
}
