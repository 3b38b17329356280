//! Error types for the pipeline registry domain.
//!
//! [`RegistryError`] is what callers of [`crate::PipelineRegistry`] see. The
//! collaborator-level errors [`LoadError`] and [`InferenceError`] are produced
//! by [`crate::ModelLoader`] and [`crate::InferencePipeline`] implementations
//! and are carried inside the registry error so the reason for a failure is
//! never lost.
//!
//! Every error is terminal for the request that produced it. The registry does
//! not retry; clients decide whether to try again.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ModelName;

// ---------------------------------------------------------------------------
// Collaborator errors
// ---------------------------------------------------------------------------

/// Why a model could not be turned into an inference pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum LoadError {
    /// The backend does not know a model with this identifier.
    #[error("model not found")]
    NotFound,

    /// The model exists but is not a question-answering model.
    #[error("model task '{task}' is not question-answering")]
    UnsupportedTask {
        /// The task the backend reported for the model (e.g. `"fill-mask"`).
        task: String,
    },

    /// The backend could not be reached or answered with an unexpected status.
    #[error("model backend unavailable: {message}")]
    Unavailable {
        /// Transport or status detail, for logs and the HTTP error detail.
        message: String,
    },
}

/// Why a loaded pipeline failed to produce an answer.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InferenceError {
    /// The backend could not be reached or rejected the call.
    #[error("inference backend unavailable: {message}")]
    Unavailable {
        /// Transport or status detail.
        message: String,
    },

    /// The backend answered, but not with something that contains an answer.
    #[error("inference backend returned an invalid response: {message}")]
    InvalidResponse {
        /// What was wrong with the response.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

/// Errors returned by [`crate::PipelineRegistry`] operations.
///
/// None of these leave the registry in a modified state: a failed registration
/// appends nothing, and lookups never write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The model-loading collaborator rejected or could not resolve the model.
    ///
    /// Produced by: `register`.
    #[error("model '{model_name}' could not be loaded: {reason}")]
    ModelLoadFailure {
        /// The model that was requested.
        model_name: ModelName,
        /// The collaborator's reason.
        reason: LoadError,
    },

    /// An analyze request named a model that has not been registered.
    ///
    /// Produced by: `analyze`.
    #[error("pipeline for model '{model_name}' is not active")]
    PipelineNotActive {
        /// The model that was requested.
        model_name: ModelName,
    },

    /// The pipeline exists but its backend failed while answering.
    ///
    /// Produced by: `analyze`.
    #[error("pipeline for model '{model_name}' failed: {source}")]
    InferenceFailure {
        /// The model whose pipeline failed.
        model_name: ModelName,
        /// The backend's error.
        #[source]
        source: InferenceError,
    },
}

impl RegistryError {
    /// Returns the model name the failed operation was about.
    pub fn model_name(&self) -> &ModelName {
        match self {
            Self::ModelLoadFailure { model_name, .. }
            | Self::PipelineNotActive { model_name }
            | Self::InferenceFailure { model_name, .. } => model_name,
        }
    }
}
