//! Port traits implemented by infrastructure crates.
//!
//! The registry only ever talks to models through these two traits. Loading,
//! tokenisation and inference are black boxes behind them; the `inference`
//! crate provides the concrete adapters.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{Answer, InferenceError, LoadError, ModelName};

/// A loaded, ready-to-query question-answering model.
///
/// Exposes exactly one capability. Implementations must be safe to call from
/// many requests at once; the registry hands out shared references and never
/// serialises inference calls.
#[async_trait]
pub trait InferencePipeline: Send + Sync {
    /// Extracts an answer to `question` from `context`.
    async fn infer(&self, question: &str, context: &str) -> Result<Answer, InferenceError>;
}

/// Turns a model identifier into an [`InferencePipeline`].
///
/// Loading may be slow and memory-hungry. The registry calls it at most once
/// per distinct model name for the lifetime of the process.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Loads `model_name`, or explains why it cannot be loaded.
    async fn load(&self, model_name: &ModelName) -> Result<Arc<dyn InferencePipeline>, LoadError>;
}
