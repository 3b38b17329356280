//! MRC Serve model-loading adapters.
//!
//! Implements the [`pipeline::ModelLoader`] and [`pipeline::InferencePipeline`]
//! traits with two backends:
//!
//! - [`HostedModelLoader`] — resolves models on the HuggingFace Hub and runs
//!   question answering through the hosted Inference API over HTTPS.
//! - [`LexicalModelLoader`] — an offline backend that answers with the context
//!   sentence sharing the most keywords with the question. Used for demos and
//!   for running the service without network access.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, authentication headers, response
//! parsing and status-code mapping all live here. The [`pipeline`] crate sees
//! only [`pipeline::ModelLoader`] and [`pipeline::InferencePipeline`].

pub mod hosted;
pub mod lexical;

pub use hosted::{HostedConfig, HostedModelLoader};
pub use lexical::LexicalModelLoader;

use thiserror::Error;

/// Errors raised while constructing a backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP client could not be built (e.g. TLS initialisation failed).
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// A configured URL is empty.
    #[error("backend URL '{name}' must not be empty")]
    EmptyUrl {
        /// Which URL setting was empty.
        name: &'static str,
    },

    /// A configured URL does not parse as an absolute base URL.
    #[error("backend URL '{name}' is invalid: {message}")]
    InvalidUrl {
        /// Which URL setting was invalid.
        name: &'static str,
        /// Why it was rejected.
        message: String,
    },
}
