//! Core domain for MRC Serve.
//!
//! This crate contains the model identifier newtype, the answer value types,
//! the error taxonomy, the port traits through which models are loaded and
//! queried, and the [`PipelineRegistry`] that ties them together.
//! Infrastructure crates implement the traits defined here; they never add
//! registry rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* a model must provide; the `inference` crate defines *how*.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ModelName`, `RequestId`) |
//! | [`types`] | Value types (`Answer`, `AnalyzeRequest`, `AnalyzeResult`, `Timestamp`) |
//! | [`errors`] | `RegistryError` and the collaborator errors it wraps |
//! | [`ports`] | `ModelLoader` and `InferencePipeline` traits |
//! | [`registry`] | `PipelineRegistry` |

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod registry;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{InferenceError, LoadError, RegistryError};
pub use identifiers::{ModelName, RequestId};
pub use ports::{InferencePipeline, ModelLoader};
pub use registry::PipelineRegistry;
pub use types::{AnalyzeRequest, AnalyzeResult, Answer, PipelineSummary, Timestamp};
