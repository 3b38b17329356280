//! Mapping of registry errors onto HTTP responses.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pipeline::RegistryError;
use thiserror::Error;
use tracing::warn;

use crate::wire::ErrorBody;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The registry refused the operation.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The request named no model at all.
    #[error("model_name must not be empty")]
    EmptyModelName,

    /// The request did not complete within the configured timeout.
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

impl ApiError {
    /// HTTP status for this error.
    ///
    /// Unknown or unloadable models and inactive pipelines are all 404; a
    /// pipeline whose backend fails mid-request is a bad gateway.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Registry(RegistryError::ModelLoadFailure { .. })
            | Self::Registry(RegistryError::PipelineNotActive { .. })
            | Self::EmptyModelName => StatusCode::NOT_FOUND,
            Self::Registry(RegistryError::InferenceFailure { .. }) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            Self::Registry(err) => {
                warn!(model = %err.model_name(), status = status.as_u16(), error = %err, "request failed")
            }
            other => warn!(status = status.as_u16(), error = %other, "request failed"),
        }
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{InferenceError, LoadError, ModelName};

    #[test]
    fn statuses_follow_error_kind() {
        let name = ModelName::new("m").unwrap();
        assert_eq!(
            ApiError::from(RegistryError::ModelLoadFailure {
                model_name: name.clone(),
                reason: LoadError::NotFound,
            })
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(RegistryError::PipelineNotActive {
                model_name: name.clone()
            })
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(RegistryError::InferenceFailure {
                model_name: name,
                source: InferenceError::Unavailable {
                    message: "timeout".into()
                },
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::EmptyModelName.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Timeout(Duration::from_millis(50)).status(),
            StatusCode::REQUEST_TIMEOUT
        );
    }

    #[test]
    fn timeout_message_names_the_limit() {
        assert_eq!(
            ApiError::Timeout(Duration::from_millis(1500)).to_string(),
            "request timed out after 1.5s"
        );
    }
}
