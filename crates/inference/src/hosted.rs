//! HuggingFace-hosted question answering.
//!
//! Loading a model is a metadata lookup against the Hub
//! (`GET {hub_url}/api/models/{model}`): unknown models are rejected and models
//! whose `pipeline_tag` is not `question-answering` are refused. The returned
//! pipeline posts each question/context pair to the Inference API
//! (`POST {inference_url}/models/{model}`).
//!
//! No weights are downloaded; the "loaded" pipeline is a thin HTTP handle, so
//! registering many models is cheap on this backend.
//!
//! Only names shaped like Hub repository ids (`name` or `owner/name`, made of
//! ASCII letters, digits, `-`, `_` and `.`) are looked up; anything else is
//! reported as not found without a request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pipeline::{Answer, InferenceError, InferencePipeline, LoadError, ModelLoader, ModelName};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::BackendError;

/// Default Hub URL used for model metadata lookups.
pub const DEFAULT_HUB_URL: &str = "https://huggingface.co";

/// Default base URL of the hosted Inference API.
pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co";

const QUESTION_ANSWERING_TASK: &str = "question-answering";

/// Connection settings for [`HostedModelLoader`].
#[derive(Debug, Clone)]
pub struct HostedConfig {
    /// Base URL of the Hub metadata API.
    pub hub_url: String,
    /// Base URL of the Inference API.
    pub inference_url: String,
    /// Bearer token sent with every request, if set.
    pub api_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            hub_url: DEFAULT_HUB_URL.to_string(),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            api_token: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Loads question-answering models hosted on HuggingFace.
pub struct HostedModelLoader {
    client: reqwest::Client,
    hub_url: Url,
    inference_url: Url,
    api_token: Option<Arc<str>>,
}

impl HostedModelLoader {
    /// Builds a loader with its own HTTP client.
    pub fn new(config: HostedConfig) -> Result<Self, BackendError> {
        let hub_url = base_url("hub_url", &config.hub_url)?;
        let inference_url = base_url("inference_url", &config.inference_url)?;

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            hub_url,
            inference_url,
            api_token: config.api_token.filter(|t| !t.is_empty()).map(Arc::from),
        })
    }
}

fn base_url(name: &'static str, value: &str) -> Result<Url, BackendError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BackendError::EmptyUrl { name });
    }
    let url = Url::parse(value).map_err(|e| BackendError::InvalidUrl {
        name,
        message: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(BackendError::InvalidUrl {
            name,
            message: format!("'{value}' cannot be used as a base URL"),
        });
    }
    Ok(url)
}

/// Whether `name` has the shape of a Hub repository id.
fn is_repo_id(name: &str) -> bool {
    let segments: Vec<&str> = name.split('/').collect();
    segments.len() <= 2
        && segments.iter().all(|segment| {
            !segment.is_empty()
                && *segment != "."
                && *segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        })
}

/// `base` with `prefix` and each `/`-separated part of `model` appended as
/// percent-encoded path segments.
fn model_url(base: &Url, prefix: &[&str], model: &ModelName) -> Result<Url, LoadError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| LoadError::Unavailable {
            message: format!("'{base}' cannot be used as a base URL"),
        })?
        .pop_if_empty()
        .extend(prefix)
        .extend(model.as_str().split('/'));
    Ok(url)
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    #[serde(default)]
    pipeline_tag: Option<String>,
}

#[async_trait]
impl ModelLoader for HostedModelLoader {
    async fn load(&self, model_name: &ModelName) -> Result<Arc<dyn InferencePipeline>, LoadError> {
        if !is_repo_id(model_name.as_str()) {
            debug!(model = %model_name, "not a hub repository id");
            return Err(LoadError::NotFound);
        }
        let url = model_url(&self.hub_url, &["api", "models"], model_name)?;
        debug!(%url, "resolving model on hub");

        let response = authorize(self.client.get(url), self.api_token.as_deref())
            .send()
            .await
            .map_err(|e| LoadError::Unavailable {
                message: e.to_string(),
            })?;

        match response.status() {
            // The Hub answers 401 rather than 404 for unknown repositories when
            // the request is unauthenticated.
            StatusCode::NOT_FOUND | StatusCode::UNAUTHORIZED => return Err(LoadError::NotFound),
            status if !status.is_success() => {
                return Err(LoadError::Unavailable {
                    message: format!("hub returned {status}"),
                })
            }
            _ => {}
        }

        let info: ModelInfo = response.json().await.map_err(|e| LoadError::Unavailable {
            message: format!("unreadable model metadata: {e}"),
        })?;

        match info.pipeline_tag.as_deref() {
            Some(QUESTION_ANSWERING_TASK) => {}
            Some(task) => {
                return Err(LoadError::UnsupportedTask {
                    task: task.to_string(),
                })
            }
            None => warn!(model = %model_name, "model has no pipeline tag; assuming question-answering"),
        }

        let endpoint = model_url(&self.inference_url, &["models"], model_name)?;
        info!(model = %model_name, "hosted pipeline ready");
        Ok(Arc::new(HostedPipeline {
            client: self.client.clone(),
            endpoint,
            api_token: self.api_token.clone(),
        }))
    }
}

/// A question-answering model served by the hosted Inference API.
struct HostedPipeline {
    client: reqwest::Client,
    endpoint: Url,
    api_token: Option<Arc<str>>,
}

#[derive(Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
}

#[derive(Debug, Deserialize)]
struct QaOutput {
    answer: String,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    start: Option<usize>,
    #[serde(default)]
    end: Option<usize>,
}

/// The API returns a single object for one question, but some deployments
/// wrap it in a list of top-k candidates.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QaPayload {
    Single(QaOutput),
    Ranked(Vec<QaOutput>),
}

#[async_trait]
impl InferencePipeline for HostedPipeline {
    async fn infer(&self, question: &str, context: &str) -> Result<Answer, InferenceError> {
        let body = QaRequest {
            inputs: QaInputs { question, context },
        };

        let response = authorize(self.client.post(self.endpoint.clone()), self.api_token.as_deref())
            .json(&body)
            .send()
            .await
            .map_err(|e| InferenceError::Unavailable {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(InferenceError::Unavailable {
                message: format!("inference API returned {status}: {detail}"),
            });
        }

        let payload: QaPayload =
            response
                .json()
                .await
                .map_err(|e| InferenceError::InvalidResponse {
                    message: e.to_string(),
                })?;

        let output = match payload {
            QaPayload::Single(output) => output,
            QaPayload::Ranked(outputs) => {
                outputs
                    .into_iter()
                    .next()
                    .ok_or_else(|| InferenceError::InvalidResponse {
                        message: "empty candidate list".to_string(),
                    })?
            }
        };

        let mut answer = Answer::new(output.answer);
        if let Some(score) = output.score {
            answer = answer.with_score(score);
        }
        if let (Some(start), Some(end)) = (output.start, output.end) {
            answer = answer.with_span(start, end);
        }
        Ok(answer)
    }
}

fn authorize(request: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    match token {
        Some(token) => request.bearer_auth(token),
        None => request,
    }
}
