//! HTTP client for a running service, used by the `register`, `list` and
//! `ask` subcommands.

use api::wire::{
    AnalyzeIn, AnalyzeOut, CreatePipelineIn, CreatePipelineOut, ErrorBody, PipelineList,
};
use reqwest::Response;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("service returned {status}: {detail}")]
    Api { status: u16, detail: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Loads `model` on the service; returns the name it was registered under.
    pub async fn register(&self, model: &str) -> Result<String> {
        let response = self
            .client
            .post(self.url("/pipeline/"))
            .json(&CreatePipelineIn {
                model_name: model.to_string(),
            })
            .send()
            .await?;
        let out: CreatePipelineOut = decode(response).await?;
        Ok(out.model_name)
    }

    pub async fn list(&self) -> Result<Vec<String>> {
        let response = self.client.get(self.url("/pipeline/")).send().await?;
        let out: PipelineList = decode(response).await?;
        Ok(out.pipelines)
    }

    pub async fn analyze(&self, model: &str, question: &str, context: &str) -> Result<AnalyzeOut> {
        let response = self
            .client
            .post(self.url("/pipeline/analyze/"))
            .json(&AnalyzeIn {
                model_name: model.to_string(),
                question: question.to_string(),
                context: context.to_string(),
            })
            .send()
            .await?;
        decode(response).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }
    let text = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.detail)
        .unwrap_or(text);
    Err(ClientError::Api {
        status: status.as_u16(),
        detail,
    })
}
