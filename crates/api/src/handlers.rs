//! HTTP request handlers.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use pipeline::{AnalyzeRequest, ModelName};
use tracing::info;

use crate::error::ApiError;
use crate::wire::{
    AnalyzeIn, AnalyzeOut, CreatePipelineIn, CreatePipelineOut, Health, PipelineList,
};
use crate::AppState;

/// Build all routes. Pipeline paths are served with and without the
/// trailing slash.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(hello_world))
        .route("/pipeline/", get(list_pipelines).post(create_pipeline))
        .route("/pipeline", get(list_pipelines).post(create_pipeline))
        .route("/pipeline/analyze/", post(analyze))
        .route("/pipeline/analyze", post(analyze))
        .route("/health", get(health_check))
}

async fn hello_world() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "hello": "world" }))
}

async fn list_pipelines(State(state): State<AppState>) -> Json<PipelineList> {
    let pipelines = state
        .registry
        .list()
        .await
        .into_iter()
        .map(String::from)
        .collect();
    Json(PipelineList { pipelines })
}

async fn create_pipeline(
    State(state): State<AppState>,
    Json(body): Json<CreatePipelineIn>,
) -> Result<Json<CreatePipelineOut>, ApiError> {
    let model_name = ModelName::new(body.model_name).ok_or(ApiError::EmptyModelName)?;
    let model_name = state.registry.register(model_name).await?;
    info!(model = %model_name, "pipeline active");
    Ok(Json(CreatePipelineOut {
        model_name: model_name.into(),
    }))
}

async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeIn>,
) -> Result<Json<AnalyzeOut>, ApiError> {
    let model_name = ModelName::new(body.model_name).ok_or(ApiError::EmptyModelName)?;
    let result = state
        .registry
        .analyze(AnalyzeRequest {
            model_name,
            question: body.question,
            context: body.context,
        })
        .await?;
    Ok(Json(AnalyzeOut {
        model_name: result.model_name.into(),
        answer: result.answer.text,
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        pipelines: state.registry.len().await,
    })
}
