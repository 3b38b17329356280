//! `serve` subcommand: builds the registry and runs the HTTP service.

use std::sync::Arc;

use anyhow::{Context, Result};
use api::AppState;
use inference::{HostedModelLoader, LexicalModelLoader};
use pipeline::{ModelLoader, PipelineRegistry};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::{BackendConfig, BackendKind, ServiceConfig, API_TOKEN_ENV};

/// Runs the service until Ctrl-C. `config` is expected to have passed
/// [`ServiceConfig::validate`].
pub async fn run(config: ServiceConfig) -> Result<()> {
    let addr = config.bind_addr()?;

    let loader = build_loader(&config.backend)?;
    let registry = Arc::new(PipelineRegistry::new(loader));
    preload(&registry, &config).await?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let router = api::build_router(AppState::new(registry), config.request_timeout());

    api::serve(listener, router, shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

/// Builds the configured [`ModelLoader`].
pub fn build_loader(backend: &BackendConfig) -> Result<Arc<dyn ModelLoader>> {
    let loader: Arc<dyn ModelLoader> = match backend.kind {
        BackendKind::Hosted => {
            let token = std::env::var(API_TOKEN_ENV).ok();
            Arc::new(HostedModelLoader::new(backend.hosted(token))?)
        }
        BackendKind::Lexical => Arc::new(LexicalModelLoader::new(backend.allowed_models()?)),
    };
    info!(backend = ?backend.kind, "model backend configured");
    Ok(loader)
}

/// Registers every `preload` model. Any failure aborts startup.
pub async fn preload(registry: &PipelineRegistry, config: &ServiceConfig) -> Result<()> {
    for model in config.preload_models()? {
        registry
            .register(model)
            .await
            .context("failed to preload model")?;
    }
    for summary in registry.describe().await {
        info!(model = %summary.name, loaded_at = %summary.loaded_at, "pipeline preloaded");
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C; shutting down");
    } else {
        info!("shutdown requested");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexical(models: &[&str], preload: &[&str]) -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.backend.kind = BackendKind::Lexical;
        config.backend.models = models.iter().map(|m| m.to_string()).collect();
        config.preload = preload.iter().map(|m| m.to_string()).collect();
        config
    }

    #[tokio::test]
    async fn preload_registers_in_order() {
        let config = lexical(&[], &["b", "a"]);
        let registry = PipelineRegistry::new(build_loader(&config.backend).unwrap());

        preload(&registry, &config).await.unwrap();

        let names: Vec<String> = registry.list().await.into_iter().map(String::from).collect();
        assert_eq!(names, vec!["b".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn run_rejects_unparseable_bind() {
        let mut config = lexical(&[], &[]);
        config.bind = "not an address".into();
        assert!(run(config).await.is_err());
    }

    #[tokio::test]
    async fn preload_failure_aborts() {
        let config = lexical(&["allowed"], &["allowed", "other"]);
        let registry = PipelineRegistry::new(build_loader(&config.backend).unwrap());

        let err = preload(&registry, &config).await.unwrap_err();
        assert!(format!("{err:#}").contains("other"), "{err:#}");
    }
}
