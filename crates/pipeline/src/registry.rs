//! The in-memory pipeline registry.
//!
//! Holds the insertion-ordered list of loaded pipelines and dispatches analyze
//! calls to them by exact model name. One registry is built at service start
//! and shared by every request handler; nothing is persisted.
//!
//! ## Locking
//!
//! Entries live behind a single [`RwLock`]. Registration holds the write lock
//! across the existence check, the model load and the append, so two
//! concurrent registrations of the same new name produce one entry and one
//! load. Listing and analyzing take the read lock; analyze clones the handle
//! and drops the lock before running inference.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::{
    AnalyzeRequest, AnalyzeResult, InferencePipeline, ModelLoader, ModelName, PipelineSummary,
    RegistryError, Timestamp,
};

/// One registered pipeline. Never mutated after insertion.
struct PipelineEntry {
    name: ModelName,
    handle: Arc<dyn InferencePipeline>,
    loaded_at: Timestamp,
}

/// Registry of active question-answering pipelines, keyed by model name.
pub struct PipelineRegistry {
    loader: Arc<dyn ModelLoader>,
    entries: RwLock<Vec<PipelineEntry>>,
}

impl PipelineRegistry {
    /// Creates an empty registry that loads models through `loader`.
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Ensures a pipeline for `model_name` is loaded and returns its name.
    ///
    /// Idempotent: an already-registered name is returned without touching
    /// the loader. A load failure leaves the registry unchanged.
    #[instrument(skip_all, fields(model = %model_name))]
    pub async fn register(&self, model_name: ModelName) -> Result<ModelName, RegistryError> {
        let mut entries = self.entries.write().await;

        if let Some(existing) = find(&entries, &model_name) {
            debug!("pipeline already active");
            return Ok(existing.name.clone());
        }

        info!("loading model");
        let handle = match self.loader.load(&model_name).await {
            Ok(handle) => handle,
            Err(reason) => {
                warn!(%reason, "model load failed");
                return Err(RegistryError::ModelLoadFailure { model_name, reason });
            }
        };

        let entry = PipelineEntry {
            name: model_name,
            handle,
            loaded_at: Timestamp::now(),
        };
        info!(loaded_at = %entry.loaded_at, active = entries.len() + 1, "pipeline registered");
        let name = entry.name.clone();
        entries.push(entry);
        Ok(name)
    }

    /// Returns the names of all registered pipelines in registration order.
    pub async fn list(&self) -> Vec<ModelName> {
        self.entries
            .read()
            .await
            .iter()
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Returns the name and load time of every registered pipeline.
    pub async fn describe(&self) -> Vec<PipelineSummary> {
        self.entries
            .read()
            .await
            .iter()
            .map(|entry| PipelineSummary {
                name: entry.name.clone(),
                loaded_at: entry.loaded_at,
            })
            .collect()
    }

    /// Returns the number of registered pipelines.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns `true` if no pipeline has been registered yet.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Answers `request.question` from `request.context` with the pipeline
    /// registered under `request.model_name`.
    #[instrument(skip_all, fields(model = %request.model_name))]
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<AnalyzeResult, RegistryError> {
        let handle = {
            let entries = self.entries.read().await;
            match find(&entries, &request.model_name) {
                Some(entry) => Arc::clone(&entry.handle),
                None => {
                    warn!("analyze requested for inactive pipeline");
                    return Err(RegistryError::PipelineNotActive {
                        model_name: request.model_name,
                    });
                }
            }
        };

        let answer = handle
            .infer(&request.question, &request.context)
            .await
            .map_err(|source| {
                warn!(error = %source, "inference failed");
                RegistryError::InferenceFailure {
                    model_name: request.model_name.clone(),
                    source,
                }
            })?;

        debug!(score = ?answer.score, span = ?answer.span, "answer produced");
        Ok(AnalyzeResult {
            model_name: request.model_name,
            answer,
        })
    }
}

impl std::fmt::Debug for PipelineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRegistry").finish_non_exhaustive()
    }
}

fn find<'a>(entries: &'a [PipelineEntry], name: &ModelName) -> Option<&'a PipelineEntry> {
    entries.iter().find(|entry| entry.name == *name)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::{Answer, InferenceError, LoadError};

    /// Answers with a fixed string derived from the model and question.
    struct EchoPipeline {
        model: String,
    }

    #[async_trait]
    impl InferencePipeline for EchoPipeline {
        async fn infer(&self, question: &str, context: &str) -> Result<Answer, InferenceError> {
            Ok(Answer::new(format!("{}|{}|{}", self.model, question, context)))
        }
    }

    struct FailingPipeline;

    #[async_trait]
    impl InferencePipeline for FailingPipeline {
        async fn infer(&self, _: &str, _: &str) -> Result<Answer, InferenceError> {
            Err(InferenceError::Unavailable {
                message: "connection reset".into(),
            })
        }
    }

    /// Loads anything except names in `rejected`, counting calls per name.
    #[derive(Default)]
    struct FakeLoader {
        rejected: Vec<String>,
        broken: Vec<String>,
        delay: Option<Duration>,
        calls: Mutex<HashMap<String, usize>>,
        total: AtomicUsize,
    }

    impl FakeLoader {
        fn calls_for(&self, name: &str) -> usize {
            self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
        }
    }

    #[async_trait]
    impl ModelLoader for FakeLoader {
        async fn load(
            &self,
            model_name: &ModelName,
        ) -> Result<Arc<dyn InferencePipeline>, LoadError> {
            self.total.fetch_add(1, Ordering::SeqCst);
            *self
                .calls
                .lock()
                .unwrap()
                .entry(model_name.to_string())
                .or_default() += 1;
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.rejected.iter().any(|r| r == model_name.as_str()) {
                return Err(LoadError::NotFound);
            }
            if self.broken.iter().any(|r| r == model_name.as_str()) {
                return Ok(Arc::new(FailingPipeline));
            }
            Ok(Arc::new(EchoPipeline {
                model: model_name.to_string(),
            }))
        }
    }

    fn name(s: &str) -> ModelName {
        ModelName::new(s).unwrap()
    }

    fn request(model: &str, question: &str, context: &str) -> AnalyzeRequest {
        AnalyzeRequest {
            model_name: name(model),
            question: question.into(),
            context: context.into(),
        }
    }

    #[tokio::test]
    async fn new_registry_is_empty() {
        let registry = PipelineRegistry::new(Arc::new(FakeLoader::default()));
        assert!(registry.is_empty().await);
        assert!(registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn registering_twice_keeps_one_entry_and_loads_once() {
        let loader = Arc::new(FakeLoader::default());
        let registry = PipelineRegistry::new(loader.clone());

        assert_eq!(registry.register(name("a")).await.unwrap(), name("a"));
        assert_eq!(registry.register(name("a")).await.unwrap(), name("a"));

        assert_eq!(registry.list().await, vec![name("a")]);
        assert_eq!(loader.calls_for("a"), 1);
    }

    #[tokio::test]
    async fn list_preserves_registration_order() {
        let registry = PipelineRegistry::new(Arc::new(FakeLoader::default()));
        registry.register(name("b")).await.unwrap();
        registry.register(name("a")).await.unwrap();
        registry.register(name("c")).await.unwrap();

        assert_eq!(registry.list().await, vec![name("b"), name("a"), name("c")]);
        assert_eq!(registry.len().await, 3);
    }

    #[tokio::test]
    async fn failed_load_leaves_registry_unchanged() {
        let loader = Arc::new(FakeLoader {
            rejected: vec!["not-a-real-model".into()],
            ..FakeLoader::default()
        });
        let registry = PipelineRegistry::new(loader.clone());
        registry.register(name("a")).await.unwrap();

        let err = registry.register(name("not-a-real-model")).await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::ModelLoadFailure {
                model_name: name("not-a-real-model"),
                reason: LoadError::NotFound,
            }
        );
        assert_eq!(registry.list().await, vec![name("a")]);
    }

    #[tokio::test]
    async fn failed_load_is_retried_on_next_registration() {
        let loader = Arc::new(FakeLoader {
            rejected: vec!["flaky".into()],
            ..FakeLoader::default()
        });
        let registry = PipelineRegistry::new(loader.clone());

        assert!(registry.register(name("flaky")).await.is_err());
        assert!(registry.register(name("flaky")).await.is_err());
        assert_eq!(loader.calls_for("flaky"), 2);
    }

    #[tokio::test]
    async fn analyze_unknown_model_is_not_active() {
        let registry = PipelineRegistry::new(Arc::new(FakeLoader::default()));
        registry.register(name("a")).await.unwrap();

        let err = registry.analyze(request("b", "Q", "C")).await.unwrap_err();
        assert_eq!(
            err,
            RegistryError::PipelineNotActive {
                model_name: name("b")
            }
        );
        assert_eq!(registry.list().await, vec![name("a")]);
    }

    #[tokio::test]
    async fn analyze_routes_to_matching_pipeline() {
        let registry = PipelineRegistry::new(Arc::new(FakeLoader::default()));
        registry.register(name("a")).await.unwrap();
        registry.register(name("b")).await.unwrap();

        let result = registry.analyze(request("b", "Q", "C")).await.unwrap();
        assert_eq!(result.model_name, name("b"));
        assert_eq!(result.answer.text, "b|Q|C");
    }

    #[tokio::test]
    async fn analyze_lookup_is_case_sensitive() {
        let registry = PipelineRegistry::new(Arc::new(FakeLoader::default()));
        registry.register(name("Model")).await.unwrap();

        let err = registry.analyze(request("model", "Q", "C")).await.unwrap_err();
        assert!(matches!(err, RegistryError::PipelineNotActive { .. }));
    }

    #[tokio::test]
    async fn inference_failure_is_reported_and_entry_kept() {
        let loader = Arc::new(FakeLoader {
            broken: vec!["broken".into()],
            ..FakeLoader::default()
        });
        let registry = PipelineRegistry::new(loader);
        registry.register(name("broken")).await.unwrap();

        let err = registry.analyze(request("broken", "Q", "C")).await.unwrap_err();
        assert!(matches!(err, RegistryError::InferenceFailure { .. }));
        assert_eq!(registry.list().await, vec![name("broken")]);
    }

    #[tokio::test]
    async fn concurrent_registration_of_same_name_loads_once() {
        let loader = Arc::new(FakeLoader {
            delay: Some(Duration::from_millis(50)),
            ..FakeLoader::default()
        });
        let registry = Arc::new(PipelineRegistry::new(loader.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move { registry.register(name("shared")).await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), name("shared"));
        }
        assert_eq!(registry.list().await, vec![name("shared")]);
        assert_eq!(loader.calls_for("shared"), 1);
        assert_eq!(loader.total.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn describe_reports_load_times_in_order() {
        let registry = PipelineRegistry::new(Arc::new(FakeLoader::default()));
        let before = Timestamp::now();
        registry.register(name("a")).await.unwrap();
        registry.register(name("b")).await.unwrap();

        let summaries = registry.describe().await;
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, name("a"));
        assert_eq!(summaries[1].name, name("b"));
        assert!(summaries[0].loaded_at >= before);
        assert!(summaries[1].loaded_at >= summaries[0].loaded_at);
    }
}
