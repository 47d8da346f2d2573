use ai_readiness::assessment::{
    CatalogError, CollaboratorError, QuestionCatalog, SubmissionRecord, SubmissionStore,
};
use ai_readiness::config::AssessmentConfig;
use ai_readiness::integrations::JsonlSubmissionStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local document store used when no submissions file is configured.
#[derive(Debug, Default, Clone)]
pub(crate) struct InMemorySubmissionStore {
    records: Arc<Mutex<Vec<SubmissionRecord>>>,
}

impl SubmissionStore for InMemorySubmissionStore {
    fn append(&self, record: &SubmissionRecord) -> Result<String, CollaboratorError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        guard.push(record.clone());
        Ok(format!("mem-{:06}", guard.len()))
    }

    fn list(&self) -> Result<Vec<SubmissionRecord>, CollaboratorError> {
        Ok(self.records.lock().expect("store mutex poisoned").clone())
    }
}

pub(crate) fn load_catalog(path: Option<&Path>) -> Result<QuestionCatalog, CatalogError> {
    match path {
        Some(path) => {
            let catalog = QuestionCatalog::from_path(path)?;
            info!(path = %path.display(), "loaded question catalog");
            Ok(catalog)
        }
        None => Ok(QuestionCatalog::standard()),
    }
}

pub(crate) fn submission_store(config: &AssessmentConfig) -> Arc<dyn SubmissionStore> {
    match &config.submissions_path {
        Some(path) => {
            info!(path = %path.display(), "persisting submissions to JSON lines file");
            Arc::new(JsonlSubmissionStore::new(path.clone()))
        }
        None => {
            info!("persisting submissions in memory");
            Arc::new(InMemorySubmissionStore::default())
        }
    }
}
