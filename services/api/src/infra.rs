use job_scorer::workflows::job::{JobId, JobRecord, JobRepository, PersistenceError};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local job store; records are lost on restart.
#[derive(Default, Clone)]
pub(crate) struct InMemoryJobRepository {
    records: Arc<Mutex<HashMap<JobId, JobRecord>>>,
}

impl InMemoryJobRepository {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<JobId, JobRecord>>, PersistenceError> {
        self.records
            .lock()
            .map_err(|_| PersistenceError::Unavailable("job store lock poisoned".to_string()))
    }
}

impl JobRepository for InMemoryJobRepository {
    fn insert(&self, record: JobRecord) -> Result<JobRecord, PersistenceError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&record.job_id) {
            return Err(PersistenceError::Conflict(record.job_id.clone()));
        }
        guard.insert(record.job_id.clone(), record.clone());
        Ok(record)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<JobRecord>, PersistenceError> {
        let guard = self.lock()?;
        Ok(guard.get(id).cloned())
    }
}
