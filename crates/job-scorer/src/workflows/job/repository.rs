use super::record::{JobId, JobRecord};

/// Storage seam for scored jobs.
pub trait JobRepository: Send + Sync {
    fn insert(&self, record: JobRecord) -> Result<JobRecord, PersistenceError>;
    fn fetch(&self, id: &JobId) -> Result<Option<JobRecord>, PersistenceError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("job {0} already exists")]
    Conflict(JobId),
    #[error("job store unavailable: {0}")]
    Unavailable(String),
}
