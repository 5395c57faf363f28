use std::sync::Arc;

use tracing::info;

use super::pipeline::{PipelineError, ScoringPipeline};
use super::record::{JobId, JobRecord};
use super::repository::{JobRepository, PersistenceError};
use crate::workflows::cancel::CancelSignal;
use crate::workflows::scope::{JobScopeSummary, SourceFile};
use crate::workflows::scoring::ModelClient;

/// Service composing the scoring pipeline with job storage.
pub struct JobService<C, R> {
    pipeline: Arc<ScoringPipeline<C>>,
    repository: Arc<R>,
    cancel: CancelSignal,
}

#[derive(Debug, thiserror::Error)]
pub enum JobServiceError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("job {0} not found")]
    NotFound(JobId),
}

impl<C, R> JobService<C, R>
where
    C: ModelClient + 'static,
    R: JobRepository + 'static,
{
    pub fn new(pipeline: Arc<ScoringPipeline<C>>, repository: Arc<R>, cancel: CancelSignal) -> Self {
        Self {
            pipeline,
            repository,
            cancel,
        }
    }

    /// Scores the uploads as one job and stores the resulting record.
    pub async fn score(&self, files: Vec<SourceFile>) -> Result<JobRecord, JobServiceError> {
        let record = self.pipeline.run(&files, &self.cancel).await?;
        let stored = self.repository.insert(record)?;
        info!(job_id = %stored.job_id, "job stored");
        Ok(stored)
    }

    pub fn summarize(&self, files: &[SourceFile]) -> Result<JobScopeSummary, JobServiceError> {
        Ok(self.pipeline.summarize(files, &self.cancel)?)
    }

    pub fn get(&self, id: &JobId) -> Result<JobRecord, JobServiceError> {
        self.repository
            .fetch(id)?
            .ok_or_else(|| JobServiceError::NotFound(id.clone()))
    }

    pub fn cancel_signal(&self) -> &CancelSignal {
        &self.cancel
    }
}
