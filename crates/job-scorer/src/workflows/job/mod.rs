//! Job orchestration: the scoring pipeline, the records it produces, and the
//! service, storage and export seams around it.

pub mod export;
pub mod pipeline;
pub mod record;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use export::{render_text, write_json, ExportError, JobOutcomeReport};
pub use pipeline::{
    summarize, PipelineError, PipelineFailure, PipelineStage, SchemaPolicy, ScoringPipeline,
};
pub use record::{JobId, JobMetadata, JobRecord};
pub use repository::{JobRepository, PersistenceError};
pub use router::{job_router, JobSubmission, UploadedFile};
pub use service::{JobService, JobServiceError};
