use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::record::{JobMetadata, JobRecord};
use crate::workflows::cancel::CancelSignal;
use crate::workflows::scope::{
    aggregate, parse_spreadsheet, JobScopeSummary, ParsedSpreadsheet, SchemaError, SourceFile,
};
use crate::workflows::scoring::{JobScorer, ModelClient, Rubric, ScoringError, ScoringPolicy};

/// Steps a job moves through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Normalized,
    Aggregated,
    Scored,
    Assembled,
}

impl PipelineStage {
    pub const fn label(self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Normalized => "normalized",
            PipelineStage::Aggregated => "aggregated",
            PipelineStage::Scored => "scored",
            PipelineStage::Assembled => "assembled",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What to do when one file of a multi-file job cannot be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPolicy {
    #[default]
    FailJob,
    SkipFile,
}

impl SchemaPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fail" | "fail_job" => Some(SchemaPolicy::FailJob),
            "skip" | "skip_file" => Some(SchemaPolicy::SkipFile),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineFailure {
    #[error("no files were submitted")]
    NoFiles,
    #[error(transparent)]
    Schema(SchemaError),
    #[error("none of the {} submitted files could be normalized", .0.len())]
    NoUsableFiles(Vec<SchemaError>),
    #[error(transparent)]
    Scoring(ScoringError),
    #[error("job cancelled")]
    Cancelled,
}

/// Terminal failure, tagged with the stage the job was entering.
#[derive(Debug, thiserror::Error)]
#[error("job failed at {stage}: {failure}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub failure: PipelineFailure,
}

impl PipelineError {
    fn at(stage: PipelineStage, failure: PipelineFailure) -> Self {
        warn!(stage = stage.label(), error = %failure, "job failed");
        Self { stage, failure }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.failure,
            PipelineFailure::Cancelled | PipelineFailure::Scoring(ScoringError::Cancelled)
        )
    }
}

fn checkpoint(cancel: &CancelSignal, entering: PipelineStage) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::at(entering, PipelineFailure::Cancelled));
    }
    Ok(())
}

/// Normalizes and aggregates uploads without calling the model.
pub fn summarize(
    files: &[SourceFile],
    schema_policy: SchemaPolicy,
    cancel: &CancelSignal,
) -> Result<JobScopeSummary, PipelineError> {
    let (_, summary) = normalize_and_aggregate(files, schema_policy, cancel)?;
    Ok(summary)
}

fn normalize_and_aggregate(
    files: &[SourceFile],
    schema_policy: SchemaPolicy,
    cancel: &CancelSignal,
) -> Result<(Vec<String>, JobScopeSummary), PipelineError> {
    checkpoint(cancel, PipelineStage::Received)?;
    if files.is_empty() {
        return Err(PipelineError::at(
            PipelineStage::Received,
            PipelineFailure::NoFiles,
        ));
    }
    info!(files = files.len(), "job received");

    checkpoint(cancel, PipelineStage::Normalized)?;
    let mut parsed: Vec<ParsedSpreadsheet> = Vec::with_capacity(files.len());
    let mut rejected = Vec::new();
    for file in files {
        match parse_spreadsheet(file) {
            Ok(sheet) => {
                info!(
                    file = %sheet.filename,
                    dialect = sheet.dialect.label(),
                    total_sheets = sheet.total_sheets,
                    sheets_with_scope = sheet.sheets_with_scope(),
                    "file normalized"
                );
                parsed.push(sheet);
            }
            Err(err) => match schema_policy {
                SchemaPolicy::FailJob => {
                    return Err(PipelineError::at(
                        PipelineStage::Normalized,
                        PipelineFailure::Schema(err),
                    ));
                }
                SchemaPolicy::SkipFile => {
                    warn!(file = err.file(), error = %err, "skipping unreadable file");
                    rejected.push(err);
                }
            },
        }
    }
    if parsed.is_empty() {
        return Err(PipelineError::at(
            PipelineStage::Normalized,
            PipelineFailure::NoUsableFiles(rejected),
        ));
    }

    checkpoint(cancel, PipelineStage::Aggregated)?;
    let source_files = parsed.iter().map(|sheet| sheet.filename.clone()).collect();
    let summary = aggregate(&parsed);
    info!(
        total_sheets = summary.total_sheets,
        sheets_with_scope = summary.sheets_with_scope,
        "scope aggregated"
    );
    Ok((source_files, summary))
}

/// Runs uploads through normalization, aggregation, scoring and assembly.
pub struct ScoringPipeline<C> {
    scorer: JobScorer<C>,
    schema_policy: SchemaPolicy,
}

impl<C> ScoringPipeline<C>
where
    C: ModelClient + 'static,
{
    pub fn new(
        client: Arc<C>,
        rubric: Rubric,
        policy: ScoringPolicy,
        schema_policy: SchemaPolicy,
    ) -> Self {
        Self {
            scorer: JobScorer::new(client, rubric, policy),
            schema_policy,
        }
    }

    pub fn schema_policy(&self) -> SchemaPolicy {
        self.schema_policy
    }

    pub fn summarize(
        &self,
        files: &[SourceFile],
        cancel: &CancelSignal,
    ) -> Result<JobScopeSummary, PipelineError> {
        summarize(files, self.schema_policy, cancel)
    }

    pub async fn run(
        &self,
        files: &[SourceFile],
        cancel: &CancelSignal,
    ) -> Result<JobRecord, PipelineError> {
        let (source_files, summary) = normalize_and_aggregate(files, self.schema_policy, cancel)?;

        checkpoint(cancel, PipelineStage::Scored)?;
        let scores = self
            .scorer
            .score(&summary, cancel)
            .await
            .map_err(|err| match err {
                ScoringError::Cancelled => {
                    PipelineError::at(PipelineStage::Scored, PipelineFailure::Cancelled)
                }
                other => PipelineError::at(PipelineStage::Scored, PipelineFailure::Scoring(other)),
            })?;

        checkpoint(cancel, PipelineStage::Assembled)?;
        let record = JobRecord::assemble(summary, scores, JobMetadata::new(source_files));
        info!(
            job_id = %record.job_id,
            filename = %record.filename,
            package_score = record.scores.package_score.value(),
            "job assembled"
        );
        Ok(record)
    }
}
