use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use super::pipeline::{PipelineError, PipelineStage};
use super::record::JobRecord;
use crate::workflows::scoring::Division;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode job record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Writes the record as pretty-printed JSON.
pub fn write_json(record: &JobRecord, path: &Path) -> Result<(), ExportError> {
    let mut encoded = serde_json::to_vec_pretty(record)?;
    encoded.push(b'\n');
    fs::write(path, encoded).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Plain-text report for terminals and logs.
pub fn render_text(record: &JobRecord) -> String {
    let mut out = String::new();
    let summary = &record.summary;
    let scores = &record.scores;

    let _ = writeln!(out, "ERW Job Scoring Report");
    let _ = writeln!(out, "Job: {} ({})", record.filename, record.job_id);
    let _ = writeln!(
        out,
        "Analyzed at: {}",
        record.analyzed_at.format("%B %d, %Y at %I:%M %p UTC")
    );
    let _ = writeln!(
        out,
        "Sheets analyzed: {} ({} with scope)",
        summary.total_sheets, summary.sheets_with_scope
    );
    let _ = writeln!(out, "Package Score: {}", scores.package_score);
    let _ = writeln!(out, "{}", scores.overall_recommendation);

    let _ = writeln!(out, "\n{:<22} {:<6} Reasoning", "Company", "Score");
    for division in Division::ALL {
        let entry = scores.division(division);
        let _ = writeln!(
            out,
            "{:<22} {:<6} {}",
            division.name(),
            entry.score.to_string(),
            entry.reasoning
        );
        if !entry.key_indicators.is_empty() {
            let _ = writeln!(out, "{:<29} key: {}", "", entry.key_indicators.join(", "));
        }
    }

    if !summary.scope_counts.is_empty() {
        let _ = writeln!(out, "\nScope indicators");
        for (indicator, count) in &summary.scope_counts {
            let _ = writeln!(out, "  {:<34} {}", indicator.label(), count);
        }
    }
    out
}

/// Completion report handed back to an orchestrator.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcomeReport {
    Completed {
        #[serde(flatten)]
        record: JobRecord,
        #[serde(skip_serializing_if = "Option::is_none")]
        processing_time_seconds: Option<f64>,
    },
    Failed {
        stage: PipelineStage,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        processing_time_seconds: Option<f64>,
    },
}

impl JobOutcomeReport {
    pub fn completed(record: JobRecord) -> Self {
        JobOutcomeReport::Completed {
            record,
            processing_time_seconds: None,
        }
    }

    pub fn failed(error: &PipelineError) -> Self {
        JobOutcomeReport::Failed {
            stage: error.stage,
            error: error.failure.to_string(),
            processing_time_seconds: None,
        }
    }

    /// Records wall-clock time spent on the job, in seconds to one decimal.
    pub fn with_processing_time(mut self, elapsed: Duration) -> Self {
        let seconds = (elapsed.as_secs_f64() * 10.0).round() / 10.0;
        match &mut self {
            JobOutcomeReport::Completed {
                processing_time_seconds,
                ..
            }
            | JobOutcomeReport::Failed {
                processing_time_seconds,
                ..
            } => *processing_time_seconds = Some(seconds),
        }
        self
    }
}

impl From<Result<JobRecord, PipelineError>> for JobOutcomeReport {
    fn from(result: Result<JobRecord, PipelineError>) -> Self {
        match result {
            Ok(record) => JobOutcomeReport::completed(record),
            Err(err) => JobOutcomeReport::failed(&err),
        }
    }
}
