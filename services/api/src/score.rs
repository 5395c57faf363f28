use clap::Args;
use job_scorer::config::AppConfig;
use job_scorer::error::AppError;
use job_scorer::telemetry;
use job_scorer::workflows::job::{
    render_text, summarize, write_json, ExportError, JobOutcomeReport, SchemaPolicy,
    ScoringPipeline,
};
use job_scorer::workflows::scope::SourceFile;
use job_scorer::workflows::scoring::{AnthropicClient, Rubric};
use job_scorer::workflows::CancelSignal;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Spreadsheets (.xlsx, .xls, .csv) that make up one job
    #[arg(required = true)]
    pub(crate) files: Vec<PathBuf>,
    /// Write the job record as JSON to this path
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Print the completion report as JSON instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SummarizeArgs {
    /// Spreadsheets (.xlsx, .xls, .csv) that make up one job
    #[arg(required = true)]
    pub(crate) files: Vec<PathBuf>,
}

pub(crate) async fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let sources = read_sources(&args.files)?;
    let client = Arc::new(AnthropicClient::new(&config.model)?);
    let pipeline = ScoringPipeline::new(
        client,
        Rubric::standard(),
        config.scoring.clone(),
        config.schema_policy,
    );

    let started = Instant::now();
    let cancel = CancelSignal::new();
    let watcher = tokio::spawn(cancel_on_ctrl_c(cancel.clone()));
    let result = pipeline.run(&sources, &cancel).await;
    watcher.abort();

    let record = match result {
        Ok(record) => record,
        Err(err) => {
            if args.json {
                let report = JobOutcomeReport::failed(&err).with_processing_time(started.elapsed());
                println!("{}", to_pretty(&report)?);
            }
            return Err(err.into());
        }
    };

    if let Some(path) = &args.output {
        write_json(&record, path)?;
        info!(path = %path.display(), job_id = %record.job_id, "job record written");
    }

    if args.json {
        let report = JobOutcomeReport::completed(record).with_processing_time(started.elapsed());
        println!("{}", to_pretty(&report)?);
    } else {
        print!("{}", render_text(&record));
    }
    Ok(())
}

pub(crate) fn run_summarize(args: SummarizeArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let sources = read_sources(&args.files)?;
    println!("{}", summary_json(&sources, config.schema_policy)?);
    Ok(())
}

fn summary_json(sources: &[SourceFile], schema_policy: SchemaPolicy) -> Result<String, AppError> {
    let summary = summarize(sources, schema_policy, &CancelSignal::new())?;
    to_pretty(&summary)
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|err| AppError::Export(ExportError::from(err)))
}

/// Loads each path as an upload named after its final component.
fn read_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>, AppError> {
    paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path)?;
            Ok(SourceFile::new(display_name(path), bytes))
        })
        .collect()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

async fn cancel_on_ctrl_c(cancel: CancelSignal) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            warn!("interrupt received, cancelling job");
            cancel.cancel();
        }
        Err(err) => warn!(error = %err, "failed to listen for ctrl-c"),
    }
}
