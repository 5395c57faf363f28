use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryJobRepository};
use crate::routes::with_job_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use job_scorer::config::AppConfig;
use job_scorer::error::AppError;
use job_scorer::telemetry;
use job_scorer::workflows::job::{JobService, ScoringPipeline};
use job_scorer::workflows::scoring::{AnthropicClient, Rubric};
use job_scorer::workflows::CancelSignal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let client = Arc::new(AnthropicClient::new(&config.model)?);
    let pipeline = Arc::new(ScoringPipeline::new(
        client,
        Rubric::standard(),
        config.scoring.clone(),
        config.schema_policy,
    ));
    let cancel = CancelSignal::new();
    let job_service = Arc::new(JobService::new(
        pipeline,
        Arc::new(InMemoryJobRepository::default()),
        cancel.clone(),
    ));

    let app = with_job_routes(job_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, model = %config.model.model, "job scorer ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(readiness_flag, cancel))
        .await?;
    info!("job scorer stopped");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM, after marking the service unready and
/// cancelling in-flight jobs.
async fn shutdown_signal(readiness: Arc<AtomicBool>, cancel: CancelSignal) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    readiness.store(false, Ordering::Release);
    cancel.cancel();
    info!("shutdown requested, cancelling in-flight jobs");
}
