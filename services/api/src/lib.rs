mod cli;
mod infra;
mod routes;
mod score;
mod server;

use job_scorer::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
