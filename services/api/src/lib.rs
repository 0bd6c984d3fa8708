mod cli;
mod infra;
mod routes;
mod server;
mod tally;

use attendance_tally::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
