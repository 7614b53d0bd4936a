mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use water_connect::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
