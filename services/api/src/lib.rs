mod cli;
mod commands;
mod infra;
mod routes;
mod server;

use expiry_reminder::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
