mod cli;
mod infra;
mod quote;
mod routes;
mod server;

use shoe_rental::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
