//! A tool to analyze issue activity in GitHub repositories.

mod commands;

#[tokio::main]
async fn main() -> Result<(), ohno::AppError> {
    commands::run(std::env::args()).await
}
