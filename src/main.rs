//! F1 Podium Pipeline
//!
//! Fetches F1 race data from the OpenF1 API, maintains JSON caches, and asks
//! Gemini to predict the next race podium.

mod cli;
mod config;
mod drivers;
mod news;
mod openf1;
mod predict;
mod results;
mod storage;
mod types;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "f1_podium=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::FetchResults { years } => cli::run_fetch_results(years).await,
        Commands::FetchDrivers { years } => cli::run_fetch_drivers(years).await,
        Commands::FetchNews { limit } => cli::run_fetch_news(limit).await,
        Commands::Predict { skip_news, output } => cli::run_predict(skip_news, output).await,
    }
}
