//! CLI commands for the F1 podium pipeline.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::news;
use crate::openf1::OpenF1Client;
use crate::predict::{self, GeminiClient};
use crate::results;
use crate::storage::Store;
use crate::types::{DriverDirectory, PredictionRecord};

#[derive(Parser)]
#[command(name = "f1-podium")]
#[command(version, about = "F1 race data pipeline and LLM podium predictor", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Update the incremental race-results cache
    FetchResults {
        /// Seasons to process (default: from config)
        #[arg(short, long, value_delimiter = ',')]
        years: Vec<u16>,
    },

    /// Rebuild the per-season driver directories
    FetchDrivers {
        /// Seasons to process (default: from config)
        #[arg(short, long, value_delimiter = ',')]
        years: Vec<u16>,
    },

    /// Fetch and condense the latest F1 news
    FetchNews {
        /// Number of articles to fetch
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Predict the next race podium with Gemini
    Predict {
        /// Skip the news fetch and predict from history alone
        #[arg(long)]
        skip_news: bool,

        /// Output path override for the prediction JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn effective_years(cli_years: Vec<u16>, config: &AppConfig) -> Vec<u16> {
    if cli_years.is_empty() {
        config.data.years.clone()
    } else {
        cli_years
    }
}

/// Run the incremental results fetch for the configured seasons.
pub async fn run_fetch_results(years: Vec<u16>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let years = effective_years(years, &config);

    let store = Store::new(&config.data.dir);
    let api = OpenF1Client::new(&config.api.base_url, config.api_timeout())?;

    let cache = store.load_results()?;
    let mut directories = std::collections::BTreeMap::new();
    for &year in &years {
        directories.insert(year, store.load_driver_directory(year)?);
    }

    let merged = results::build_all(&api, &years, &cache, &directories).await?;
    store.save_results(&merged)?;

    println!("Saved race results to {}", store.results_path().display());
    Ok(())
}

/// Rebuild the driver directory for each configured season.
pub async fn run_fetch_drivers(years: Vec<u16>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let years = effective_years(years, &config);

    let store = Store::new(&config.data.dir);
    let api = OpenF1Client::new(&config.api.base_url, config.api_timeout())?;

    for &year in &years {
        let directory: DriverDirectory = crate::drivers::fetch_directory(&api, year).await?;
        store.save_driver_directory(year, &directory)?;
        println!(
            "Saved {} drivers to {}",
            directory.len(),
            store.driver_directory_path(year).display()
        );
    }

    Ok(())
}

/// Fetch the news digest and persist it.
pub async fn run_fetch_news(limit: Option<usize>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let limit = limit.unwrap_or(config.news.limit);

    let client = reqwest::Client::builder()
        .timeout(config.api_timeout())
        .build()?;

    eprintln!("Fetching latest F1 news articles...");
    let articles = news::fetch_news(&client, &config.news.feeds, limit).await;
    if articles.is_empty() {
        eprintln!("Failed to fetch any articles. Check your internet connection.");
        return Ok(());
    }

    for article in &articles {
        eprintln!("- {} ({})", article.title, article.source);
    }

    let cache = news::news_cache(articles);
    let store = Store::new(&config.data.dir);
    store.save_news(&cache)?;
    println!(
        "Saved {} articles to {}",
        cache.articles.len(),
        store.news_path().display()
    );

    println!("{}", news::format_news_for_prompt(&cache.articles));
    Ok(())
}

/// Run the podium prediction and persist the result.
pub async fn run_predict(skip_news: bool, output: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let store = Store::new(&config.data.dir);
    let api = OpenF1Client::new(&config.api.base_url, config.api_timeout())?;

    eprintln!("1) Fetching next race...");
    let Some(next_race) = predict::next_race(&api).await? else {
        println!("Could not find next race.");
        return Ok(());
    };
    eprintln!(
        "   Next race: {} ({})",
        next_race.race_name,
        next_race.date_start.as_deref().unwrap_or("?")
    );

    eprintln!("2) Loading historical data...");
    let cache = store.load_results()?;
    let mut history = predict::history_summary(&cache);
    if history.is_empty() {
        eprintln!(
            "   No historical data in {}. Run: f1-podium fetch-results",
            store.results_path().display()
        );
        history = "(No data - run fetch-results first)".to_string();
    }

    let news_block = if skip_news {
        None
    } else {
        eprintln!("3) Fetching latest F1 news...");
        let client = reqwest::Client::builder()
            .timeout(config.api_timeout())
            .build()?;
        let articles = news::fetch_news(&client, &config.news.feeds, config.news.limit).await;
        if articles.is_empty() {
            eprintln!("   No news articles fetched.");
            None
        } else {
            eprintln!("   Fetched {} articles.", articles.len());
            Some(news::format_news_for_prompt(&articles))
        }
    };

    eprintln!("4) Asking Gemini for prediction...");
    let api_key = GeminiClient::key_from_env()?;
    let gemini = GeminiClient::new(&config.gemini.model, &api_key);
    let prompt = predict::build_prompt(&next_race, &history, news_block.as_deref());
    let reply = gemini.generate(&prompt).await?;
    let prediction = predict::parse_prediction(&reply);

    let record = PredictionRecord {
        next_race,
        prediction,
        predicted_at: chrono::Utc::now().to_rfc3339(),
    };

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, serde_json::to_string_pretty(&record)?)?;
            eprintln!("Saved to {}", path.display());
        }
        None => {
            store.save_prediction(&record)?;
            eprintln!("Saved to {}", store.predictions_path().display());
        }
    }

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
