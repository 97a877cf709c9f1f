//! Configuration for the F1 podium pipeline.

use serde::{Deserialize, Serialize};

/// OpenF1 API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    crate::openf1::BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Data directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: String,
    /// Seasons processed by the fetch commands
    #[serde(default = "default_years")]
    pub years: Vec<u16>,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_years() -> Vec<u16> {
    vec![2025, 2026]
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            years: default_years(),
        }
    }
}

/// News feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_feeds")]
    pub feeds: Vec<String>,
    #[serde(default = "default_news_limit")]
    pub limit: usize,
}

fn default_feeds() -> Vec<String> {
    vec![
        "https://feeds.motorsport.com/f1/news".to_string(),
        "https://feeds.news.sky.com/sports/f1".to_string(),
        "https://feeds.bbci.co.uk/sport/formula1/rss.xml".to_string(),
    ]
}

fn default_news_limit() -> usize {
    5
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            feeds: default_feeds(),
            limit: default_news_limit(),
        }
    }
}

/// Gemini model configuration (the API key is read from the environment at
/// call time, never from a file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

fn default_gemini_model() -> String {
    "gemini-3-flash-preview".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: default_gemini_model(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

impl AppConfig {
    /// Load configuration from defaults, an optional config file, and
    /// `F1_*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("F1")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Request timeout for OpenF1 calls
    pub fn api_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.api.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "https://api.openf1.org/v1");
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.data.dir, "data");
        assert_eq!(config.data.years, vec![2025, 2026]);
        assert_eq!(config.news.feeds.len(), 3);
        assert_eq!(config.news.limit, 5);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"data": {"dir": "/tmp/f1"}}"#).unwrap();
        assert_eq!(parsed.data.dir, "/tmp/f1");
        assert_eq!(parsed.data.years, vec![2025, 2026]);
        assert_eq!(parsed.api.timeout_secs, 10);
    }
}
