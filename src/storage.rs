//! JSON file store for the pipeline's caches.
//!
//! All documents are written wholesale: a run either completes and replaces a
//! file in one write, or the previous file stays authoritative. Missing files
//! are treated as empty input.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::types::{DriverDirectory, NewsCache, PredictionRecord, ResultsCache};

/// File names under the data directory
const RESULTS_FILE: &str = "f1_race_results.json";
const NEWS_FILE: &str = "f1_news_cache.json";
const PREDICTIONS_FILE: &str = "predictions.json";

/// File store rooted at a data directory
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    /// Create a store rooted at the given directory
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Path to the results cache document
    pub fn results_path(&self) -> PathBuf {
        self.data_dir.join(RESULTS_FILE)
    }

    /// Path to a season's driver directory document
    pub fn driver_directory_path(&self, year: u16) -> PathBuf {
        self.data_dir.join(format!("{}.json", year))
    }

    /// Path to the news cache document
    pub fn news_path(&self) -> PathBuf {
        self.data_dir.join(NEWS_FILE)
    }

    /// Path to the predictions document
    pub fn predictions_path(&self) -> PathBuf {
        self.data_dir.join(PREDICTIONS_FILE)
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, path: &Path) -> Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    fn write_pretty<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)
            .with_context(|| format!("Failed to create {}", self.data_dir.display()))?;
        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Load the results cache, or an empty one if no file exists
    pub fn load_results(&self) -> Result<ResultsCache> {
        self.read_or_default(&self.results_path())
    }

    /// Replace the results cache on disk
    pub fn save_results(&self, cache: &ResultsCache) -> Result<()> {
        self.write_pretty(&self.results_path(), cache)
    }

    /// Load a season's driver directory, or an empty one if no file exists
    pub fn load_driver_directory(&self, year: u16) -> Result<DriverDirectory> {
        self.read_or_default(&self.driver_directory_path(year))
    }

    /// Replace a season's driver directory on disk
    pub fn save_driver_directory(&self, year: u16, directory: &DriverDirectory) -> Result<()> {
        self.write_pretty(&self.driver_directory_path(year), directory)
    }

    /// Replace the news cache on disk
    pub fn save_news(&self, cache: &NewsCache) -> Result<()> {
        self.write_pretty(&self.news_path(), cache)
    }

    /// Replace the prediction record on disk
    pub fn save_prediction(&self, record: &PredictionRecord) -> Result<()> {
        self.write_pretty(&self.predictions_path(), record)
    }
}
