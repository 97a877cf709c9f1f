//! Data model for the OpenF1 pipeline.
//!
//! Upstream payloads are validated into tagged records at the API boundary;
//! fields the pipeline does not interpret are carried through opaquely.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single timed event within a season. Only "Race" sessions are fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_key: i64,
    pub meeting_key: i64,
    #[serde(default)]
    pub session_type: Option<String>,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub circuit_short_name: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub date_start: Option<String>,
}

/// A race weekend grouping sessions at one circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub meeting_key: i64,
    #[serde(default)]
    pub circuit_short_name: Option<String>,
    #[serde(default)]
    pub meeting_name: Option<String>,
}

/// Driver metadata from the per-season driver directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverInfo {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub broadcast_name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub name_acronym: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

/// One row of a session result.
///
/// Beyond `driver_number` and `position` the upstream record is opaque; the
/// remaining fields are flattened through unchanged so a cache round-trip
/// loses nothing. `driver` is attached by the annotation step when the
/// driver number resolves in the season's directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(default)]
    pub driver_number: Option<i64>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverInfo>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A cached race: one per session, immutable once written except the most
/// recent entry per season, which is replaced on every run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceEntry {
    pub session_key: i64,
    #[serde(default)]
    pub meeting_key: Option<i64>,
    #[serde(default)]
    pub circuit_name: Option<String>,
    #[serde(default)]
    pub race_name: Option<String>,
    #[serde(default)]
    pub results: Vec<ResultRow>,
}

/// Per-season lookup of driver metadata by driver-number string.
pub type DriverDirectory = BTreeMap<String, DriverInfo>;

/// The persisted results document: season year (as a string) to its races
/// in upstream chronological order.
pub type ResultsCache = BTreeMap<String, Vec<RaceEntry>>;

/// A condensed news article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub published_at: String,
    pub url: String,
}

/// Persisted news cache document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsCache {
    pub fetched_at: String,
    pub articles: Vec<NewsArticle>,
}

/// The upcoming race the predictor targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextRace {
    pub race_name: String,
    #[serde(default)]
    pub circuit: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub date_start: Option<String>,
    #[serde(default)]
    pub meeting_key: Option<i64>,
}

/// Parsed model output: podium keyed "1st"/"2nd"/"3rd" plus a short reason.
/// `raw` marks responses that did not parse as JSON (reason holds the text).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    #[serde(default)]
    pub podium: BTreeMap<String, String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub raw: bool,
}

/// Persisted prediction document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub next_race: NextRace,
    pub prediction: Prediction,
    pub predicted_at: String,
}
