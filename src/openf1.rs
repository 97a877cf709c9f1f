//! OpenF1 API client.
//!
//! Read-only JSON queries against api.openf1.org. Every call carries a
//! bounded timeout and the payload is treated as untrusted.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::types::{Meeting, ResultRow, Session};

/// Default base URL for the OpenF1 API
pub const BASE_URL: &str = "https://api.openf1.org/v1";

/// Build race session list URL for a year
pub fn sessions_url(base: &str, year: u16) -> String {
    format!("{}/sessions?year={}&session_type=Race", base, year)
}

/// Build meeting list URL for a year
pub fn meetings_url(base: &str, year: u16) -> String {
    format!("{}/meetings?year={}", base, year)
}

/// Build session result URL
pub fn session_result_url(base: &str, session_key: i64) -> String {
    format!("{}/session_result?session_key={}", base, session_key)
}

/// Build driver list URL for a session
pub fn drivers_url(base: &str, session_key: i64) -> String {
    format!("{}/drivers?session_key={}", base, session_key)
}

/// Seam over the OpenF1 endpoints the pipeline reads.
#[async_trait]
pub trait OpenF1Api {
    /// Race sessions for a year, in upstream chronological order.
    async fn race_sessions(&self, year: u16) -> Result<Vec<Session>>;

    /// Meetings for a year, keyed by meeting_key.
    async fn meetings(&self, year: u16) -> Result<HashMap<i64, Meeting>>;

    /// Result rows for one session, in upstream order.
    async fn session_result(&self, session_key: i64) -> Result<Vec<ResultRow>>;

    /// Raw driver records for one session.
    async fn session_drivers(&self, session_key: i64) -> Result<Vec<serde_json::Value>>;
}

/// HTTP client for the OpenF1 API
pub struct OpenF1Client {
    base_url: String,
    client: reqwest::Client,
}

impl OpenF1Client {
    /// Create a client with the given base URL and request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed: {}", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status: {}", url))?;

        resp.json()
            .await
            .with_context(|| format!("Failed to decode response: {}", url))
    }
}

#[async_trait]
impl OpenF1Api for OpenF1Client {
    async fn race_sessions(&self, year: u16) -> Result<Vec<Session>> {
        self.get_json(&sessions_url(&self.base_url, year)).await
    }

    async fn meetings(&self, year: u16) -> Result<HashMap<i64, Meeting>> {
        let meetings: Vec<Meeting> = self.get_json(&meetings_url(&self.base_url, year)).await?;
        Ok(meetings.into_iter().map(|m| (m.meeting_key, m)).collect())
    }

    async fn session_result(&self, session_key: i64) -> Result<Vec<ResultRow>> {
        self.get_json(&session_result_url(&self.base_url, session_key))
            .await
    }

    async fn session_drivers(&self, session_key: i64) -> Result<Vec<serde_json::Value>> {
        self.get_json(&drivers_url(&self.base_url, session_key))
            .await
    }
}
