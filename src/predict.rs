//! Podium prediction via Gemini.
//!
//! Gathers the next upcoming race, a compact podium history from the results
//! cache, and the news digest, then asks the model for a strict-JSON podium.

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use tracing::warn;

use crate::openf1::OpenF1Api;
use crate::types::{NextRace, Prediction, ResultsCache, Session};

/// Gemini REST endpoint root
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Pick the next upcoming main race from a session list.
///
/// Sprint sessions carry `session_name` other than "Race" and are excluded.
/// `now` is an RFC 3339 timestamp; upstream dates compare lexicographically.
pub fn select_next_race(sessions: &[Session], now: &str) -> Option<NextRace> {
    let mut upcoming: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.session_name.as_deref() == Some("Race"))
        .filter(|s| s.date_start.as_deref().map(|d| d > now).unwrap_or(false))
        .collect();
    upcoming.sort_by(|a, b| a.date_start.cmp(&b.date_start));

    upcoming.into_iter().next().map(to_next_race)
}

/// Pick the earliest main race regardless of date (fallback for a season
/// that has not started yet).
pub fn select_first_race(sessions: &[Session]) -> Option<NextRace> {
    let mut races: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.session_name.as_deref() == Some("Race"))
        .collect();
    races.sort_by(|a, b| a.date_start.cmp(&b.date_start));

    races.into_iter().next().map(to_next_race)
}

fn to_next_race(s: &Session) -> NextRace {
    NextRace {
        race_name: s.circuit_short_name.clone().unwrap_or_default(),
        circuit: s.circuit_short_name.clone(),
        country: s.country_name.clone(),
        date_start: s.date_start.clone(),
        meeting_key: Some(s.meeting_key),
    }
}

/// Find the next race: this year's upcoming races first, then next year's
/// calendar if the season is over.
pub async fn next_race<A: OpenF1Api + ?Sized>(api: &A) -> Result<Option<NextRace>> {
    let now = Utc::now();
    let year = now.year() as u16;
    let now_str = now.to_rfc3339();

    let sessions = api.race_sessions(year).await?;
    if let Some(race) = select_next_race(&sessions, &now_str) {
        return Ok(Some(race));
    }

    let sessions = api.race_sessions(year + 1).await?;
    Ok(select_first_race(&sessions))
}

/// Build the recent-podiums block for the prompt.
///
/// Newest two seasons, races in season order, podium rendered as
/// "1st | 2nd | 3rd" from annotated driver names; at most 40 lines.
pub fn history_summary(cache: &ResultsCache) -> String {
    let mut lines = Vec::new();

    for (year, races) in cache.iter().rev().take(2) {
        for race in races {
            if race.results.is_empty() {
                continue;
            }

            let names: Vec<String> = (1..=3)
                .filter_map(|p| {
                    race.results
                        .iter()
                        .find(|r| r.position == Some(p))
                        .and_then(|r| r.driver.as_ref())
                        .and_then(|d| {
                            d.full_name
                                .clone()
                                .or_else(|| d.name_acronym.clone())
                        })
                })
                .collect();
            if names.is_empty() {
                continue;
            }

            lines.push(format!(
                "- {} ({}) {}: {}",
                race.race_name.as_deref().unwrap_or("?"),
                race.circuit_name.as_deref().unwrap_or("?"),
                year,
                names.join(" | ")
            ));
        }
    }

    lines.truncate(40);
    lines.join("\n")
}

/// Render the full prompt sent to the model.
pub fn build_prompt(next_race: &NextRace, history: &str, news: Option<&str>) -> String {
    let news_section = news
        .map(|n| format!("\n\n**Recent F1 News:**\n{}", n))
        .unwrap_or_default();

    format!(
        "You are an F1 expert. Given the next race, recent historical podium results, \
         and current F1 news, predict the podium (top 3).\n\
         \n\
         **Next race:**\n\
         - {} ({})\n\
         - Country: {}\n\
         - Date: {}\n\
         \n\
         **Recent podiums (1st | 2nd | 3rd, most recent first):**\n\
         {}{}\n\
         \n\
         Predict the podium for the next race. Respond with ONLY valid JSON in this \
         exact format, no other text:\n\
         {{\"podium\": {{\"1st\": \"Driver Name\", \"2nd\": \"Driver Name\", \"3rd\": \"Driver Name\"}}, \
         \"reason\": \"Brief explanation\"}}",
        next_race.race_name,
        next_race.circuit.as_deref().unwrap_or("?"),
        next_race.country.as_deref().unwrap_or("?"),
        next_race.date_start.as_deref().unwrap_or("?"),
        history,
        news_section,
    )
}

/// Strip a surrounding markdown code fence, if present.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }

    let body = match trimmed.find('\n') {
        Some(i) => &trimmed[i + 1..],
        None => return trimmed,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parse the model's reply into a [`Prediction`].
///
/// Replies that are not valid JSON are kept verbatim in `reason` with the
/// `raw` marker set, so a malformed reply is still persisted for inspection.
pub fn parse_prediction(raw: &str) -> Prediction {
    let body = strip_code_fence(raw);
    match serde_json::from_str::<Prediction>(body) {
        Ok(prediction) => prediction,
        Err(e) => {
            warn!("Model reply was not valid JSON: {}", e);
            Prediction {
                podium: Default::default(),
                reason: body.to_string(),
                raw: true,
            }
        }
    }
}

/// Client for the Gemini generateContent endpoint
pub struct GeminiClient {
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    /// Create a client for the given model
    pub fn new(model: &str, api_key: &str) -> Self {
        Self {
            model: model.to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Resolve the API key from the environment
    pub fn key_from_env() -> Result<String> {
        std::env::var("GOOGLE_GEMINI_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .context(
                "Set GOOGLE_GEMINI_API_KEY or GEMINI_API_KEY. \
                 Get a key at https://aistudio.google.com/apikey",
            )
    }

    /// Send a prompt and return the reply text.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model);
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
        });

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error (status {}): {}", status, text);
        }

        let json: serde_json::Value = resp.json().await.context("Gemini reply not JSON")?;
        let text = json
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Gemini reply missing candidate text"))?;

        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DriverInfo, RaceEntry, ResultRow};

    fn race_session(key: i64, name: &str, circuit: &str, date: &str) -> Session {
        Session {
            session_key: key,
            meeting_key: key * 10,
            session_type: Some("Race".to_string()),
            session_name: Some(name.to_string()),
            circuit_short_name: Some(circuit.to_string()),
            country_name: Some("Somewhere".to_string()),
            date_start: Some(date.to_string()),
        }
    }

    #[test]
    fn test_select_next_race_earliest_future() {
        let sessions = vec![
            race_session(1, "Race", "Monza", "2026-09-06T13:00:00+00:00"),
            race_session(2, "Race", "Baku", "2026-09-20T11:00:00+00:00"),
            race_session(3, "Race", "Spa", "2026-07-26T13:00:00+00:00"),
        ];

        let next = select_next_race(&sessions, "2026-08-27T00:00:00+00:00").unwrap();
        assert_eq!(next.race_name, "Monza");
        assert_eq!(next.meeting_key, Some(10));
    }

    #[test]
    fn test_select_next_race_excludes_sprints() {
        let sessions = vec![
            race_session(1, "Sprint", "Austin", "2026-10-17T19:00:00+00:00"),
            race_session(2, "Race", "Austin", "2026-10-18T19:00:00+00:00"),
        ];

        let next = select_next_race(&sessions, "2026-10-01T00:00:00+00:00").unwrap();
        assert_eq!(next.meeting_key, Some(20));
    }

    #[test]
    fn test_select_next_race_none_when_season_over() {
        let sessions = vec![race_session(1, "Race", "Abu Dhabi", "2026-12-06T13:00:00+00:00")];
        assert!(select_next_race(&sessions, "2026-12-31T00:00:00+00:00").is_none());
    }

    #[test]
    fn test_select_first_race_ignores_dates() {
        let sessions = vec![
            race_session(2, "Race", "Jeddah", "2027-03-21T17:00:00+00:00"),
            race_session(1, "Race", "Melbourne", "2027-03-07T05:00:00+00:00"),
        ];
        let first = select_first_race(&sessions).unwrap();
        assert_eq!(first.race_name, "Melbourne");
    }

    fn podium_row(position: i64, name: &str) -> ResultRow {
        ResultRow {
            driver_number: Some(position),
            position: Some(position),
            driver: Some(DriverInfo {
                full_name: Some(name.to_string()),
                ..Default::default()
            }),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_history_summary_renders_podiums() {
        let cache = ResultsCache::from([(
            "2026".to_string(),
            vec![RaceEntry {
                session_key: 1,
                meeting_key: Some(10),
                circuit_name: Some("Sakhir".to_string()),
                race_name: Some("Bahrain Grand Prix".to_string()),
                results: vec![
                    podium_row(2, "Lando Norris"),
                    podium_row(1, "Max Verstappen"),
                    podium_row(3, "Charles Leclerc"),
                    podium_row(4, "George Russell"),
                ],
            }],
        )]);

        let summary = history_summary(&cache);
        assert_eq!(
            summary,
            "- Bahrain Grand Prix (Sakhir) 2026: Max Verstappen | Lando Norris | Charles Leclerc"
        );
    }

    #[test]
    fn test_history_summary_skips_empty_and_unannotated() {
        let cache = ResultsCache::from([(
            "2026".to_string(),
            vec![
                RaceEntry {
                    session_key: 1,
                    meeting_key: None,
                    circuit_name: None,
                    race_name: None,
                    results: Vec::new(),
                },
                RaceEntry {
                    session_key: 2,
                    meeting_key: None,
                    circuit_name: None,
                    race_name: None,
                    // Rows without annotation contribute no names
                    results: vec![ResultRow {
                        driver_number: Some(1),
                        position: Some(1),
                        driver: None,
                        extra: serde_json::Map::new(),
                    }],
                },
            ],
        )]);

        assert!(history_summary(&cache).is_empty());
    }

    #[test]
    fn test_history_summary_newest_two_seasons() {
        let entry = |name: &str| RaceEntry {
            session_key: 1,
            meeting_key: None,
            circuit_name: Some("C".to_string()),
            race_name: Some(name.to_string()),
            results: vec![podium_row(1, "Winner")],
        };
        let cache = ResultsCache::from([
            ("2024".to_string(), vec![entry("Old GP")]),
            ("2025".to_string(), vec![entry("Mid GP")]),
            ("2026".to_string(), vec![entry("New GP")]),
        ]);

        let summary = history_summary(&cache);
        assert!(summary.contains("New GP"));
        assert!(summary.contains("Mid GP"));
        assert!(!summary.contains("Old GP"));
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("{\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_prediction_valid_json() {
        let raw = "```json\n{\"podium\": {\"1st\": \"Max Verstappen\", \"2nd\": \"Lando Norris\", \
                   \"3rd\": \"Charles Leclerc\"}, \"reason\": \"Form.\"}\n```";
        let p = parse_prediction(raw);
        assert!(!p.raw);
        assert_eq!(p.podium["1st"], "Max Verstappen");
        assert_eq!(p.reason, "Form.");
    }

    #[test]
    fn test_parse_prediction_raw_fallback() {
        let p = parse_prediction("I think Verstappen wins.");
        assert!(p.raw);
        assert!(p.podium.is_empty());
        assert_eq!(p.reason, "I think Verstappen wins.");
    }

    #[test]
    fn test_build_prompt_sections() {
        let race = NextRace {
            race_name: "Monza".to_string(),
            circuit: Some("Monza".to_string()),
            country: Some("Italy".to_string()),
            date_start: Some("2026-09-06T13:00:00+00:00".to_string()),
            meeting_key: Some(10),
        };

        let with_news = build_prompt(&race, "- history line", Some("1. news line"));
        assert!(with_news.contains("Monza"));
        assert!(with_news.contains("- history line"));
        assert!(with_news.contains("**Recent F1 News:**\n1. news line"));
        assert!(with_news.contains("ONLY valid JSON"));

        let without_news = build_prompt(&race, "- history line", None);
        assert!(!without_news.contains("**Recent F1 News:**"));
    }
}
