//! Incremental race-results cache builder.
//!
//! For each season: fetch the upstream race session list, reuse cached
//! entries where possible, fetch results for the rest, and return the merged
//! season in upstream order. The previous cache snapshot is an input and the
//! new snapshot is the output; nothing is written to disk here.

use anyhow::Result;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::openf1::OpenF1Api;
use crate::types::{DriverDirectory, Meeting, RaceEntry, ResultsCache, ResultRow, Session};

/// Which sessions get fresh results on a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// The most recent session is always re-fetched, even when cached; earlier
    /// sessions are fetched only on a cache miss. This is the recovery path
    /// for a race whose results were unavailable (e.g. still in progress) on
    /// an earlier run.
    AlwaysRefreshMostRecent,
}

/// Per-session fetch decision produced by [`plan_sessions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDecision {
    /// Reuse the cached entry; no network call.
    Reuse,
    /// Fetch fresh results, replacing any cached entry.
    Fetch,
}

/// Decide, per upstream session, whether to reuse the cache or fetch.
///
/// One decision per session, in upstream order. A season with exactly one
/// session plans it as `Fetch` (it is the most recent).
pub fn plan_sessions<F>(
    policy: RefreshPolicy,
    sessions: &[Session],
    is_cached: F,
) -> Vec<FetchDecision>
where
    F: Fn(i64) -> bool,
{
    let RefreshPolicy::AlwaysRefreshMostRecent = policy;

    let last = sessions.len().saturating_sub(1);
    sessions
        .iter()
        .enumerate()
        .map(|(i, s)| {
            if i == last || !is_cached(s.session_key) {
                FetchDecision::Fetch
            } else {
                FetchDecision::Reuse
            }
        })
        .collect()
}

/// Attach driver metadata to result rows, matched by driver number.
///
/// Rows whose driver number (stringified) has no directory entry are left
/// unannotated; rows are never dropped.
pub fn annotate_results(rows: &mut [ResultRow], drivers: &DriverDirectory) {
    for row in rows.iter_mut() {
        if let Some(number) = row.driver_number {
            if let Some(info) = drivers.get(&number.to_string()) {
                row.driver = Some(info.clone());
            }
        }
    }
}

fn meeting_circuit(session: &Session, meetings: &HashMap<i64, Meeting>) -> Option<String> {
    meetings
        .get(&session.meeting_key)
        .and_then(|m| m.circuit_short_name.clone())
        .or_else(|| session.circuit_short_name.clone())
}

fn meeting_name(session: &Session, meetings: &HashMap<i64, Meeting>) -> Option<String> {
    meetings
        .get(&session.meeting_key)
        .and_then(|m| m.meeting_name.clone())
}

/// Build a fresh entry for a session from freshly fetched results.
fn new_entry(
    session: &Session,
    meetings: &HashMap<i64, Meeting>,
    results: Vec<ResultRow>,
) -> RaceEntry {
    RaceEntry {
        session_key: session.session_key,
        meeting_key: Some(session.meeting_key),
        circuit_name: meeting_circuit(session, meetings),
        race_name: meeting_name(session, meetings),
        results,
    }
}

/// Repair a cached entry whose enrichment fields are missing.
///
/// Only fills `None` fields from current meeting metadata; present values are
/// never overwritten.
fn backfill_entry(entry: &mut RaceEntry, session: &Session, meetings: &HashMap<i64, Meeting>) {
    if entry.circuit_name.is_none() {
        entry.circuit_name = meeting_circuit(session, meetings);
    }
    if entry.race_name.is_none() {
        entry.race_name = meeting_name(session, meetings);
    }
}

/// Fetch results for one session, degrading to an empty list on failure.
///
/// A failed fetch must not abort the season; the entry is still recorded so
/// the session is not treated as missing forever. The most recent session is
/// re-fetched on every run regardless, which is the retry path.
async fn fetch_results_or_empty<A: OpenF1Api + ?Sized>(api: &A, session_key: i64) -> Vec<ResultRow> {
    match api.session_result(session_key).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to fetch results for session {}: {:#}", session_key, e);
            Vec::new()
        }
    }
}

/// Build the merged entry list for one season.
///
/// `cached` is the previously persisted season (may be empty) and `drivers`
/// the season's driver directory (may be empty). Returns entries in upstream
/// session order; if the upstream list is empty the cached entries are
/// returned unchanged.
pub async fn build_season<A: OpenF1Api + ?Sized>(
    api: &A,
    year: u16,
    cached: &[RaceEntry],
    drivers: &DriverDirectory,
) -> Result<Vec<RaceEntry>> {
    let sessions = api.race_sessions(year).await?;
    if sessions.is_empty() {
        info!(
            "No upstream sessions for {}, keeping {} cached entries",
            year,
            cached.len()
        );
        return Ok(cached.to_vec());
    }

    let meetings = api.meetings(year).await?;

    let cached_by_key: HashMap<i64, &RaceEntry> =
        cached.iter().map(|e| (e.session_key, e)).collect();

    let plan = plan_sessions(RefreshPolicy::AlwaysRefreshMostRecent, &sessions, |key| {
        cached_by_key.contains_key(&key)
    });

    let mut entries = Vec::with_capacity(sessions.len());
    for (session, decision) in sessions.iter().zip(plan) {
        match decision {
            FetchDecision::Reuse => {
                debug!("Skipping session {}: already cached", session.session_key);
                let mut entry = cached_by_key[&session.session_key].clone();
                backfill_entry(&mut entry, session, &meetings);
                entries.push(entry);
            }
            FetchDecision::Fetch => {
                let mut results = fetch_results_or_empty(api, session.session_key).await;
                annotate_results(&mut results, drivers);
                entries.push(new_entry(session, &meetings, results));
            }
        }
    }

    Ok(entries)
}

/// Build the full cache for a set of seasons.
///
/// Takes the previous cache snapshot and the per-season driver directories;
/// returns the new snapshot containing exactly the processed seasons. The
/// caller persists the result in one wholesale write after all seasons
/// complete.
pub async fn build_all<A: OpenF1Api + ?Sized>(
    api: &A,
    years: &[u16],
    cache: &ResultsCache,
    directories: &BTreeMap<u16, DriverDirectory>,
) -> Result<ResultsCache> {
    let empty_dir = DriverDirectory::new();
    let mut merged = ResultsCache::new();

    for &year in years {
        let key = year.to_string();
        let cached = cache.get(&key).map(|v| v.as_slice()).unwrap_or(&[]);
        let drivers = directories.get(&year).unwrap_or(&empty_dir);

        let entries = build_season(api, year, cached, drivers).await?;
        info!("Season {}: {} entries", year, entries.len());
        merged.insert(key, entries);
    }

    Ok(merged)
}
