//! Per-season driver directory builder.
//!
//! The directory maps driver-number strings to denormalized driver metadata
//! and is produced from the driver list of the season's first session. It is
//! consumed read-only by the results builder's annotation step.

use anyhow::Result;
use tracing::info;

use crate::openf1::OpenF1Api;
use crate::types::{DriverDirectory, DriverInfo};

fn field(record: &serde_json::Value, key: &str) -> Option<String> {
    record.get(key).and_then(|v| v.as_str()).map(String::from)
}

/// Convert a raw upstream driver record into directory form.
///
/// Returns the driver-number key and the metadata; records without a driver
/// number are skipped.
fn directory_entry(record: &serde_json::Value) -> Option<(String, DriverInfo)> {
    let number = record.get("driver_number")?.as_i64()?;

    let info = DriverInfo {
        full_name: field(record, "full_name"),
        broadcast_name: field(record, "broadcast_name"),
        first_name: field(record, "first_name"),
        last_name: field(record, "last_name"),
        name_acronym: field(record, "name_acronym"),
        team_name: field(record, "team_name"),
        country_code: field(record, "country_code"),
    };

    Some((number.to_string(), info))
}

/// Fetch the driver directory for a season.
///
/// Uses the year's first race session; a season with no sessions yields an
/// empty directory.
pub async fn fetch_directory<A: OpenF1Api + ?Sized>(api: &A, year: u16) -> Result<DriverDirectory> {
    let sessions = api.race_sessions(year).await?;
    let Some(first) = sessions.first() else {
        info!("No sessions for {}, driver directory left empty", year);
        return Ok(DriverDirectory::new());
    };

    let records = api.session_drivers(first.session_key).await?;
    let directory: DriverDirectory = records.iter().filter_map(directory_entry).collect();

    info!("Season {}: {} drivers", year, directory.len());
    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_directory_entry_maps_fields() {
        let record = json!({
            "driver_number": 44,
            "full_name": "Lewis HAMILTON",
            "broadcast_name": "L HAMILTON",
            "first_name": "Lewis",
            "last_name": "Hamilton",
            "name_acronym": "HAM",
            "team_name": "Ferrari",
            "country_code": "GBR",
            "headshot_url": "https://example.com/ham.png"
        });

        let (key, info) = directory_entry(&record).unwrap();
        assert_eq!(key, "44");
        assert_eq!(info.full_name.as_deref(), Some("Lewis HAMILTON"));
        assert_eq!(info.team_name.as_deref(), Some("Ferrari"));
        assert_eq!(info.country_code.as_deref(), Some("GBR"));
    }

    #[test]
    fn test_directory_entry_tolerates_missing_metadata() {
        let record = json!({"driver_number": 7});
        let (key, info) = directory_entry(&record).unwrap();
        assert_eq!(key, "7");
        assert!(info.full_name.is_none());
        assert!(info.team_name.is_none());
    }

    #[test]
    fn test_directory_entry_requires_driver_number() {
        assert!(directory_entry(&json!({"full_name": "Nobody"})).is_none());
        assert!(directory_entry(&json!({"driver_number": "not a number"})).is_none());
    }
}
