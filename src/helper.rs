use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use log::{debug, info, trace, warn};

use crate::{JotError, Payload, Record, Result};

/// Sets up `env_logger`. `RUST_LOG` wins over `filter`; `verbose` forces debug.
pub fn initialize_logger(filter: &str, verbose: bool) {
    let default_filter = if verbose { "debug" } else { filter };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();

    info!("Logger initialized");
}

/// Generates an id from the current millisecond timestamp, suffixed with
/// `-n` when the timestamp is already taken in `existing`.
pub fn next_id<'a>(existing: impl IntoIterator<Item = &'a str>) -> String {
    let taken: HashSet<&str> = existing.into_iter().collect();
    let base = Utc::now().timestamp_millis().to_string();

    if !taken.contains(base.as_str()) {
        return base;
    }

    let mut n = 1;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken.contains(candidate.as_str()) {
            trace!("Id {} taken, using {}", base, candidate);
            return candidate;
        }
        n += 1;
    }
}

/// Parses a stored collection blob.
///
/// Malformed JSON is `CorruptState`. Blank records and repeated ids are
/// dropped so the in-memory invariants hold whatever an older build wrote.
pub fn parse_collection<P: Payload>(blob: &str) -> Result<Vec<Record<P>>> {
    let parsed: Vec<Record<P>> =
        serde_json::from_str(blob).map_err(|source| JotError::CorruptState {
            key: P::STORAGE_KEY.to_string(),
            source,
        })?;

    let total = parsed.len();
    let mut seen = HashSet::with_capacity(total);
    let records: Vec<Record<P>> = parsed
        .into_iter()
        .filter(|record| {
            if let Err(e) = record.payload().validate() {
                warn!("Dropping stored {} {}: {}", P::KIND, record.id(), e);
                return false;
            }
            if !seen.insert(record.id().to_string()) {
                warn!("Dropping duplicate {} id {}", P::KIND, record.id());
                return false;
            }
            true
        })
        .collect();

    debug!(
        "Parsed {} of {} stored {} records",
        records.len(),
        total,
        P::KIND
    );
    Ok(records)
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (read in local time).
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Local).date_naive()))
        .map_err(|e| JotError::InvalidFormat {
            message: format!("'{}' is not a date: {}", raw, e),
        })
}

/// Accepts `HH:MM`, `HH:MM:SS` or a full RFC 3339 timestamp (read in local
/// time).
pub fn parse_time(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Local).time()))
        .map_err(|e| JotError::InvalidFormat {
            message: format!("'{}' is not a time: {}", raw, e),
        })
}
