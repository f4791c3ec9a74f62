use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};

use crate::types::DatePrecision;

/// Format of the timestamp stamped into playlist descriptions.
pub const DISCOVERY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

pub fn generate_code_verifier() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(128)
        .map(char::from)
        .collect()
}

pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Parses a Spotify release date, defaulting a missing month or day to 1.
///
/// The declared precision decides how many components are read; extra
/// components beyond the precision are ignored.
pub fn parse_release_date(date: &str, precision: DatePrecision) -> Option<NaiveDate> {
    let mut parts = date.trim().split('-');
    let year = parts.next()?.parse::<i32>().ok()?;
    let month = match precision {
        DatePrecision::Year => 1,
        _ => parts.next().map_or(Some(1), |m| m.parse::<u32>().ok())?,
    };
    let day = match precision {
        DatePrecision::Day => parts.next().map_or(Some(1), |d| d.parse::<u32>().ok())?,
        _ => 1,
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Earliest date still inside the lookback window, seen at the given precision.
///
/// A month-precision release from the month the window starts in is still
/// valid even though its defaulted day lies before the window.
pub fn lookback_cutoff(today: NaiveDate, lookback_days: u32, precision: DatePrecision) -> NaiveDate {
    let cutoff = today - Duration::days(lookback_days as i64);
    match precision {
        DatePrecision::Day => cutoff,
        DatePrecision::Month => cutoff.with_day(1).unwrap_or(cutoff),
        DatePrecision::Year => NaiveDate::from_ymd_opt(cutoff.year(), 1, 1).unwrap_or(cutoff),
    }
}

/// Whether a release date lies within the trailing lookback window of `today`.
pub fn is_within_lookback(
    date: &str,
    precision: DatePrecision,
    today: NaiveDate,
    lookback_days: u32,
) -> bool {
    match parse_release_date(date, precision) {
        Some(release_date) => release_date >= lookback_cutoff(today, lookback_days, precision),
        None => false,
    }
}

pub fn format_discovery_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(DISCOVERY_TIMESTAMP_FORMAT).to_string()
}

pub fn parse_discovery_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), DISCOVERY_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{}", track_id)
}
