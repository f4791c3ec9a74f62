use chrono::NaiveDate;
use sporlradar::config::parse_bool;
use sporlradar::types::{AlbumGroup, DatePrecision, ExtendedCategory};
use sporlradar::utils::*;
use std::str::FromStr;

mod common;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_generate_code_verifier() {
    let verifier = generate_code_verifier();

    // Should be exactly 128 characters
    assert_eq!(verifier.len(), 128);

    // Should contain only alphanumeric characters
    assert!(verifier.chars().all(|c| c.is_ascii_alphanumeric()));

    // Two generated verifiers should be different
    let verifier2 = generate_code_verifier();
    assert_ne!(verifier, verifier2);
}

#[test]
fn test_generate_code_challenge() {
    let verifier = "test_verifier_123";
    let challenge = generate_code_challenge(verifier);

    assert!(!challenge.is_empty());

    // Deterministic for the same input
    assert_eq!(challenge, generate_code_challenge(verifier));
    assert_ne!(challenge, generate_code_challenge("different_verifier"));

    // URL-safe base64 without padding of a SHA-256 digest
    assert_eq!(challenge.len(), 43);
    assert!(!challenge.contains('='));
    assert!(!challenge.contains('+'));
    assert!(!challenge.contains('/'));
}

#[test]
fn test_parse_release_date_precisions() {
    assert_eq!(
        parse_release_date("2024-03-15", DatePrecision::Day),
        Some(date(2024, 3, 15))
    );
    assert_eq!(
        parse_release_date("2024-03", DatePrecision::Month),
        Some(date(2024, 3, 1))
    );
    assert_eq!(
        parse_release_date("2024", DatePrecision::Year),
        Some(date(2024, 1, 1))
    );

    // Components beyond the precision are ignored
    assert_eq!(
        parse_release_date("2024-03-15", DatePrecision::Year),
        Some(date(2024, 1, 1))
    );
}

#[test]
fn test_parse_release_date_invalid() {
    assert_eq!(parse_release_date("", DatePrecision::Day), None);
    assert_eq!(parse_release_date("not-a-date", DatePrecision::Day), None);
    assert_eq!(parse_release_date("2024-13-01", DatePrecision::Day), None);
    assert_eq!(parse_release_date("2024-02-30", DatePrecision::Day), None);
}

#[test]
fn test_lookback_window_day_precision() {
    let today = date(2024, 1, 10);

    // The first day of the window is still inside
    assert!(is_within_lookback("2024-01-07", DatePrecision::Day, today, 3));
    assert!(is_within_lookback("2024-01-10", DatePrecision::Day, today, 3));
    assert!(!is_within_lookback("2024-01-06", DatePrecision::Day, today, 3));
}

#[test]
fn test_lookback_window_coarse_precision() {
    let today = date(2024, 1, 10);

    assert!(is_within_lookback("2024-01", DatePrecision::Month, today, 3));
    assert!(!is_within_lookback("2023-12", DatePrecision::Month, today, 3));
    assert!(is_within_lookback("2024", DatePrecision::Year, today, 3));
    assert!(!is_within_lookback("2023", DatePrecision::Year, today, 3));

    // A window reaching into the previous month keeps that month and year
    let today = date(2024, 1, 2);
    assert!(is_within_lookback("2023-12", DatePrecision::Month, today, 3));
    assert!(is_within_lookback("2023", DatePrecision::Year, today, 3));
    assert!(!is_within_lookback("2023-11", DatePrecision::Month, today, 3));
}

#[test]
fn test_lookback_cutoff() {
    let today = date(2024, 3, 20);
    assert_eq!(lookback_cutoff(today, 5, DatePrecision::Day), date(2024, 3, 15));
    assert_eq!(lookback_cutoff(today, 5, DatePrecision::Month), date(2024, 3, 1));
    assert_eq!(lookback_cutoff(today, 5, DatePrecision::Year), date(2024, 1, 1));
}

#[test]
fn test_unparseable_release_is_never_within_lookback() {
    assert!(!is_within_lookback("soon", DatePrecision::Day, date(2024, 1, 10), 3));
}

#[test]
fn test_discovery_timestamp_roundtrip() {
    let ts = common::at(2024, 1, 10, 12);
    let formatted = format_discovery_timestamp(ts);

    assert_eq!(formatted, "2024-01-10 12:00 UTC");
    assert_eq!(parse_discovery_timestamp(&formatted), Some(ts));
    assert_eq!(parse_discovery_timestamp("yesterday"), None);
}

#[test]
fn test_track_uri() {
    assert_eq!(track_uri("abc123"), "spotify:track:abc123");
}

#[test]
fn test_dedup_key_ignores_case_and_album_id() {
    let a = common::release("a1", "Night Drive", AlbumGroup::Single, "2024-01-09", "Kavinsky");
    let b = common::release("b2", "NIGHT DRIVE", AlbumGroup::Single, "2024-01-09", "kavinsky");
    let c = common::release("c3", "Night Drive", AlbumGroup::Album, "2024-01-09", "Kavinsky");

    assert_eq!(a.dedup_key(), b.dedup_key());

    // Group is part of the identity
    assert_ne!(a.dedup_key(), c.dedup_key());
}

#[test]
fn test_extended_category_from_str() {
    assert_eq!(ExtendedCategory::from_str("album"), Ok(ExtendedCategory::Album));
    assert_eq!(ExtendedCategory::from_str("EP"), Ok(ExtendedCategory::Ep));
    assert_eq!(
        ExtendedCategory::from_str("re-release"),
        Ok(ExtendedCategory::ReRelease)
    );
    assert_eq!(
        ExtendedCategory::from_str("rerelease"),
        Ok(ExtendedCategory::ReRelease)
    );
    assert_eq!(
        ExtendedCategory::from_str("appears on"),
        Ok(ExtendedCategory::AppearsOn)
    );
    assert!(ExtendedCategory::from_str("mixtape").is_err());
}

#[test]
fn test_extended_category_env_suffix() {
    assert_eq!(ExtendedCategory::ReRelease.env_suffix(), "RE_RELEASE");
    assert_eq!(ExtendedCategory::AppearsOn.env_suffix(), "APPEARS_ON");
    assert!(ExtendedCategory::Live.is_extended());
    assert!(!ExtendedCategory::Compilation.is_extended());
}

#[test]
fn test_album_group_maps_to_category() {
    for group in AlbumGroup::ALL {
        let category = ExtendedCategory::from(group);
        assert_eq!(category.as_str(), group.as_str());
    }
}

#[test]
fn test_parse_bool() {
    for value in ["1", "true", "TRUE", "yes", "on"] {
        assert_eq!(parse_bool(value), Some(true), "{}", value);
    }
    for value in ["0", "false", "No", "off"] {
        assert_eq!(parse_bool(value), Some(false), "{}", value);
    }
    assert_eq!(parse_bool("maybe"), None);
}
