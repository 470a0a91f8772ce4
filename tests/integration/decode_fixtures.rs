use chrono::{Datelike, TimeZone, Timelike, Utc};
use gwstat::decode::{Decoder, PayloadFormat};
use gwstat::models::constants::DEFAULT_DETECTORS;
use gwstat::ParseError;

use super::fixture;

fn default_detectors() -> Vec<String> {
    DEFAULT_DETECTORS.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_json_fixture_decodes_allow_listed_detectors() {
    let decoder = Decoder::new(PayloadFormat::Json, default_detectors());
    let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 1, 0).unwrap();

    let snapshot = decoder.decode(&fixture("status.json"), now).unwrap();

    assert_eq!(snapshot.len(), 5);
    assert!(snapshot.get("LIGO India").is_none());
    assert_eq!(snapshot.captured_at, Utc.with_ymd_and_hms(2024, 1, 5, 12, 0, 0).unwrap());

    let observing: Vec<&str> = snapshot
        .iter()
        .filter(|(_, reading)| reading.observing)
        .map(|(name, _)| name)
        .collect();
    assert_eq!(observing, vec!["GEO 600", "KAGRA", "LIGO Hanford"]);
}

#[test]
fn test_json_fixture_marks_error_status() {
    let decoder = Decoder::new(PayloadFormat::Json, default_detectors());
    let now = Utc.with_ymd_and_hms(2024, 1, 5, 12, 3, 0).unwrap();

    let snapshot = decoder.decode(&fixture("status_changed.json"), now).unwrap();
    let kagra = snapshot.get("KAGRA").unwrap();

    assert!(kagra.error);
    assert!(!kagra.observing);
    assert_eq!(kagra.color.as_deref(), Some("#ff00ff"));
}

#[test]
fn test_html_fixture_decodes_with_capture_time() {
    let decoder = Decoder::new(PayloadFormat::Html, default_detectors());
    let now = Utc.with_ymd_and_hms(2024, 7, 14, 3, 30, 0).unwrap();

    let snapshot = decoder.decode(&fixture("status.html"), now).unwrap();

    assert_eq!(snapshot.captured_at.month(), 7);
    assert_eq!(snapshot.captured_at.minute(), 30);
    assert_eq!(snapshot.get("Virgo").unwrap().status, "Down");
    assert_eq!(snapshot.get("LIGO Livingston").unwrap().status, "Locking");
    assert!(snapshot.get("KAGRA").unwrap().observing);
}

#[test]
fn test_wrong_format_is_parse_error() {
    let decoder = Decoder::new(PayloadFormat::Json, default_detectors());
    let err = decoder.decode(&fixture("status.html"), Utc::now()).unwrap_err();
    assert!(matches!(err, ParseError::Json(_)));

    let decoder = Decoder::new(PayloadFormat::Html, default_detectors());
    let err = decoder.decode(&fixture("status.json"), Utc::now()).unwrap_err();
    assert!(matches!(err, ParseError::MissingDetector(_)));
}
