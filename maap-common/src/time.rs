//! Timestamp utilities

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC calendar date
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`)
pub fn parse_date(s: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| crate::Error::InvalidInput(format!("Invalid date '{}': {}", s, e)))
}

/// Parse a stored timestamp
///
/// Accepts RFC 3339 (what this crate writes) and SQLite's
/// `CURRENT_TIMESTAMP` form `YYYY-MM-DD HH:MM:SS`, read as UTC.
pub fn parse_timestamp(s: &str) -> crate::Result<DateTime<Utc>> {
    let trimmed = s.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| crate::Error::InvalidInput(format!("Invalid timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[tokio::test]
    async fn test_now_successive_calls_advance() {
        let time1 = now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let time2 = now();
        assert!(time2 > time1);
    }

    #[test]
    fn test_today_matches_now() {
        assert_eq!(today(), now().date_naive());
    }

    #[test]
    fn test_parse_date_valid() {
        let date = parse_date("2025-03-31").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    }

    #[test]
    fn test_parse_date_trims_whitespace() {
        assert!(parse_date(" 2025-01-02 ").is_ok());
    }

    #[test]
    fn test_parse_timestamp_accepts_both_stored_forms() {
        let rfc = parse_timestamp("2025-02-01T08:30:00+00:00").unwrap();
        let sqlite = parse_timestamp("2025-02-01 08:30:00").unwrap();
        assert_eq!(rfc, sqlite);

        let offset = parse_timestamp("2025-02-01T10:30:00+02:00").unwrap();
        assert_eq!(offset, rfc);

        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        let err = parse_date("31/03/2025").unwrap_err();
        assert!(matches!(err, crate::Error::InvalidInput(_)));
    }
}
