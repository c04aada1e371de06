use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Timelike, Utc};

use crate::{AppError, AppResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Wall-clock timestamp in the wire form used by assignment and log documents.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Today's calendar date in `YYYY-MM-DD` form.
pub fn today() -> String {
    Utc::now().date_naive().format(DATE_FORMAT).to_string()
}

/// Validate a `YYYY-MM-DD` calendar date string.
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|err| {
        AppError::new("TIME/INVALID_DATE", "Invalid calendar date")
            .with_context("date", date.to_string())
            .with_context("error", err.to_string())
    })
}

/// Korean-locale rendering of an RFC3339 timestamp, e.g. `2024. 1. 15. 오후 2:05:09`.
///
/// Unparseable input is returned as-is rather than erroring; the export view
/// must never fail on a single malformed document.
pub fn format_ko(timestamp: &str) -> String {
    let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };
    let (is_pm, hour12) = parsed.hour12();
    let meridiem = if is_pm { "오후" } else { "오전" };
    format!(
        "{}. {}. {}. {} {}:{:02}:{:02}",
        parsed.year(),
        parsed.month(),
        parsed.day(),
        meridiem,
        hour12,
        parsed.minute(),
        parsed.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_ms_is_reasonable() {
        let a = now_ms();
        assert!(a > 1_500_000_000_000); // after 2017
        assert!(a < 4_100_000_000_000); // before year ~2100
    }

    #[test]
    fn today_parses_back() {
        parse_date(&today()).unwrap();
    }

    #[test]
    fn parse_date_rejects_garbage() {
        let err = parse_date("01/02/2024").unwrap_err();
        assert_eq!(err.code(), "TIME/INVALID_DATE");
        assert_eq!(err.context().get("date"), Some(&"01/02/2024".to_string()));
    }

    #[test]
    fn format_ko_morning_and_afternoon() {
        assert_eq!(
            format_ko("2024-01-15T09:05:09Z"),
            "2024. 1. 15. 오전 9:05:09"
        );
        assert_eq!(
            format_ko("2024-01-15T14:05:09.123Z"),
            "2024. 1. 15. 오후 2:05:09"
        );
    }

    #[test]
    fn format_ko_passes_garbage_through() {
        assert_eq!(format_ko("not-a-timestamp"), "not-a-timestamp");
    }
}
