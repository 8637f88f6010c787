//! Macrotrack Tools module
//!
//! MCP tool implementations for the nutrition tracker.

pub mod backup;
pub mod charts;
pub mod dashboard;
pub mod entries;
pub mod foods;
pub mod goals;
pub mod reports;
pub mod status;
pub mod sync;

use chrono::NaiveDate;

/// Longest range, in days, a dashboard, chart or report covers
pub const MAX_RANGE_DAYS: i64 = 366;

/// Parse a tool date argument: `YYYY-MM-DD` or `today`
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("today") {
        return Ok(chrono::Local::now().date_naive());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", value))
}

/// Parse an inclusive date range, rejecting an inverted one or one longer
/// than `MAX_RANGE_DAYS`
pub fn parse_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate), String> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    if start > end {
        return Err(format!("start_date {} is after end_date {}", start, end));
    }
    let days = (end - start).num_days() + 1;
    if days > MAX_RANGE_DAYS {
        return Err(format!(
            "Range {} to {} covers {} days; the limit is {}",
            start, end, days, MAX_RANGE_DAYS
        ));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-02-28").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert!(parse_date("today").is_ok());
        assert!(parse_date("02/28/2025").is_err());
    }

    #[test]
    fn test_parse_range_rejects_inverted() {
        assert!(parse_range("2025-03-02", "2025-03-01").is_err());
        assert!(parse_range("2025-03-01", "2025-03-01").is_ok());
    }

    #[test]
    fn test_parse_range_caps_length() {
        assert!(parse_range("2024-01-01", "2024-12-31").is_ok());
        assert!(parse_range("2024-01-01", "2025-01-01").is_err());
        assert!(parse_range("0001-01-01", "9999-12-31").is_err());
    }
}
