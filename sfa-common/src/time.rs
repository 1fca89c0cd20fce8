//! Timestamp utilities
//!
//! History entries carry UTC RFC 3339 timestamps. The human-readable logs use
//! local wall-clock time, and backup folders a compact sortable stamp.

use chrono::{DateTime, Local, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Heading timestamp for the change log and to-do list (`2024-03-01 14:05:09`)
pub fn log_heading(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Compact stamp used in backup folder names (`20240301_140509`)
pub fn folder_stamp(at: DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp.timestamp() > 946_684_800);
    }

    #[test]
    fn test_log_heading_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap();
        assert_eq!(log_heading(at), "2024-03-01 14:05:09");
    }

    #[test]
    fn test_folder_stamp_format() {
        let at = Local.with_ymd_and_hms(2024, 3, 1, 14, 5, 9).unwrap();
        assert_eq!(folder_stamp(at), "20240301_140509");
    }
}
