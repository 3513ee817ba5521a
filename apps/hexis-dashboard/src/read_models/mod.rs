//! Read models composed from store readers: the action feed and the dashboard
//! snapshot.

pub(crate) mod actions;
pub(crate) mod attempt;
pub(crate) mod composer;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses the timestamp shapes the agent writes: RFC 3339, or SQLite's
/// `YYYY-MM-DD HH:MM:SS[.fff]` taken as UTC.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_in_agent_formats() {
        let expected = DateTime::parse_from_rfc3339("2025-03-01T10:00:00Z")
            .expect("ts")
            .with_timezone(&Utc);
        assert_eq!(parse_timestamp("2025-03-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01 10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T10:00:00.000"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
