//! Text and hash helpers shared by the dispatcher and the activity recorder.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Width in bytes of a correlation tag before hex encoding.
const TAG_BYTES: usize = 16;

/// Stable, opaque tag for a diagnostic line.
///
/// Identical input always yields the same 32 hex characters, so repeated
/// lines can be grouped without using their content as a key.
pub fn correlation_tag(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(&digest[..TAG_BYTES])
}

/// Prefix a message with the actor it is attributed to.
pub fn actor_line(actor_id: i64, message: &str) -> String {
    format!("[{actor_id}] - {message}")
}

/// Format `at` with a strftime layout. `None` if the layout is invalid.
pub fn format_timestamp<Tz>(at: &DateTime<Tz>, layout: &str) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    write!(out, "{}", at.format(layout)).ok()?;
    Some(out)
}

/// Current local time under `layout`.
pub fn now_timestamp(layout: &str) -> Option<String> {
    format_timestamp(&Local::now(), layout)
}

/// Parse a call timestamp. The whole input must match the layout.
pub fn parse_timestamp(value: &str, layout: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, layout).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TIMESTAMP_LAYOUT;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn tag_is_stable_and_fixed_width() {
        let a = correlation_tag("[7] - Failed Send");
        let b = correlation_tag("[7] - Failed Send");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn tag_depends_on_actor() {
        let a = correlation_tag(&actor_line(7, "Failed Send"));
        let b = correlation_tag(&actor_line(8, "Failed Send"));
        assert_ne!(a, b);
    }

    #[test]
    fn actor_line_format() {
        assert_eq!(actor_line(42, "hello"), "[42] - hello");
    }

    #[test]
    fn timestamp_round_trips_through_layout() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        let text = format_timestamp(&at, DEFAULT_TIMESTAMP_LAYOUT).unwrap();
        assert_eq!(text, "2024-03-09 07:05:01");

        let parsed = parse_timestamp(&text, DEFAULT_TIMESTAMP_LAYOUT).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn parse_rejects_other_layouts() {
        assert!(parse_timestamp("2024-03-09T07:05:01", DEFAULT_TIMESTAMP_LAYOUT).is_none());
        assert!(parse_timestamp("2024-03-09", DEFAULT_TIMESTAMP_LAYOUT).is_none());
        assert!(parse_timestamp("", DEFAULT_TIMESTAMP_LAYOUT).is_none());
    }

    #[test]
    fn invalid_layout_formats_to_none() {
        assert!(now_timestamp("%Y-%Q").is_none());
        assert!(now_timestamp(DEFAULT_TIMESTAMP_LAYOUT).is_some());
    }
}
