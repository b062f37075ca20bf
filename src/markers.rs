use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;

pub const NOTE_PREFIX: &str = "  > <!-- bot: note --> ";
pub const SUBTASK_PREFIX: &str = "<!-- bot: subtask ";
pub const LAST_REVIEW_PREFIX: &str = "<!-- bot: last_review";

#[derive(Debug, Clone, Serialize)]
pub struct SubtaskMarker {
    pub id: String,
    pub original_line: String,
    pub title: String,
    pub estimate_hours: Option<f64>,
    pub assignee: Option<String>,
    #[serde(rename = "createdAtUtc")]
    pub created_at_utc: String,
    pub source_model: String,
    pub status: String,
}

impl SubtaskMarker {
    pub fn new(original_line: &str, title: &str, source_model: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_subtask_id(),
            original_line: original_line.to_string(),
            title: title.to_string(),
            estimate_hours: None,
            assignee: None,
            created_at_utc: format!("{}Z", iso_timestamp(now)),
            source_model: source_model.to_string(),
            status: "suggested".to_string(),
        }
    }

    pub fn to_comment(&self) -> Result<String> {
        Ok(format!("{SUBTASK_PREFIX}{} -->", spaced_json(self)?))
    }
}

pub fn note_line(title: &str) -> String {
    format!("{NOTE_PREFIX}{title}")
}

pub fn last_review_line(now: DateTime<Utc>, model: &str, hash: &str) -> String {
    format!(
        "<!-- bot: last_review --> {}Z model={model} hash={hash}",
        iso_timestamp(now)
    )
}

pub fn is_last_review_line(line: &str) -> bool {
    line.starts_with(LAST_REVIEW_PREFIX)
}

/// Naive UTC timestamp with microseconds; the fraction is dropped when zero.
pub fn iso_timestamp(now: DateTime<Utc>) -> String {
    let naive = now.naive_utc();
    if now.timestamp_subsec_micros() == 0 {
        naive.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        naive.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

pub fn file_stamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

fn generate_subtask_id() -> String {
    let value: u32 = rand::random();
    format!("sub:{value:08x}")
}

/// JSON with `", "` and `": "` separators, matching markers already in documents.
fn spaced_json<T: Serialize>(value: &T) -> Result<String> {
    let mut out = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, SpacedFormatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use regex::Regex;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 9, 30, 5).unwrap() + chrono::Duration::microseconds(42)
    }

    #[test]
    fn note_line_has_indent_and_prefix() {
        assert_eq!(note_line("Draft plan"), "  > <!-- bot: note --> Draft plan");
    }

    #[test]
    fn subtask_comment_matches_marker_layout() {
        let mut marker = SubtaskMarker::new("Team notes", "Create “plan”", "gpt-5-mini", fixed_time());
        marker.id = "sub:0a1b2c3d".to_string();
        let comment = marker.to_comment().expect("comment");
        assert_eq!(
            comment,
            "<!-- bot: subtask {\"id\": \"sub:0a1b2c3d\", \"original_line\": \"Team notes\", \
             \"title\": \"Create “plan”\", \"estimate_hours\": null, \"assignee\": null, \
             \"createdAtUtc\": \"2026-10-14T09:30:05.000042Z\", \"source_model\": \"gpt-5-mini\", \
             \"status\": \"suggested\"} -->"
        );
    }

    #[test]
    fn subtask_ids_are_prefixed_hex() {
        let id_re = Regex::new(r"^sub:[0-9a-f]{8}$").expect("Valid regex pattern");
        let first = SubtaskMarker::new("a", "b", "m", fixed_time());
        let second = SubtaskMarker::new("a", "b", "m", fixed_time());
        assert!(id_re.is_match(&first.id));
        assert!(id_re.is_match(&second.id));
    }

    #[test]
    fn last_review_line_format() {
        let line = last_review_line(fixed_time(), "gpt-5-mini", "2026-10-01T08:00:00Z");
        assert_eq!(
            line,
            "<!-- bot: last_review --> 2026-10-14T09:30:05.000042Z model=gpt-5-mini hash=2026-10-01T08:00:00Z"
        );
        assert!(is_last_review_line(&line));
        assert!(!is_last_review_line("  <!-- bot: last_review -->"));
    }

    #[test]
    fn timestamps_drop_zero_fraction() {
        let whole = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(iso_timestamp(whole), "2026-01-02T03:04:05");
        assert_eq!(file_stamp(whole), "20260102T030405Z");
    }
}
