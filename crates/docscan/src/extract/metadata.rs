//! Origin metadata (creation time, author) pulled from extraction output.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};

/// Keys checked in order for the document creation timestamp.
const CREATED_KEYS: &[&str] = &["Creation-Date", "dcterms:created", "meta:creation-date"];

/// Keys checked in order for the author.
const AUTHOR_KEYS: &[&str] = &["Author", "dc:creator", "creator", "meta:author"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetadata {
    pub created_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
}

impl DocumentMetadata {
    /// Builds metadata from a flat key/value object such as the JSON body of
    /// a Tika `/meta` response. Values may be strings or arrays of strings.
    pub fn from_json(map: &Map<String, Value>) -> Self {
        let created_at = first_value(map, CREATED_KEYS).and_then(|v| parse_timestamp(&v));
        let author = first_value(map, AUTHOR_KEYS);
        Self { created_at, author }
    }
}

fn first_value(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let value = match map.get(*key)? {
            Value::String(s) => s.clone(),
            Value::Array(items) => items.iter().find_map(|i| i.as_str())?.to_string(),
            _ => return None,
        };
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Parses the timestamp shapes document metadata shows up in:
/// RFC 3339, naive ISO datetimes (taken as UTC), bare dates and PDF
/// date strings (`D:YYYYMMDDHHmmSS` with optional offset).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Some(pdf) = raw.strip_prefix("D:") {
        return parse_pdf_date(pdf);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 4 {
        return None;
    }
    let field = |start: usize, len: usize, default: u32| -> Option<u32> {
        match digits.get(start..start + len) {
            Some(part) => part.parse().ok(),
            None => Some(default),
        }
    };
    let year: i32 = digits.get(0..4)?.parse().ok()?;
    let naive = NaiveDate::from_ymd_opt(year, field(4, 2, 1)?, field(6, 2, 1)?)?.and_hms_opt(
        field(8, 2, 0)?,
        field(10, 2, 0)?,
        field(12, 2, 0)?,
    )?;

    // Offset suffix: Z, or +HH'mm' / -HH'mm'.
    let rest = &s[digits.len()..];
    let offset_secs = match rest.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let nums: String = rest[1..].chars().filter(|c| c.is_ascii_digit()).collect();
            let hours: i32 = nums.get(0..2).and_then(|h| h.parse().ok()).unwrap_or(0);
            let minutes: i32 = nums.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
            let secs = hours * 3600 + minutes * 60;
            if sign == '-' {
                -secs
            } else {
                secs
            }
        }
        _ => 0,
    };

    Some(Utc.from_utc_datetime(&naive) - chrono::Duration::seconds(offset_secs as i64))
}
