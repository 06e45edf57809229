//! Mapping of raw CrossRef works onto [`MetadataRecord`]s.
//!
//! Every field is read on its own, so one malformed field leaves the rest of
//! the record intact. Only a missing title drops the whole work.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{MetadataRecord, MetadataRecordBuilder, Series};

/// Characters that separate the ends of an issue range such as "3-4"
pub const ISSUE_RANGE_SEPARATORS: &[char] = &['-', '\u{2013}', '/'];

/// Normalize works in order, skipping those without a title
pub fn parse_works(works: &[Value]) -> Vec<MetadataRecord> {
    works.iter().filter_map(parse_work).collect()
}

/// Normalize one work; `None` when it has no title
pub fn parse_work(work: &Value) -> Option<MetadataRecord> {
    let Some(title) = parse_title(work) else {
        let doi = work.get("DOI").and_then(Value::as_str).unwrap_or("-");
        tracing::debug!(doi = doi, "Skipping work without a title");
        return None;
    };

    Some(
        MetadataRecordBuilder::new(title, parse_authors(work))
            .identifier(field::<String>(work, "DOI"))
            .publication_date(parse_pubdate(work))
            .publisher(field::<String>(work, "publisher"))
            .series(parse_series(work))
            .build(),
    )
}

/// First entry of `title`, verbatim
pub fn parse_title(work: &Value) -> Option<String> {
    first_entry(work, "title")
}

/// Author display names in API order.
///
/// May be empty; [`MetadataRecord::new`] substitutes the placeholder.
pub fn parse_authors(work: &Value) -> Vec<String> {
    field::<Vec<Value>>(work, "author")
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| CrossRefAuthor::deserialize(entry).ok())
        .filter_map(|author| author.display_name())
        .collect()
}

/// Publication date from `issued`, `published-print`, then the event dates
pub fn parse_pubdate(work: &Value) -> Option<DateTime<Utc>> {
    field::<CrossRefDate>(work, "issued")
        .and_then(|d| d.to_datetime())
        .or_else(|| field::<CrossRefDate>(work, "published-print").and_then(|d| d.to_datetime()))
        .or_else(|| event_date(work))
}

/// Series name from `container-title`, index from `volume` and `issue`.
///
/// A volume or issue that is not an integer drops the series entirely.
pub fn parse_series(work: &Value) -> Option<Series> {
    let name = first_entry(work, "container-title")?;

    let volume = text_field(work, "volume").unwrap_or_else(|| "1".to_string());
    let issue = text_field(work, "issue").unwrap_or_else(|| "1".to_string());

    match series_index(&volume, &issue) {
        Some(index) => Some(Series { name, index }),
        None => {
            tracing::debug!(
                volume = %volume,
                issue = %issue,
                "Dropping series with non-numeric volume or issue"
            );
            None
        }
    }
}

/// `volume + issue / 100`, using only the start of an issue range
pub fn series_index(volume: &str, issue: &str) -> Option<f64> {
    let volume: u32 = volume.trim().parse().ok()?;
    let issue: u32 = issue
        .split(ISSUE_RANGE_SEPARATORS)
        .next()
        .unwrap_or_default()
        .trim()
        .parse()
        .ok()?;

    Some(f64::from(volume) + f64::from(issue) / 100.0)
}

fn event_date(work: &Value) -> Option<DateTime<Utc>> {
    // CrossRef names it `event`; `work` is accepted for older payloads
    let event = ["event", "work"]
        .iter()
        .filter_map(|key| field::<CrossRefEvent>(work, key))
        .find(|e| e.start.is_some() || e.end.is_some())?;

    event.start.or(event.end)?.to_datetime()
}

fn field<T: DeserializeOwned>(work: &Value, key: &str) -> Option<T> {
    work.get(key).and_then(|v| T::deserialize(v).ok())
}

fn first_entry(work: &Value, key: &str) -> Option<String> {
    field::<Vec<String>>(work, key)?
        .into_iter()
        .next()
        .filter(|s| !s.is_empty())
}

/// A string field that some records send as a bare number
fn text_field(work: &Value, key: &str) -> Option<String> {
    match work.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ===== CrossRef API Types =====

#[derive(Debug, Deserialize)]
struct CrossRefAuthor {
    given: Option<String>,
    family: Option<String>,
    /// Set instead of given/family for organisations
    name: Option<String>,
}

impl CrossRefAuthor {
    fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.given.as_deref(), self.family.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        if !parts.is_empty() {
            return Some(parts.join(" "));
        }

        self.name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
struct CrossRefDate {
    /// `[[year, month, day]]`, trailing parts optional; CrossRef sends
    /// `[[null]]` for unknown dates
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i64>>>,
}

impl CrossRefDate {
    fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let parts = self.date_parts.first()?;
        let part = |i: usize| parts.get(i).copied().flatten();

        let year = i32::try_from(part(0)?).ok()?;
        let month = u32::try_from(part(1).unwrap_or(1)).ok()?;
        let day = u32::try_from(part(2).unwrap_or(1)).ok()?;

        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()
    }
}

#[derive(Debug, Deserialize)]
struct CrossRefEvent {
    start: Option<CrossRefDate>,
    end: Option<CrossRefDate>,
}
