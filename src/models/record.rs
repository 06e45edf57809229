//! Normalized metadata record produced from a CrossRef work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author name used when a work lists no usable authors
pub const UNKNOWN_AUTHOR: &str = "Unknown";

bitflags::bitflags! {
    /// Metadata fields a record can carry
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MetadataFields: u32 {
        const TITLE = 1 << 0;
        const AUTHORS = 1 << 1;
        const IDENTIFIER = 1 << 2;
        const PUBDATE = 1 << 3;
        const PUBLISHER = 1 << 4;
        const SERIES = 1 << 5;
        const SERIES_INDEX = 1 << 6;
    }
}

/// The containing publication of a work and its position in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Journal or proceedings title
    pub name: String,

    /// Synthetic ordering number (`volume + issue / 100`)
    pub index: f64,
}

/// A bibliographic record normalized from one API result
///
/// Only built from a result that carries a title; `authors` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Work title
    pub title: String,

    /// Author names in API order
    pub authors: Vec<String>,

    /// Digital Object Identifier
    pub identifier: Option<String>,

    /// Publication date (UTC midnight)
    pub publication_date: Option<DateTime<Utc>>,

    /// Publisher name
    pub publisher: Option<String>,

    /// Series the work belongs to
    pub series: Option<Series>,
}

impl MetadataRecord {
    /// Create a record with a title and authors.
    ///
    /// An empty author list is replaced with `["Unknown"]`.
    pub fn new(title: impl Into<String>, authors: Vec<String>) -> Self {
        let authors = if authors.is_empty() {
            vec![UNKNOWN_AUTHOR.to_string()]
        } else {
            authors
        };

        Self {
            title: title.into(),
            authors,
            identifier: None,
            publication_date: None,
            publisher: None,
            series: None,
        }
    }

    pub fn series_name(&self) -> Option<&str> {
        self.series.as_ref().map(|s| s.name.as_str())
    }

    pub fn series_index(&self) -> Option<f64> {
        self.series.as_ref().map(|s| s.index)
    }

    /// Whether the author list is only the `Unknown` placeholder
    pub fn has_unknown_authors(&self) -> bool {
        self.authors.len() == 1 && self.authors[0] == UNKNOWN_AUTHOR
    }

    /// Fields this record actually populated
    pub fn populated_fields(&self) -> MetadataFields {
        let mut fields = MetadataFields::TITLE;
        if !self.has_unknown_authors() {
            fields |= MetadataFields::AUTHORS;
        }
        if self.identifier.is_some() {
            fields |= MetadataFields::IDENTIFIER;
        }
        if self.publication_date.is_some() {
            fields |= MetadataFields::PUBDATE;
        }
        if self.publisher.is_some() {
            fields |= MetadataFields::PUBLISHER;
        }
        if self.series.is_some() {
            fields |= MetadataFields::SERIES | MetadataFields::SERIES_INDEX;
        }
        fields
    }
}

/// Builder for constructing MetadataRecord objects
#[derive(Debug, Clone)]
pub struct MetadataRecordBuilder {
    record: MetadataRecord,
}

impl MetadataRecordBuilder {
    pub fn new(title: impl Into<String>, authors: Vec<String>) -> Self {
        Self {
            record: MetadataRecord::new(title, authors),
        }
    }

    /// Set DOI
    pub fn identifier(mut self, doi: Option<String>) -> Self {
        self.record.identifier = doi;
        self
    }

    /// Set publication date
    pub fn publication_date(mut self, date: Option<DateTime<Utc>>) -> Self {
        self.record.publication_date = date;
        self
    }

    /// Set publisher
    pub fn publisher(mut self, publisher: Option<String>) -> Self {
        self.record.publisher = publisher;
        self
    }

    /// Set series name and index together
    pub fn series(mut self, series: Option<Series>) -> Self {
        self.record.series = series;
        self
    }

    pub fn build(self) -> MetadataRecord {
        self.record
    }
}
