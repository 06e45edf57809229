//! Search parameters for the works endpoint and the key-rewrite table that
//! maps them onto CrossRef's dotted filter names.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Substring rewrites applied, in order, to every parameter key.
pub const FILTER_KEY_REWRITES: &[(&str, &str)] = &[
    ("container_title", "container-title"),
    ("query_", "query."),
];

/// Default number of rows requested per search
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Work fields the normalizer reads
pub const DEFAULT_SELECT: &[&str] = &[
    "DOI",
    "title",
    "author",
    "container-title",
    "issued",
    "published-print",
    "publisher",
    "volume",
    "issue",
    "page",
    "event",
];

/// Rewrite a parameter key into the API's naming convention
pub fn rename_filter_key(key: &str) -> String {
    FILTER_KEY_REWRITES
        .iter()
        .fold(key.to_string(), |acc, (from, to)| acc.replace(from, to))
}

/// A search against `/works`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorksSearch {
    /// Free-text query over all fields (usually unset)
    pub query: Option<String>,

    /// Title filter
    pub query_title: Option<String>,

    /// Author filter
    pub query_author: Option<String>,

    /// Maximum rows returned
    pub rows: usize,

    /// Fields to return
    pub select: Vec<String>,

    /// Timeout hint for this request
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl Default for WorksSearch {
    fn default() -> Self {
        Self {
            query: None,
            query_title: None,
            query_author: None,
            rows: DEFAULT_RESULT_LIMIT,
            select: DEFAULT_SELECT.iter().map(|s| s.to_string()).collect(),
            timeout: None,
        }
    }
}

impl WorksSearch {
    /// Create a title search
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            query_title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Set author filter
    pub fn author(mut self, author: Option<String>) -> Self {
        self.query_author = author;
        self
    }

    /// Set result cap
    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }

    /// Replace the field selection
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set timeout hint
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Query parameters in wire form.
    ///
    /// `rows` is always sent so the API never falls back to its own page size.
    /// Other empty values are dropped, then keys go through [`FILTER_KEY_REWRITES`].
    pub fn to_params(&self) -> Vec<(String, String)> {
        let rows = Some(self.rows.to_string());
        let select = (!self.select.is_empty()).then(|| self.select.join(","));

        [
            ("query", self.query.clone()),
            ("rows", rows),
            ("select", select),
            ("query_title", self.query_title.clone()),
            ("query_author", self.query_author.clone()),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .filter(|v| !v.trim().is_empty())
                .map(|v| (rename_filter_key(key), v))
        })
        .collect()
    }
}
