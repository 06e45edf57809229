//! Lookup request and query models.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Identifier key under which a DOI is passed in [`IdentifyRequest::identifiers`]
pub const DOI_KEY: &str = "doi";

/// Default timeout hint handed to the transport
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single lookup against the works API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Exact lookup by DOI
    Identifier(String),

    /// Free-text search on title, optionally narrowed by author
    Search {
        title: String,
        author: Option<String>,
    },
}

impl Query {
    /// Build a title search, joining author names with spaces.
    ///
    /// Blank author names are dropped; no names means no author filter.
    pub fn search(title: impl Into<String>, authors: &[String]) -> Self {
        let author = authors
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Query::Search {
            title: title.into(),
            author: (!author.is_empty()).then_some(author),
        }
    }
}

/// What a host hands to [`crate::lookup::MetadataLookup::identify`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyRequest {
    /// Known title, if any
    pub title: Option<String>,

    /// Known authors, in order
    pub authors: Vec<String>,

    /// Known identifiers keyed by scheme (e.g. `doi`)
    pub identifiers: HashMap<String, String>,

    /// Timeout hint passed through to the transport
    pub timeout: Duration,
}

impl Default for IdentifyRequest {
    fn default() -> Self {
        Self {
            title: None,
            authors: Vec::new(),
            identifiers: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl IdentifyRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set title
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Append an author
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }

    /// Set DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.identifiers.insert(DOI_KEY.to_string(), doi.into());
        self
    }

    /// Set timeout hint
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pick the query to run.
    ///
    /// A DOI takes exclusive precedence over the title. Returns `None` when
    /// there is neither a DOI nor a non-blank title.
    pub fn to_query(&self) -> Option<Query> {
        if let Some(doi) = self
            .identifiers
            .get(DOI_KEY)
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
        {
            return Some(Query::Identifier(doi.to_string()));
        }

        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|title| Query::search(title, &self.authors))
    }
}
