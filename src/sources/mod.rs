//! Works providers: the API clients the lookup runs against.
//!
//! A provider performs exactly one HTTP request per call and hands back the
//! decoded JSON untouched; [`crate::normalize`] turns it into records.
//! [`CrossRefSource`] is the real client, [`MockSource`] serves canned JSON.

mod crossref;
mod filters;
pub mod mock;

pub use crossref::CrossRefSource;
pub use filters::{
    rename_filter_key, WorksSearch, DEFAULT_RESULT_LIMIT, DEFAULT_SELECT, FILTER_KEY_REWRITES,
};
pub use mock::MockSource;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::models::MetadataFields;

/// Interface every works API client implements.
///
/// Both operations report failure as a [`SourceError`] value; an unknown DOI
/// or a malformed query is an ordinary outcome, not a bug.
#[async_trait]
pub trait WorksProvider: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this provider (e.g. "crossref")
    fn id(&self) -> &str;

    /// Human-readable name of this provider
    fn name(&self) -> &str;

    /// Record fields this provider can fill in
    fn touched_fields(&self) -> MetadataFields {
        MetadataFields::all()
    }

    /// Fetch a single work by identifier.
    ///
    /// Returns the whole response body on success.
    async fn lookup_by_identifier(
        &self,
        id: &str,
        timeout: Option<Duration>,
    ) -> Result<Value, SourceError>;

    /// Search works, returning the result items in API order
    async fn search(&self, search: &WorksSearch) -> Result<Vec<Value>, SourceError>;
}

/// Errors that can occur when talking to a works API
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Non-200 status, connection failure or a body that is not JSON
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered but reported a non-"ok" status
    #[error("API returned status \"{status}\" ({message_type}): {message}")]
    Api {
        status: String,
        message_type: String,
        message: String,
    },

    /// JSON decoded but did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Transport(format!("invalid JSON: {}", err))
    }
}
