//! Mock provider for testing purposes.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::sources::{SourceError, WorksProvider, WorksSearch};

/// A request the mock has served
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Lookup(String),
    Search {
        title: Option<String>,
        author: Option<String>,
        rows: usize,
    },
}

/// A provider that serves canned works from memory.
#[derive(Debug, Default)]
pub struct MockSource {
    works: Mutex<HashMap<String, Value>>,
    search_items: Mutex<Vec<Value>>,
    api_failure: Mutex<Option<String>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `work` for lookups of `doi`.
    pub fn add_work(&self, doi: impl Into<String>, work: Value) {
        lock(&self.works).insert(doi.into(), work);
    }

    /// Set the items every search returns.
    pub fn set_search_items(&self, items: Vec<Value>) {
        *lock(&self.search_items) = items;
    }

    /// Make every call fail with an API-reported error.
    pub fn fail_with_api_error(&self, message: impl Into<String>) {
        *lock(&self.api_failure) = Some(message.into());
    }

    /// Requests served so far, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    fn check_failure(&self) -> Result<(), SourceError> {
        match lock(&self.api_failure).as_ref() {
            Some(message) => Err(SourceError::Api {
                status: "failed".to_string(),
                message_type: "exception".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WorksProvider for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn lookup_by_identifier(
        &self,
        id: &str,
        _timeout: Option<Duration>,
    ) -> Result<Value, SourceError> {
        lock(&self.calls).push(MockCall::Lookup(id.to_string()));
        self.check_failure()?;

        match lock(&self.works).get(id) {
            Some(work) => Ok(json!({
                "status": "ok",
                "message-type": "work",
                "message": work,
            })),
            None => Err(SourceError::Transport(
                "CrossRef API returned status: 404 Not Found".to_string(),
            )),
        }
    }

    async fn search(&self, search: &WorksSearch) -> Result<Vec<Value>, SourceError> {
        lock(&self.calls).push(MockCall::Search {
            title: search.query_title.clone(),
            author: search.query_author.clone(),
            rows: search.rows,
        });
        self.check_failure()?;

        Ok(lock(&self.search_items)
            .iter()
            .take(search.rows)
            .cloned()
            .collect())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Helper to build a minimal CrossRef work for tests.
pub fn make_work(doi: &str, title: &str, authors: &[(&str, &str)]) -> Value {
    json!({
        "DOI": doi,
        "title": [title],
        "author": authors
            .iter()
            .map(|(given, family)| json!({"given": given, "family": family}))
            .collect::<Vec<_>>(),
    })
}
