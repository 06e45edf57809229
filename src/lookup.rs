//! Caller-facing lookup: picks the query, runs it against a provider and
//! turns the raw works into [`MetadataRecord`]s.

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use crate::models::{IdentifyRequest, MetadataRecord, Query};
use crate::normalize::{parse_work, parse_works};
use crate::sources::{SourceError, WorksProvider, WorksSearch, DEFAULT_RESULT_LIMIT, DEFAULT_SELECT};

/// Metadata lookup over a works provider.
///
/// Provider failures are logged here and come out as an empty candidate list.
#[derive(Debug, Clone)]
pub struct MetadataLookup {
    provider: Arc<dyn WorksProvider>,
    select: Vec<String>,
    limit: usize,
}

impl MetadataLookup {
    pub fn new(provider: Arc<dyn WorksProvider>) -> Self {
        Self {
            provider,
            select: DEFAULT_SELECT.iter().map(|s| s.to_string()).collect(),
            limit: DEFAULT_RESULT_LIMIT,
        }
    }

    /// Set the number of rows requested per title search
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Replace the fields requested from the API
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn provider(&self) -> &Arc<dyn WorksProvider> {
        &self.provider
    }

    /// Look up candidates for `request` and push them into `results`.
    ///
    /// A DOI, when given, is the only query made. `abort` is checked before
    /// each record is emitted; the request itself is never interrupted.
    /// Returns the number of records emitted.
    pub async fn identify(
        &self,
        request: &IdentifyRequest,
        abort: &AtomicBool,
        results: &UnboundedSender<MetadataRecord>,
    ) -> usize {
        let candidates = match request.to_query() {
            Some(query) => self.run(&query, Some(request.timeout)).await,
            None => {
                tracing::debug!("Nothing to look up: no DOI and no title");
                Vec::new()
            }
        };

        let mut emitted = 0;
        for record in candidates {
            if abort.load(Ordering::Relaxed) {
                tracing::debug!("Lookup aborted after {} record(s)", emitted);
                break;
            }
            if results.send(record).is_err() {
                tracing::warn!("Result queue closed; dropping remaining candidates");
                break;
            }
            emitted += 1;
        }

        emitted
    }

    /// Run a query and return its records
    pub async fn run(&self, query: &Query, timeout: Option<Duration>) -> Vec<MetadataRecord> {
        match query {
            Query::Identifier(doi) => self.query_doi(doi, timeout).await,
            Query::Search { title, author } => {
                self.query_title(title, author.as_deref(), timeout).await
            }
        }
    }

    /// Look up a work by DOI; yields zero or one record
    pub async fn query_doi(&self, doi: &str, timeout: Option<Duration>) -> Vec<MetadataRecord> {
        tracing::debug!("Getting work metadata by DOI: {}", doi);

        match self.provider.lookup_by_identifier(doi, timeout).await {
            Ok(body) => body
                .get("message")
                .and_then(parse_work)
                .into_iter()
                .collect(),
            Err(err) => {
                self.log_failure(&err);
                Vec::new()
            }
        }
    }

    /// Search works by title and optional author text
    pub async fn query_title(
        &self,
        title: &str,
        author: Option<&str>,
        timeout: Option<Duration>,
    ) -> Vec<MetadataRecord> {
        tracing::debug!(
            "Getting work by title \"{}\" and authors \"{}\"",
            title,
            author.unwrap_or_default()
        );

        let search = WorksSearch::title(title)
            .author(author.map(str::to_string))
            .rows(self.limit)
            .select(self.select.iter().cloned())
            .timeout(timeout);

        match self.provider.search(&search).await {
            Ok(items) => normalize_items(&items),
            Err(err) => {
                self.log_failure(&err);
                Vec::new()
            }
        }
    }

    fn log_failure(&self, err: &SourceError) {
        match err {
            SourceError::Api {
                status,
                message_type,
                message,
            } => tracing::error!(
                "{} returned status \"{}\" and message type {}. Message is \"{}\".",
                self.provider.name(),
                status,
                message_type,
                message
            ),
            other => tracing::error!("{} lookup failed: {}", self.provider.name(), other),
        }
    }
}

fn normalize_items(items: &[Value]) -> Vec<MetadataRecord> {
    let records = parse_works(items);
    if records.len() < items.len() {
        tracing::debug!(
            "Skipped {} of {} result(s) without a title",
            items.len() - records.len(),
            items.len()
        );
    }
    records
}
