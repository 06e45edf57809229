//! CrossRef works API client.

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::config::CrossRefConfig;
use crate::models::MetadataFields;
use crate::sources::{SourceError, WorksProvider, WorksSearch};
use crate::utils::{user_agent, HttpClient};

/// CrossRef research source
///
/// A minimal client for the `/works` endpoint: one GET per call, raw JSON back.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: HttpClient,
    base_url: String,
}

impl CrossRefSource {
    pub fn new(config: &CrossRefConfig) -> Result<Self, SourceError> {
        let user_agent = config
            .user_agent
            .clone()
            .unwrap_or_else(|| user_agent(config.mailto.as_deref()));

        let client =
            HttpClient::with_timeouts(&user_agent, config.timeout(), config.connect_timeout())?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client with default settings against another endpoint
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, SourceError> {
        Self::new(&CrossRefConfig::default().with_base_url(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/works/<id>`, with the identifier inserted as-is.
    ///
    /// DOIs contain a `/` that CrossRef expects unescaped.
    pub fn work_url(&self, id: &str) -> String {
        format!("{}/works/{}", self.base_url, id)
    }

    /// `<base>/works?<params>`
    pub fn search_url(&self, search: &WorksSearch) -> Result<url::Url, SourceError> {
        url::Url::parse_with_params(&format!("{}/works", self.base_url), search.to_params())
            .map_err(|e| SourceError::InvalidRequest(format!("bad works URL: {}", e)))
    }

    async fn get_json(
        &self,
        request: RequestBuilder,
        timeout: Option<Duration>,
    ) -> Result<Value, SourceError> {
        let request = match timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::Transport(format!("request to CrossRef failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await?;
        let json = serde_json::from_str::<Value>(&body).ok();

        if status != StatusCode::OK {
            // CrossRef sends a JSON error envelope for validation failures
            if let Some(err) = json
                .as_ref()
                .filter(|j| j.get("status").is_some())
                .and_then(api_error)
            {
                return Err(err);
            }
            return Err(SourceError::Transport(format!(
                "CrossRef API returned status: {}",
                status
            )));
        }

        let json = json.ok_or_else(|| {
            SourceError::Transport("CrossRef response body is not JSON".to_string())
        })?;

        match api_error(&json) {
            Some(err) => Err(err),
            None => Ok(json),
        }
    }
}

#[async_trait]
impl WorksProvider for CrossRefSource {
    fn id(&self) -> &str {
        "crossref"
    }

    fn name(&self) -> &str {
        "CrossRef"
    }

    fn touched_fields(&self) -> MetadataFields {
        MetadataFields::TITLE
            | MetadataFields::AUTHORS
            | MetadataFields::IDENTIFIER
            | MetadataFields::PUBDATE
            | MetadataFields::PUBLISHER
            | MetadataFields::SERIES
            | MetadataFields::SERIES_INDEX
    }

    async fn lookup_by_identifier(
        &self,
        id: &str,
        timeout: Option<Duration>,
    ) -> Result<Value, SourceError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(SourceError::InvalidRequest("empty identifier".to_string()));
        }

        let url = self.work_url(id);
        tracing::debug!("GET {}", url);

        self.get_json(self.client.get(&url), timeout).await
    }

    async fn search(&self, search: &WorksSearch) -> Result<Vec<Value>, SourceError> {
        let url = self.search_url(search)?;
        tracing::debug!("GET {}", url);

        let mut json = self.get_json(self.client.get(url.as_str()), search.timeout).await?;

        match json.pointer_mut("/message/items").map(Value::take) {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(SourceError::Parse(
                "search response has no message.items array".to_string(),
            )),
        }
    }
}

/// `None` when the body reports `status: "ok"`, otherwise the reported error
fn api_error(json: &Value) -> Option<SourceError> {
    let status = json.get("status").and_then(Value::as_str);
    if status == Some("ok") {
        return None;
    }

    Some(SourceError::Api {
        status: status.unwrap_or("missing").to_string(),
        message_type: json
            .get("message-type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        message: error_message(json),
    })
}

/// The human-readable part of an error envelope.
///
/// CrossRef puts a list of `{type, value, message}` objects under `message`.
fn error_message(json: &Value) -> String {
    let message = match json.get("message") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|e| e.get("message").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("; "),
        Some(Value::Object(entry)) => entry
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    };

    if message.is_empty() {
        "no message".to_string()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn paskin_work() -> Value {
        json!({
            "DOI": "10.1109/5.771073",
            "title": ["Toward unique identifiers"],
            "author": [{"given": "N.", "family": "Paskin"}],
            "container-title": ["Proceedings of the IEEE"],
            "issued": {"date-parts": [[1999, 7]]},
            "publisher": "Institute of Electrical and Electronics Engineers (IEEE)",
            "volume": "87",
            "issue": "7"
        })
    }

    #[test]
    fn test_work_url_keeps_slashes() {
        let source = CrossRefSource::with_base_url("https://api.crossref.org/").unwrap();
        assert_eq!(
            source.work_url("10.1109/5.771073"),
            "https://api.crossref.org/works/10.1109/5.771073"
        );
    }

    #[test]
    fn test_search_url_encodes_params() {
        let source = CrossRefSource::with_base_url("https://api.crossref.org").unwrap();
        let url = source
            .search_url(&WorksSearch::title("Toward unique identifiers").select(["DOI", "title"]))
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.crossref.org/works?rows=5&select=DOI%2Ctitle&query.title=Toward+unique+identifiers"
        );
    }

    #[test]
    fn test_error_message_variants() {
        let listed = json!({"message": [{"type": "x", "message": "first"}, {"message": "second"}]});
        assert_eq!(error_message(&listed), "first; second");
        assert_eq!(error_message(&json!({"message": "plain"})), "plain");
        assert_eq!(error_message(&json!({})), "no message");
    }

    #[tokio::test]
    async fn test_lookup_by_identifier() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/works/10.1109/5.771073")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "ok",
                    "message-type": "work",
                    "message": paskin_work()
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let source = CrossRefSource::with_base_url(server.url()).unwrap();
        let body = source
            .lookup_by_identifier("10.1109/5.771073", Some(Duration::from_secs(5)))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body["message"]["DOI"], "10.1109/5.771073");
    }

    #[tokio::test]
    async fn test_unknown_identifier_is_transport_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/works/10.0000/missing")
            .with_status(404)
            .with_body("Resource not found.")
            .create_async()
            .await;

        let source = CrossRefSource::with_base_url(server.url()).unwrap();
        let err = source
            .lookup_by_identifier("10.0000/missing", None)
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Transport(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_non_ok_status_is_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/works")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "failed",
                    "message-type": "validation-failure",
                    "message": [{
                        "value": "bogus",
                        "message": "Field bogus is not a valid selector",
                        "type": "select-field-invalid"
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let source = CrossRefSource::with_base_url(server.url()).unwrap();
        let err = source
            .search(&WorksSearch::title("anything").select(["bogus"]))
            .await
            .unwrap_err();

        match err {
            SourceError::Api {
                status,
                message_type,
                message,
            } => {
                assert_eq!(status, "failed");
                assert_eq!(message_type, "validation-failure");
                assert_eq!(message, "Field bogus is not a valid selector");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_ok_http_with_failed_body_is_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/works/10.1/x")
            .with_status(200)
            .with_body(json!({"status": "failed", "message-type": "exception", "message": "boom"}).to_string())
            .create_async()
            .await;

        let source = CrossRefSource::with_base_url(server.url()).unwrap();
        let err = source.lookup_by_identifier("10.1/x", None).await.unwrap_err();
        assert!(matches!(err, SourceError::Api { ref message, .. } if message == "boom"));
    }

    #[tokio::test]
    async fn test_search_sends_filters_and_returns_items() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/works")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query.title".into(), "Toward unique identifiers".into()),
                Matcher::UrlEncoded("query.author".into(), "N. Paskin".into()),
                Matcher::UrlEncoded("rows".into(), "5".into()),
                Matcher::UrlEncoded("select".into(), crate::sources::DEFAULT_SELECT.join(",")),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "status": "ok",
                    "message-type": "work-list",
                    "message": {"total-results": 1, "items": [paskin_work(), {"DOI": "10.1/other"}]}
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let source = CrossRefSource::with_base_url(server.url()).unwrap();
        let items = source
            .search(&WorksSearch::title("Toward unique identifiers").author(Some("N. Paskin".into())))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"][0], "Toward unique identifiers");
        assert_eq!(items[1]["DOI"], "10.1/other");
    }

    #[tokio::test]
    async fn test_search_without_items_is_parse_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/works")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"status": "ok", "message-type": "work-list", "message": {}}).to_string())
            .create_async()
            .await;

        let source = CrossRefSource::with_base_url(server.url()).unwrap();
        let err = source.search(&WorksSearch::title("x")).await.unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }

    #[tokio::test]
    async fn test_empty_identifier_is_rejected() {
        let source = CrossRefSource::with_base_url("http://127.0.0.1:9").unwrap();
        let err = source.lookup_by_identifier("  ", None).await.unwrap_err();
        assert!(matches!(err, SourceError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_cloned_source_reuses_client() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/works/10.1109/5.771073")
            .with_status(200)
            .with_body(json!({"status": "ok", "message": paskin_work()}).to_string())
            .expect(2)
            .create_async()
            .await;

        let source = CrossRefSource::with_base_url(server.url()).unwrap();
        let cloned = source.clone();
        assert_eq!(cloned.base_url(), source.base_url());

        for provider in [&source, &cloned] {
            let body = provider
                .lookup_by_identifier("10.1109/5.771073", None)
                .await
                .unwrap();
            assert_eq!(body["message"]["DOI"], "10.1109/5.771073");
        }

        mock.assert_async().await;
    }
}
