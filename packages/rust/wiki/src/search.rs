//! Free-text search and prefix suggestions against the encyclopedia API.

use curricle_shared::{Candidate, CurricleError, Result, ResultSet};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::markup;

// ---------------------------------------------------------------------------
// SearchClient
// ---------------------------------------------------------------------------

/// Client for the MediaWiki search endpoints (`list=search` and
/// `action=opensearch`).
#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    api_url: Url,
}

impl SearchClient {
    /// Create a client for the given `api.php` endpoint.
    pub fn new(api_url: Url) -> Result<Self> {
        Self::with_timeout(api_url, crate::DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(api_url: Url, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: crate::build_client(timeout_secs)?,
            api_url,
        })
    }

    /// Run a free-text search and return the raw, unenriched result set in
    /// relevance order.
    ///
    /// The query is trimmed first; a blank query is rejected before any
    /// request goes out. Snippets come back with highlight markup already
    /// stripped.
    #[instrument(skip_all, fields(query = %query))]
    pub async fn search(&self, query: &str) -> Result<ResultSet> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(CurricleError::EmptyQuery);
        }

        let envelope: SearchEnvelope = crate::get_json(
            &self.client,
            &self.api_url,
            &[
                ("action", "query"),
                ("format", "json"),
                ("list", "search"),
                ("srsearch", trimmed),
                ("srprop", "snippet|redirecttitle"),
            ],
        )
        .await?;

        if let Some(error) = envelope.error {
            return Err(CurricleError::transport(
                None,
                format!("encyclopedia API error: {}", error.info),
            ));
        }

        let block = envelope
            .query
            .ok_or_else(|| CurricleError::decode("search reply missing the query block"))?;

        let candidates: Vec<Candidate> = block
            .search
            .into_iter()
            .map(|hit| {
                let snippet = markup::strip_highlights(&hit.snippet.unwrap_or_default());
                Candidate::new(hit.title, snippet)
            })
            .collect();

        info!(hits = candidates.len(), "search complete");
        Ok(ResultSet::new(trimmed, candidates))
    }

    /// Prefix-complete a partial query via the opensearch endpoint.
    ///
    /// Blank input short-circuits to no suggestions without a request.
    #[instrument(skip_all, fields(partial = %partial))]
    pub async fn suggestions(&self, partial: &str) -> Result<Vec<String>> {
        let trimmed = partial.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        // Positional reply: [query, completions, descriptions, urls]
        let mut reply: Vec<serde_json::Value> = crate::get_json(
            &self.client,
            &self.api_url,
            &[
                ("action", "opensearch"),
                ("format", "json"),
                ("search", trimmed),
            ],
        )
        .await?;

        if reply.len() < 2 {
            return Err(CurricleError::decode(
                "opensearch reply has no completions element",
            ));
        }

        let completions: Vec<String> = serde_json::from_value(reply.swap_remove(1))
            .map_err(|e| CurricleError::decode(format!("opensearch completions: {e}")))?;

        debug!(suggestions = completions.len(), "opensearch complete");
        Ok(completions)
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    error: Option<crate::ApiError>,
    #[serde(default)]
    query: Option<SearchBlock>,
}

#[derive(Debug, Deserialize)]
struct SearchBlock {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
    #[serde(default)]
    snippet: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unroutable_client() -> SearchClient {
        let url = Url::parse("http://127.0.0.1:9/api.php").expect("parse url");
        SearchClient::new(url).expect("build client")
    }

    fn mock_client(server: &wiremock::MockServer) -> SearchClient {
        let url = Url::parse(&format!("{}/w/api.php", server.uri())).expect("parse url");
        SearchClient::new(url).expect("build client")
    }

    #[tokio::test]
    async fn search_maps_hits_in_order() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("list", "search"))
            .and(wiremock::matchers::query_param("srsearch", "graph theory"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "query": {
                    "search": [
                        {
                            "title": "Graph theory",
                            "snippet": "<span class=\"searchmatch\">Graph</span> theory is the study"
                        },
                        {
                            "title": "Graph (discrete mathematics)",
                            "snippet": "a <span class=\"searchmatch\">graph</span> is a structure"
                        }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let results = client.search("  graph theory  ").await.expect("search");

        assert_eq!(results.query, "graph theory");
        assert_eq!(results.len(), 2);
        assert_eq!(results.candidates[0].title, "Graph theory");
        assert_eq!(results.candidates[0].snippet, "Graph theory is the study");
        assert_eq!(
            results.candidates[1].title,
            "Graph (discrete mathematics)"
        );
        assert_eq!(results.filtered_disambiguation, 0);
    }

    #[tokio::test]
    async fn search_blank_query_fails_without_request() {
        let client = unroutable_client();
        let err = client.search("   ").await.unwrap_err();
        assert!(matches!(err, CurricleError::EmptyQuery));
    }

    #[tokio::test]
    async fn search_zero_hits_is_empty_set() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "query": { "search": [] }
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let results = client.search("zxqy").await.expect("search");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn search_http_error_carries_status() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let err = client.search("graph").await.unwrap_err();
        assert_eq!(err.http_status(), Some(503));
    }

    #[tokio::test]
    async fn search_inband_api_error_is_transport() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "error": { "code": "srsearch-text", "info": "Search request is longer than the maximum allowed length." }
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let err = client.search("graph").await.unwrap_err();
        assert!(err.to_string().contains("maximum allowed length"));
    }

    #[tokio::test]
    async fn search_malformed_reply_is_decode_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "batchcomplete": ""
            })))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let err = client.search("graph").await.unwrap_err();
        assert!(matches!(err, CurricleError::Decode { .. }));
    }

    #[tokio::test]
    async fn suggestions_use_second_reply_element() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("action", "opensearch"))
            .and(wiremock::matchers::query_param("search", "gra"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!([
                "gra",
                ["Graph theory", "Gravity"],
                ["", ""],
                [
                    "https://en.wikipedia.org/wiki/Graph_theory",
                    "https://en.wikipedia.org/wiki/Gravity"
                ]
            ])))
            .mount(&server)
            .await;

        let client = mock_client(&server);
        let suggestions = client.suggestions("gra").await.expect("suggestions");
        assert_eq!(suggestions, vec!["Graph theory", "Gravity"]);
    }

    #[tokio::test]
    async fn suggestions_blank_input_skips_request() {
        let client = unroutable_client();
        let suggestions = client.suggestions("  ").await.expect("suggestions");
        assert!(suggestions.is_empty());
    }
}
