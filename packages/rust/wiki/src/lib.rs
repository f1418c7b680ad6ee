//! Encyclopedia (MediaWiki) API clients for Curricle.
//!
//! Two small clients cover everything topic search needs:
//! - [`SearchClient`]: free-text search and prefix suggestions
//! - [`MetadataClient`]: batched intro extracts and categories
//!
//! Both speak the public `api.php` endpoint and return typed records; the
//! wire shapes stay private to this crate.

mod markup;
pub mod metadata;
pub mod search;

use curricle_shared::{CurricleError, Result};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

pub use metadata::{MetadataClient, PageSummary};
pub use search::SearchClient;

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 3;

/// User-Agent string for encyclopedia requests.
const USER_AGENT: &str = concat!("Curricle/", env!("CARGO_PKG_VERSION"));

/// Error object the MediaWiki API returns in-band with HTTP 200.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub(crate) info: String,
}

/// Build a reqwest client with appropriate settings.
pub(crate) fn build_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CurricleError::transport(None, format!("failed to build HTTP client: {e}")))
}

/// GET the API endpoint with the given query params and decode the JSON reply.
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    api_url: &Url,
    params: &[(&str, &str)],
) -> Result<T> {
    let response = client
        .get(api_url.clone())
        .query(params)
        .send()
        .await
        .map_err(|e| {
            CurricleError::transport(
                e.status().map(|s| s.as_u16()),
                format!("{api_url}: {e}"),
            )
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(CurricleError::transport(
            Some(status.as_u16()),
            format!("{api_url}: HTTP {status}"),
        ));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| CurricleError::decode(format!("{api_url}: {e}")))
}
