//! Batched intro-extract and category fetches for encyclopedia pages.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use curricle_shared::{Category, CurricleError, PageMetadata, Result, article_url};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

// ---------------------------------------------------------------------------
// MetadataClient
// ---------------------------------------------------------------------------

/// Client for batched page-metadata lookups (`prop=extracts|categories`).
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: Client,
    api_url: Url,
}

/// Display-oriented summary of a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub title: String,
    /// Public page URL.
    pub url: String,
    /// Plain-text intro, empty when the page has none.
    pub extract: String,
    /// Non-hidden categories only.
    pub categories: Vec<Category>,
}

impl MetadataClient {
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

    /// Fetch first-sentence extracts and categories for a batch of titles in
    /// one pipe-joined request.
    ///
    /// The returned map is keyed by the titles as *requested*: normalization
    /// and redirect aliases reported by the API are folded back, so callers
    /// never chase renames. Titles the encyclopedia does not know are simply
    /// absent. Hidden categories are included here; the disambiguation
    /// marker is one of them.
    #[instrument(skip_all, fields(titles = titles.len()))]
    pub async fn fetch(
        &self,
        titles: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, PageMetadata>> {
        if titles.is_empty() {
            return Ok(BTreeMap::new());
        }

        let joined = titles
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("|");

        let envelope: MetaEnvelope = crate::get_json(
            &self.client,
            &self.api_url,
            &[
                ("action", "query"),
                ("format", "json"),
                ("titles", &joined),
                ("prop", "extracts|categories"),
                ("exintro", "true"),
                ("exlimit", "max"),
                ("exsentences", "1"),
                ("explaintext", "true"),
                ("cllimit", "max"),
                ("redirects", "true"),
            ],
        )
        .await?;

        let block = unwrap_envelope(envelope)?;

        let mut by_returned: BTreeMap<String, PageMetadata> = BTreeMap::new();
        for page in block.pages.into_values() {
            if page.missing.is_some() {
                continue;
            }
            by_returned.insert(
                page.title,
                PageMetadata {
                    extract: page.extract,
                    categories: page
                        .categories
                        .into_iter()
                        .map(|c| Category::from_title(c.title))
                        .collect(),
                },
            );
        }

        let mut by_requested = BTreeMap::new();
        for requested in titles {
            let resolved = resolve_alias(requested, &block.normalized, &block.redirects);
            if let Some(meta) = by_returned.get(resolved) {
                by_requested.insert(requested.clone(), meta.clone());
            }
        }

        debug!(
            requested = titles.len(),
            resolved = by_requested.len(),
            "metadata batch complete"
        );
        Ok(by_requested)
    }

    /// Fetch the full intro extract and display categories for one page,
    /// following redirects. `None` when the encyclopedia has no such page.
    #[instrument(skip_all, fields(title = %title))]
    pub async fn page_summary(&self, title: &str) -> Result<Option<PageSummary>> {
        let envelope: MetaEnvelope = crate::get_json(
            &self.client,
            &self.api_url,
            &[
                ("action", "query"),
                ("format", "json"),
                ("titles", title),
                ("prop", "extracts|categories"),
                ("exintro", "true"),
                ("explaintext", "true"),
                ("clshow", "!hidden"),
                ("redirects", "true"),
            ],
        )
        .await?;

        let block = unwrap_envelope(envelope)?;

        let page = block.pages.into_values().find(|p| p.missing.is_none());
        Ok(page.map(|p| PageSummary {
            url: article_url(&p.title),
            extract: p.extract.unwrap_or_default(),
            categories: p
                .categories
                .into_iter()
                .map(|c| Category::from_title(c.title))
                .collect(),
            title: p.title,
        }))
    }
}

fn unwrap_envelope(envelope: MetaEnvelope) -> Result<MetaBlock> {
    if let Some(error) = envelope.error {
        return Err(CurricleError::transport(
            None,
            format!("encyclopedia API error: {}", error.info),
        ));
    }
    envelope
        .query
        .ok_or_else(|| CurricleError::decode("metadata reply missing the query block"))
}

/// Follow the alias chain the API reports for a requested title:
/// requested -> normalized -> redirect target.
fn resolve_alias<'a>(
    requested: &'a str,
    normalized: &'a [TitleAlias],
    redirects: &'a [TitleAlias],
) -> &'a str {
    let normalized_to = normalized
        .iter()
        .find(|a| a.from == requested)
        .map(|a| a.to.as_str())
        .unwrap_or(requested);

    redirects
        .iter()
        .find(|a| a.from == normalized_to)
        .map(|a| a.to.as_str())
        .unwrap_or(normalized_to)
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct MetaEnvelope {
    #[serde(default)]
    error: Option<crate::ApiError>,
    #[serde(default)]
    query: Option<MetaBlock>,
}

#[derive(Debug, Deserialize)]
struct MetaBlock {
    #[serde(default)]
    normalized: Vec<TitleAlias>,
    #[serde(default)]
    redirects: Vec<TitleAlias>,
    /// Keyed by page id ("-1" for missing pages); only the values matter.
    #[serde(default)]
    pages: HashMap<String, MetaPage>,
}

#[derive(Debug, Deserialize)]
struct TitleAlias {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct MetaPage {
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    categories: Vec<WireCategory>,
    /// Present (as `""` or `true`) when the page does not exist.
    #[serde(default)]
    missing: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WireCategory {
    title: String,
}
