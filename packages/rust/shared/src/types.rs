//! Core domain types for Curricle search results and catalog records.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Full title of the encyclopedia category that marks disambiguation pages.
/// Matched verbatim, prefix included.
pub const DISAMBIGUATION_CATEGORY: &str = "Category:All disambiguation pages";

static ARTICLE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://en.wikipedia.org/wiki/").expect("valid article base"));

/// Build the public encyclopedia page URL for a title, percent-encoding as
/// needed (`Graph theory` becomes `.../wiki/Graph%20theory`).
pub fn article_url(title: &str) -> String {
    let mut url = ARTICLE_BASE.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(title);
    }
    url.to_string()
}

// ---------------------------------------------------------------------------
// TopicId
// ---------------------------------------------------------------------------

/// Backend-issued topic identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(pub i64);

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TopicId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

// ---------------------------------------------------------------------------
// Scope
// ---------------------------------------------------------------------------

/// The institution/department pair every catalog route is nested under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    /// Institution URI slug (e.g. `mq`).
    pub institution: String,
    /// Department URI slug (e.g. `computing`).
    pub department: String,
}

impl Scope {
    pub fn new(institution: impl Into<String>, department: impl Into<String>) -> Self {
        Self {
            institution: institution.into(),
            department: department.into(),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.institution, self.department)
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// An encyclopedia category attached to a page, with a browsable link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Full page title, `Category:` prefix included.
    pub name: String,
    /// Public page URL for the category.
    pub url: String,
    /// Catalog-side id, set only when the category came from the backend.
    pub backend_id: Option<i64>,
}

impl Category {
    /// Build a category from its full page title.
    pub fn from_title(title: impl Into<String>) -> Self {
        let name = title.into();
        let url = article_url(&name);
        Self {
            name,
            url,
            backend_id: None,
        }
    }

    /// Build a category as recorded in the catalog, keeping its backend id.
    pub fn from_catalog(id: i64, title: impl Into<String>) -> Self {
        Self {
            backend_id: Some(id),
            ..Self::from_title(title)
        }
    }

    /// The title with the `Category:` namespace prefix stripped, for display.
    pub fn short_name(&self) -> &str {
        self.name.strip_prefix("Category:").unwrap_or(&self.name)
    }
}

// ---------------------------------------------------------------------------
// PageMetadata
// ---------------------------------------------------------------------------

/// Intro extract and categories fetched for one encyclopedia page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    /// Plain-text intro extract, when the page has one.
    pub extract: Option<String>,
    /// Categories of the page, hidden ones included. A page can
    /// legitimately have none.
    pub categories: Vec<Category>,
}

impl PageMetadata {
    /// A page is a disambiguation page iff it carries the marker category.
    pub fn is_disambiguation(&self) -> bool {
        self.categories
            .iter()
            .any(|c| c.name == DISAMBIGUATION_CATEGORY)
    }
}

// ---------------------------------------------------------------------------
// Candidate / ResultSet
// ---------------------------------------------------------------------------

/// One search result, progressively enriched by the pipeline.
///
/// Fresh from search only `title` and `snippet` are populated; enrichment
/// fills the rest. Absent metadata leaves `extract` empty and `categories`
/// untouched rather than failing the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Page title, the merge key for the whole pipeline.
    pub title: String,
    /// Search-hit snippet with highlight markup already stripped.
    pub snippet: String,
    /// Plain-text intro extract; empty when none was found.
    pub extract: String,
    /// Categories of the page.
    pub categories: Vec<Category>,
    /// Whether the page carries [`DISAMBIGUATION_CATEGORY`].
    pub is_disambiguation: bool,
    /// Catalog topic id, when this title is already a known topic.
    pub topic_id: Option<TopicId>,
    /// Codes of the units this topic is attached to, across the department.
    pub associated_units: BTreeSet<String>,
    /// Whether the topic is attached to the unit the search was scoped to.
    pub already_associated: bool,
}

impl Candidate {
    /// A bare candidate as it comes out of free-text search.
    pub fn new(title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            extract: String::new(),
            categories: Vec::new(),
            is_disambiguation: false,
            topic_id: None,
            associated_units: BTreeSet::new(),
            already_associated: false,
        }
    }
}

/// An ordered set of candidates for one query.
#[derive(Debug, Clone)]
pub struct ResultSet {
    /// The query that produced this set (trimmed).
    pub query: String,
    /// Candidates in relevance order.
    pub candidates: Vec<Candidate>,
    /// How many disambiguation pages enrichment dropped.
    pub filtered_disambiguation: usize,
    /// When the set was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl ResultSet {
    /// A raw result set straight from search. Nothing filtered yet.
    pub fn new(query: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            query: query.into(),
            candidates,
            filtered_disambiguation: 0,
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TopicAssociation
// ---------------------------------------------------------------------------

/// Unit associations of one known topic, grouped by topic name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicAssociation {
    /// Topic name, matching the candidate title it belongs to.
    pub topic_name: String,
    /// Backend id of the topic.
    pub topic_id: Option<TopicId>,
    /// Codes of the units the topic is attached to.
    pub unit_codes: BTreeSet<String>,
}

// ---------------------------------------------------------------------------
// Catalog records
// ---------------------------------------------------------------------------

/// A unit of study.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub id: i64,
    pub code: String,
    pub name: String,
    /// Year level, when the catalog records one.
    pub level: Option<i64>,
}

/// A unit row from a paged listing, with its topic count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSummary {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub level: Option<i64>,
    pub num_topics: u64,
}

/// A catalog topic with its cached encyclopedia categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
    pub categories: Vec<Category>,
}

/// A topic row from a paged listing, with the units that reference it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummary {
    pub id: TopicId,
    pub name: String,
    pub unit_codes: Vec<String>,
}

/// One topic attached to one unit, with its teaching aspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTopic {
    pub id: i64,
    /// Unit-local display name overriding the topic name, when set.
    pub alias: Option<String>,
    pub is_taught: bool,
    pub is_assessed: bool,
    pub is_applied: bool,
    pub topic: Topic,
    /// Topics this one is taught in the context of.
    pub contexts: Vec<Topic>,
}

impl UnitTopic {
    /// The alias when present and non-empty, the topic name otherwise.
    pub fn display_name(&self) -> &str {
        match &self.alias {
            Some(alias) if !alias.is_empty() => alias,
            _ => &self.topic.name,
        }
    }
}

/// An institution known to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Institution {
    pub id: i64,
    pub name: String,
    /// URI slug used in catalog routes.
    pub uri: String,
}

/// A department within an institution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: i64,
    pub name: String,
    /// URI slug used in catalog routes.
    pub uri: String,
}

/// An institution together with its departments, from the grouped listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstitutionDepartments {
    pub institution: Institution,
    pub departments: Vec<Department>,
}

/// One page of a paged listing plus the total row count across all pages.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_id_roundtrip() {
        let id: TopicId = "42".parse().expect("parse TopicId");
        assert_eq!(id, TopicId(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn article_url_percent_encodes() {
        assert_eq!(
            article_url("Graph theory"),
            "https://en.wikipedia.org/wiki/Graph%20theory"
        );
        assert_eq!(
            article_url("Graph (discrete mathematics)"),
            "https://en.wikipedia.org/wiki/Graph%20(discrete%20mathematics)"
        );
    }

    #[test]
    fn category_short_name_strips_prefix() {
        let cat = Category::from_title("Category:Graph theory");
        assert_eq!(cat.short_name(), "Graph theory");
        assert_eq!(cat.url, "https://en.wikipedia.org/wiki/Category:Graph%20theory");

        let odd = Category::from_title("No prefix here");
        assert_eq!(odd.short_name(), "No prefix here");

        let cataloged = Category::from_catalog(9, "Category:Trees");
        assert_eq!(cataloged.backend_id, Some(9));
        assert_eq!(cataloged.short_name(), "Trees");
    }

    #[test]
    fn disambiguation_needs_exact_marker() {
        let marked = PageMetadata {
            extract: None,
            categories: vec![Category::from_title(DISAMBIGUATION_CATEGORY)],
        };
        assert!(marked.is_disambiguation());

        let near_miss = PageMetadata {
            extract: None,
            categories: vec![Category::from_title("Category:Disambiguation pages with links")],
        };
        assert!(!near_miss.is_disambiguation());

        assert!(!PageMetadata::default().is_disambiguation());
    }

    #[test]
    fn fresh_candidate_is_unenriched() {
        let c = Candidate::new("Graph theory", "study of graphs");
        assert_eq!(c.extract, "");
        assert!(c.categories.is_empty());
        assert!(!c.is_disambiguation);
        assert!(c.topic_id.is_none());
        assert!(!c.already_associated);
    }

    #[test]
    fn unit_topic_display_name_prefers_alias() {
        let topic = Topic {
            id: TopicId(7),
            name: "Recursion".into(),
            categories: vec![],
        };
        let mut ut = UnitTopic {
            id: 1,
            alias: Some("Recursive thinking".into()),
            is_taught: true,
            is_assessed: false,
            is_applied: false,
            topic,
            contexts: vec![],
        };
        assert_eq!(ut.display_name(), "Recursive thinking");

        ut.alias = Some(String::new());
        assert_eq!(ut.display_name(), "Recursion");

        ut.alias = None;
        assert_eq!(ut.display_name(), "Recursion");
    }
}
