//! The enrichment pipeline: search → concurrent metadata and association
//! lookups → merge by title → disambiguation filter.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, instrument};

use curricle_catalog::CatalogClient;
use curricle_shared::{
    Candidate, CurricleError, PageMetadata, Result, ResultSet, Scope, TopicAssociation,
};
use curricle_wiki::{MetadataClient, SearchClient};

/// Orchestrates the search, metadata, and catalog clients into one
/// search-and-enrich flow.
///
/// Each call works on a borrowed input set and returns a fresh one, so two
/// in-flight searches can never see each other's state. A superseded call is
/// cancelled by dropping its future, which aborts both fan-out requests.
#[derive(Debug, Clone)]
pub struct EnrichmentPipeline {
    search: SearchClient,
    metadata: MetadataClient,
    catalog: CatalogClient,
    scope: Scope,
}

impl EnrichmentPipeline {
    pub fn new(
        search: SearchClient,
        metadata: MetadataClient,
        catalog: CatalogClient,
        scope: Scope,
    ) -> Self {
        Self {
            search,
            metadata,
            catalog,
            scope,
        }
    }

    /// Run the whole flow: free-text search, then [`enrich`](Self::enrich)
    /// on the raw result set.
    #[instrument(skip_all, fields(query = %query, scope = %self.scope))]
    pub async fn search_enriched(
        &self,
        query: &str,
        scope_unit: Option<&str>,
    ) -> Result<ResultSet> {
        let raw = self.search.search(query).await?;
        self.enrich(&raw, scope_unit).await
    }

    /// Enrich a raw result set with metadata and local associations, then
    /// drop disambiguation pages.
    ///
    /// The metadata and association fetches run concurrently and are joined;
    /// if either fails, the call fails as [`CurricleError::PartialData`]
    /// naming the stage, and `raw` is left untouched. Within one call the
    /// numbers balance: kept candidates plus `filtered_disambiguation`
    /// equal the deduplicated input count.
    #[instrument(skip_all, fields(candidates = raw.candidates.len()))]
    pub async fn enrich(&self, raw: &ResultSet, scope_unit: Option<&str>) -> Result<ResultSet> {
        // Duplicate titles (redirect artifacts) would waste batched lookups.
        let candidates = dedup_candidates(&raw.candidates);
        let titles: BTreeSet<String> = candidates.iter().map(|c| c.title.clone()).collect();

        let (metadata, associations) = tokio::try_join!(
            async {
                self.metadata
                    .fetch(&titles)
                    .await
                    .map_err(|e| CurricleError::partial("metadata", e))
            },
            async {
                self.catalog
                    .fetch_associations(&self.scope, &titles)
                    .await
                    .map_err(|e| CurricleError::partial("associations", e))
            },
        )?;

        let (kept, filtered) = merge_candidates(candidates, metadata, associations, scope_unit);

        info!(
            kept = kept.len(),
            filtered_disambiguation = filtered,
            "enrichment complete"
        );

        Ok(ResultSet {
            query: raw.query.clone(),
            candidates: kept,
            filtered_disambiguation: filtered,
            fetched_at: raw.fetched_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Pure merge steps
// ---------------------------------------------------------------------------

/// Drop repeated titles, keeping the first occurrence (its snippet wins).
fn dedup_candidates(candidates: &[Candidate]) -> Vec<Candidate> {
    let mut seen = BTreeSet::new();
    candidates
        .iter()
        .filter(|c| seen.insert(c.title.clone()))
        .cloned()
        .collect()
}

/// Attach metadata and associations to each candidate by title, then
/// partition out disambiguation pages. Relative order of the kept candidates
/// is the input order.
fn merge_candidates(
    candidates: Vec<Candidate>,
    mut metadata: BTreeMap<String, PageMetadata>,
    mut associations: BTreeMap<String, TopicAssociation>,
    scope_unit: Option<&str>,
) -> (Vec<Candidate>, usize) {
    let mut kept = Vec::with_capacity(candidates.len());
    let mut filtered = 0usize;

    for mut candidate in candidates {
        // Titles are unique after dedup, so each map entry is consumed once.
        if let Some(meta) = metadata.remove(&candidate.title) {
            candidate.is_disambiguation = meta.is_disambiguation();
            candidate.extract = meta.extract.unwrap_or_default();
            candidate.categories = meta.categories;
        }
        if let Some(assoc) = associations.remove(&candidate.title) {
            candidate.topic_id = assoc.topic_id;
            candidate.associated_units = assoc.unit_codes;
        }
        candidate.already_associated =
            scope_unit.is_some_and(|unit| candidate.associated_units.contains(unit));

        if candidate.is_disambiguation {
            filtered += 1;
        } else {
            kept.push(candidate);
        }
    }

    (kept, filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curricle_shared::{Category, DISAMBIGUATION_CATEGORY, TopicId};
    use serde_json::json;
    use url::Url;

    fn pipeline(
        wiki: &wiremock::MockServer,
        backend: &wiremock::MockServer,
    ) -> EnrichmentPipeline {
        let api = Url::parse(&format!("{}/w/api.php", wiki.uri())).expect("parse url");
        let base = Url::parse(&backend.uri()).expect("parse url");
        EnrichmentPipeline::new(
            SearchClient::new(api.clone()).expect("build client"),
            MetadataClient::new(api).expect("build client"),
            CatalogClient::new(base).expect("build client"),
            Scope::new("mq", "computing"),
        )
    }

    fn meta(extract: Option<&str>, categories: &[&str]) -> PageMetadata {
        PageMetadata {
            extract: extract.map(String::from),
            categories: categories.iter().map(|c| Category::from_title(*c)).collect(),
        }
    }

    fn assoc(name: &str, id: i64, units: &[&str]) -> TopicAssociation {
        TopicAssociation {
            topic_name: name.to_string(),
            topic_id: Some(TopicId(id)),
            unit_codes: units.iter().map(|u| u.to_string()).collect(),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence_in_order() {
        let raw = vec![
            Candidate::new("X", "first snippet"),
            Candidate::new("X", "second snippet"),
            Candidate::new("Y", "other"),
        ];
        let deduped = dedup_candidates(&raw);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "X");
        assert_eq!(deduped[0].snippet, "first snippet");
        assert_eq!(deduped[1].title, "Y");
    }

    #[test]
    fn merge_attaches_extract_and_categories() {
        let candidates = vec![Candidate::new("Graph theory", "s")];
        let mut metadata = BTreeMap::new();
        metadata.insert(
            "Graph theory".to_string(),
            meta(Some("Study of graphs."), &["Category:Graph theory"]),
        );

        let (kept, filtered) =
            merge_candidates(candidates, metadata, BTreeMap::new(), None);

        assert_eq!(filtered, 0);
        assert_eq!(kept[0].extract, "Study of graphs.");
        assert_eq!(kept[0].categories.len(), 1);
        assert!(!kept[0].is_disambiguation);
    }

    #[test]
    fn merge_treats_absent_metadata_as_empty() {
        let candidates = vec![Candidate::new("Obscure", "s")];
        let (kept, filtered) =
            merge_candidates(candidates, BTreeMap::new(), BTreeMap::new(), None);

        assert_eq!(filtered, 0);
        assert_eq!(kept[0].extract, "");
        assert!(kept[0].categories.is_empty());
        assert!(kept[0].associated_units.is_empty());
        assert!(!kept[0].already_associated);
    }

    #[test]
    fn merge_drops_disambiguation_pages_in_order() {
        let candidates = vec![
            Candidate::new("Mercury (element)", "s"),
            Candidate::new("Mercury", "s"),
            Candidate::new("Mercury (planet)", "s"),
        ];
        let mut metadata = BTreeMap::new();
        metadata.insert(
            "Mercury".to_string(),
            meta(None, &[DISAMBIGUATION_CATEGORY]),
        );
        metadata.insert(
            "Mercury (element)".to_string(),
            meta(Some("A metal."), &["Category:Chemical elements"]),
        );
        metadata.insert(
            "Mercury (planet)".to_string(),
            meta(Some("A planet."), &["Category:Planets"]),
        );

        let (kept, filtered) =
            merge_candidates(candidates, metadata, BTreeMap::new(), None);

        assert_eq!(filtered, 1);
        let titles: Vec<_> = kept.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Mercury (element)", "Mercury (planet)"]);
    }

    #[test]
    fn page_without_categories_is_never_disambiguation() {
        let candidates = vec![Candidate::new("Plain", "s")];
        let mut metadata = BTreeMap::new();
        metadata.insert("Plain".to_string(), meta(Some("text"), &[]));

        let (kept, filtered) =
            merge_candidates(candidates, metadata, BTreeMap::new(), None);
        assert_eq!((kept.len(), filtered), (1, 0));
    }

    #[test]
    fn scope_unit_membership_sets_the_flag() {
        let candidates = vec![Candidate::new("X", "s")];
        let mut associations = BTreeMap::new();
        associations.insert("X".to_string(), assoc("X", 5, &["CS101", "CS205"]));

        let (kept, _) = merge_candidates(
            candidates.clone(),
            BTreeMap::new(),
            associations.clone(),
            Some("CS101"),
        );
        assert!(kept[0].already_associated);
        assert_eq!(kept[0].topic_id, Some(TopicId(5)));

        let (kept, _) =
            merge_candidates(candidates, BTreeMap::new(), associations, Some("CS999"));
        assert!(!kept[0].already_associated);
    }

    // -----------------------------------------------------------------------
    // End to end against mocked services
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn search_enriched_merges_and_flags_scope_unit() {
        let wiki = wiremock::MockServer::start().await;
        let backend = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("list", "search"))
            .and(wiremock::matchers::query_param("srsearch", "Graph Theory"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "query": {
                    "search": [
                        { "title": "Graph theory", "snippet": "the study of graphs" },
                        { "title": "Graph (discrete mathematics)", "snippet": "a structure" }
                    ]
                }
            })))
            .mount(&wiki)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("prop", "extracts|categories"))
            .and(wiremock::matchers::query_param(
                "titles",
                "Graph (discrete mathematics)|Graph theory",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "query": {
                    "pages": {
                        "101": {
                            "title": "Graph theory",
                            "extract": "Graph theory is the study of graphs.",
                            "categories": [ { "title": "Category:Graph theory" } ]
                        },
                        "102": {
                            "title": "Graph (discrete mathematics)",
                            "extract": "A graph is a structure of vertices and edges.",
                            "categories": [ { "title": "Category:Graph theory" } ]
                        }
                    }
                }
            })))
            .mount(&wiki)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/mq/computing/unit_topics"))
            .and(wiremock::matchers::query_param(
                "topic_name",
                "Graph (discrete mathematics)|Graph theory",
            ))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "unit_topics": [
                    {
                        "id": 1,
                        "topic": { "id": 42, "name": "Graph theory" },
                        "unit": { "id": 4, "code": "COMP225", "name": "Algorithms" }
                    }
                ]
            })))
            .mount(&backend)
            .await;

        let pipeline = pipeline(&wiki, &backend);
        let results = pipeline
            .search_enriched("Graph Theory", Some("COMP225"))
            .await
            .expect("enriched search");

        assert_eq!(results.len(), 2);
        assert_eq!(results.filtered_disambiguation, 0);

        let first = &results.candidates[0];
        assert_eq!(first.title, "Graph theory");
        assert_eq!(first.extract, "Graph theory is the study of graphs.");
        assert_eq!(first.topic_id, Some(TopicId(42)));
        assert!(first.associated_units.contains("COMP225"));
        assert!(first.already_associated);

        let second = &results.candidates[1];
        assert_eq!(second.title, "Graph (discrete mathematics)");
        assert!(second.associated_units.is_empty());
        assert!(!second.already_associated);
    }

    #[tokio::test]
    async fn failing_fan_out_stage_is_named() {
        let wiki = wiremock::MockServer::start().await;
        let backend = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("list", "search"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "query": { "search": [ { "title": "Graph theory", "snippet": "s" } ] }
            })))
            .mount(&wiki)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("prop", "extracts|categories"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&wiki)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/mq/computing/unit_topics"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(json!({ "unit_topics": [] })),
            )
            .mount(&backend)
            .await;

        let pipeline = pipeline(&wiki, &backend);
        let err = pipeline
            .search_enriched("Graph Theory", None)
            .await
            .unwrap_err();

        assert!(
            matches!(err, CurricleError::PartialData { ref stage, .. } if stage == "metadata")
        );
    }

    #[tokio::test]
    async fn failed_fan_out_leaves_the_raw_input_intact() {
        let wiki = wiremock::MockServer::start().await;
        let backend = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&wiki)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/mq/computing/unit_topics"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(json!({ "unit_topics": [] })),
            )
            .mount(&backend)
            .await;

        let raw = ResultSet::new(
            "graph",
            vec![
                Candidate::new("Graph theory", "the study of graphs"),
                Candidate::new("Graph (discrete mathematics)", "a structure"),
            ],
        );

        let pipeline = pipeline(&wiki, &backend);
        pipeline.enrich(&raw, None).await.unwrap_err();

        assert_eq!(raw.len(), 2);
        assert_eq!(raw.candidates[0].snippet, "the study of graphs");
        assert!(raw.candidates[0].extract.is_empty());
        assert_eq!(raw.filtered_disambiguation, 0);
    }

    #[tokio::test]
    async fn duplicate_titles_fetch_one_batch_each() {
        let wiki = wiremock::MockServer::start().await;
        let backend = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("list", "search"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "query": {
                    "search": [
                        { "title": "X", "snippet": "first" },
                        { "title": "X", "snippet": "second" },
                        { "title": "Y", "snippet": "other" }
                    ]
                }
            })))
            .mount(&wiki)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("prop", "extracts|categories"))
            .and(wiremock::matchers::query_param("titles", "X|Y"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "query": { "pages": {} }
            })))
            .expect(1)
            .mount(&wiki)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/mq/computing/unit_topics"))
            .and(wiremock::matchers::query_param("topic_name", "X|Y"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(json!({ "unit_topics": [] })),
            )
            .expect(1)
            .mount(&backend)
            .await;

        let pipeline = pipeline(&wiki, &backend);
        let results = pipeline
            .search_enriched("x", None)
            .await
            .expect("enriched search");

        assert_eq!(results.len(), 2);
        assert_eq!(results.candidates[0].snippet, "first");
    }

    #[tokio::test]
    async fn re_enriching_the_output_keeps_its_count() {
        let wiki = wiremock::MockServer::start().await;
        let backend = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("prop", "extracts|categories"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "query": {
                    "pages": {
                        "1": {
                            "title": "Mercury",
                            "categories": [ { "title": DISAMBIGUATION_CATEGORY } ]
                        },
                        "2": { "title": "Mercury (planet)", "extract": "A planet." }
                    }
                }
            })))
            .mount(&wiki)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/api/mq/computing/unit_topics"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_json(json!({ "unit_topics": [] })),
            )
            .mount(&backend)
            .await;

        let raw = ResultSet::new(
            "mercury",
            vec![
                Candidate::new("Mercury", "s"),
                Candidate::new("Mercury (planet)", "s"),
            ],
        );

        let pipeline = pipeline(&wiki, &backend);
        let once = pipeline.enrich(&raw, None).await.expect("first pass");
        assert_eq!(once.len(), 1);
        assert_eq!(once.filtered_disambiguation, 1);

        let twice = pipeline.enrich(&once, None).await.expect("second pass");
        assert_eq!(twice.len(), once.len());
        assert_eq!(twice.filtered_disambiguation, 0);
    }

    #[tokio::test]
    async fn empty_result_set_skips_both_fetches() {
        let wiki = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/w/api.php"))
            .and(wiremock::matchers::query_param("list", "search"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "query": { "search": [] }
            })))
            .mount(&wiki)
            .await;

        // Metadata and catalog are unroutable; only the search may go out.
        let api = Url::parse(&format!("{}/w/api.php", wiki.uri())).expect("parse url");
        let dead = Url::parse("http://127.0.0.1:9/").expect("parse url");
        let pipeline = EnrichmentPipeline::new(
            SearchClient::new(api).expect("build client"),
            MetadataClient::new(dead.clone()).expect("build client"),
            CatalogClient::new(dead).expect("build client"),
            Scope::new("mq", "computing"),
        );

        let results = pipeline
            .search_enriched("unheard of term", None)
            .await
            .expect("search");
        assert!(results.is_empty());
        assert_eq!(results.filtered_disambiguation, 0);
    }
}
