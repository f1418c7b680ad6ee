//! Unit-topic links: the association lookup behind search enrichment, the
//! per-unit syllabus listing, and link CRUD.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;
use tracing::{debug, instrument};

use curricle_shared::{CurricleError, Result, Scope, TopicAssociation, TopicId, UnitTopic};

use crate::client::CatalogClient;
use crate::wire::{UnitTopicWire, UnitTopicsEnvelope};

impl CatalogClient {
    /// Look up which of the given topic names already exist in the
    /// department, and which units they are attached to.
    ///
    /// The reply covers only known names; absent keys mean the department has
    /// never seen that topic. An empty title set performs no request.
    #[instrument(skip_all, fields(scope = %scope, titles = titles.len()))]
    pub async fn fetch_associations(
        &self,
        scope: &Scope,
        titles: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, TopicAssociation>> {
        if titles.is_empty() {
            return Ok(BTreeMap::new());
        }

        let joined = titles.iter().cloned().collect::<Vec<_>>().join("|");
        let url = self.scoped(scope, &["unit_topics"])?;
        let envelope: UnitTopicsEnvelope = self
            .get_json(url, &[("topic_name", &joined), ("embed", "topic,unit")])
            .await?;

        let mut associations: BTreeMap<String, TopicAssociation> = BTreeMap::new();
        for row in envelope.unit_topics {
            let topic = row
                .topic
                .ok_or_else(|| CurricleError::decode("unit_topic row missing embedded topic"))?;
            let unit = row
                .unit
                .ok_or_else(|| CurricleError::decode("unit_topic row missing embedded unit"))?;

            associations
                .entry(topic.name.clone())
                .or_insert_with(|| TopicAssociation {
                    topic_name: topic.name,
                    topic_id: Some(TopicId(topic.id)),
                    unit_codes: Default::default(),
                })
                .unit_codes
                .insert(unit.code);
        }

        debug!(known = associations.len(), "association lookup done");
        Ok(associations)
    }

    /// Fetch one unit's syllabus: its topic links with contexts embedded.
    #[instrument(skip_all, fields(scope = %scope, unit = %unit_code))]
    pub async fn fetch_unit_topics(
        &self,
        scope: &Scope,
        unit_code: &str,
    ) -> Result<Vec<UnitTopic>> {
        let url = self.scoped(scope, &["unit_topics"])?;
        let envelope: UnitTopicsEnvelope = self
            .get_json(url, &[("unit_code", unit_code), ("embed", "topic,contexts")])
            .await?;

        envelope
            .unit_topics
            .into_iter()
            .map(UnitTopicWire::into_unit_topic)
            .collect()
    }

    /// Attach a topic to a unit. The backend creates the topic on first use
    /// and fills in its categories from the encyclopedia.
    pub async fn add_unit_topic(
        &self,
        scope: &Scope,
        unit_code: &str,
        topic_name: &str,
    ) -> Result<()> {
        let url = self.scoped(scope, &["unit_topics", "add"])?;
        let body = json!({ "unit_code": unit_code, "topic_name": topic_name });
        self.post_ok(url, &body).await
    }

    /// Attach a free-form topic that has no encyclopedia page behind it.
    /// `keywords` is a comma-separated list.
    pub async fn add_custom_topic(
        &self,
        scope: &Scope,
        unit_code: &str,
        topic_name: &str,
        description: &str,
        keywords: &str,
    ) -> Result<()> {
        let url = self.scoped(scope, &["unit_topics", "add"])?;
        let body = json!({
            "unit_code": unit_code,
            "topic_name": topic_name,
            "topic_description": description,
            "topic_keywords": keywords,
        });
        self.post_ok(url, &body).await
    }

    /// Overwrite a link's alias, teaching aspects, and context topics.
    pub async fn update_unit_topic(&self, scope: &Scope, unit_topic: &UnitTopic) -> Result<()> {
        let url = self.scoped(scope, &["unit_topics", "update"])?;
        let body = json!({
            "id": unit_topic.id,
            "alias": unit_topic.alias,
            "is_taught": unit_topic.is_taught,
            "is_assessed": unit_topic.is_assessed,
            "is_applied": unit_topic.is_applied,
            "contexts": unit_topic
                .contexts
                .iter()
                .map(|t| json!({ "id": t.id }))
                .collect::<Vec<_>>(),
        });
        self.post_ok(url, &body).await
    }

    /// Detach a topic from a unit.
    pub async fn remove_unit_topic(&self, scope: &Scope, unit_topic_id: i64) -> Result<()> {
        let url = self.scoped(scope, &["unit_topics", "remove"])?;
        self.post_ok(url, &json!({ "unit_topic_id": unit_topic_id }))
            .await
    }
}
