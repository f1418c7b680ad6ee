//! Paged unit and topic listings, single-record fetches, and unit CRUD.

use serde_json::json;
use tracing::{debug, instrument};

use curricle_shared::{
    CurricleError, Page, Result, Scope, Topic, TopicId, TopicSummary, Unit, UnitSummary,
};

use crate::client::CatalogClient;
use crate::filter::TopicFilter;
use crate::wire::{
    TopicEnvelope, TopicSummaryWire, TopicsPageEnvelope, UnitEnvelope, UnitWire,
    UnitsPageEnvelope,
};

impl CatalogClient {
    // -----------------------------------------------------------------------
    // Units
    // -----------------------------------------------------------------------

    /// Fetch one page of the department's units with their topic counts.
    #[instrument(skip_all, fields(scope = %scope, limit = limit, offset = offset))]
    pub async fn fetch_units(
        &self,
        scope: &Scope,
        limit: u64,
        offset: u64,
    ) -> Result<Page<UnitSummary>> {
        let url = self.scoped(scope, &["units", &limit.to_string(), &offset.to_string()])?;
        let envelope: UnitsPageEnvelope = self.get_json(url, &[]).await?;

        Ok(Page {
            items: envelope
                .units
                .into_iter()
                .map(UnitWire::into_summary)
                .collect(),
            total: envelope.total,
        })
    }

    /// Fetch a single unit by code.
    pub async fn fetch_unit(&self, scope: &Scope, code: &str) -> Result<Unit> {
        let url = self.scoped(scope, &["unit", code])?;
        let envelope: UnitEnvelope = self.get_json(url, &[]).await?;
        Ok(envelope.unit.into_unit())
    }

    /// Create a unit. Returns `true` when created, `false` when a unit with
    /// that code already exists (the backend answers `"1"` or `"0"`).
    #[instrument(skip_all, fields(scope = %scope, code = %code))]
    pub async fn add_unit(
        &self,
        scope: &Scope,
        code: &str,
        name: &str,
        level: Option<i64>,
    ) -> Result<bool> {
        let url = self.scoped(scope, &["unit", "add"])?;
        let body = json!({ "code": code, "name": name, "level": level });

        match self.post_text(url, &body).await?.trim() {
            "1" => Ok(true),
            "0" => {
                debug!("unit already exists");
                Ok(false)
            }
            other => Err(CurricleError::decode(format!(
                "unexpected unit/add reply: {other:?}"
            ))),
        }
    }

    /// Overwrite a unit's code, name, and level.
    pub async fn update_unit(&self, scope: &Scope, unit: &Unit) -> Result<()> {
        let url = self.scoped(scope, &["unit", "update"])?;
        let body = json!({
            "id": unit.id,
            "code": unit.code,
            "name": unit.name,
            "level": unit.level,
        });
        self.post_ok(url, &body).await
    }

    /// Delete a unit (and through the backend's cascade, its topic links).
    pub async fn remove_unit(&self, scope: &Scope, id: i64) -> Result<()> {
        let url = self.scoped(scope, &["unit", "remove"])?;
        self.post_ok(url, &json!({ "id": id })).await
    }

    // -----------------------------------------------------------------------
    // Topics
    // -----------------------------------------------------------------------

    /// Fetch one page of the department's topics with referencing unit codes.
    #[instrument(skip_all, fields(scope = %scope, limit = limit, offset = offset))]
    pub async fn fetch_topics(
        &self,
        scope: &Scope,
        limit: u64,
        offset: u64,
    ) -> Result<Page<TopicSummary>> {
        let url = self.scoped(scope, &["topics", &limit.to_string(), &offset.to_string()])?;
        let envelope: TopicsPageEnvelope = self.get_json(url, &[]).await?;
        Ok(topics_page(envelope))
    }

    /// Fetch one page of topics matching an include/exclude filter.
    #[instrument(skip_all, fields(scope = %scope, limit = limit, offset = offset))]
    pub async fn query_topics(
        &self,
        scope: &Scope,
        filter: &TopicFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Page<TopicSummary>> {
        let url = self.scoped(
            scope,
            &["topics", "filter", &limit.to_string(), &offset.to_string()],
        )?;
        let envelope: TopicsPageEnvelope = self.post_json(url, &filter.to_body()).await?;
        Ok(topics_page(envelope))
    }

    /// Fetch a single topic with its cached categories.
    pub async fn fetch_topic(&self, scope: &Scope, id: TopicId) -> Result<Topic> {
        let url = self.scoped(scope, &["topic", &id.to_string()])?;
        let envelope: TopicEnvelope = self.get_json(url, &[]).await?;
        Ok(envelope.topic.into_topic())
    }
}

fn topics_page(envelope: TopicsPageEnvelope) -> Page<TopicSummary> {
    Page {
        items: envelope
            .topics
            .into_iter()
            .map(TopicSummaryWire::into_summary)
            .collect(),
        total: envelope.total,
    }
}
