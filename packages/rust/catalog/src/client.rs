//! The catalog client: construction, HTTP plumbing, session handling, and
//! the institution/department/graph endpoints.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info, instrument};
use url::Url;

use curricle_shared::{
    CurricleError, Department, Institution, InstitutionDepartments, Result, Scope, TopicId,
};

use crate::wire::{DepartmentsEnvelope, InstitutionWire, InstitutionsEnvelope};

// ---------------------------------------------------------------------------
// CatalogClient
// ---------------------------------------------------------------------------

/// Typed client for the curriculum backend.
///
/// Reads are anonymous; writes need the session cookie established by
/// [`CatalogClient::login`], which the client then sends automatically.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: Url,
}

/// What a rendered curriculum graph should cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphSelector {
    /// The whole department.
    Department,
    /// One unit, by code.
    Unit(String),
    /// One topic and its neighbourhood.
    Topic(TopicId),
    /// Every topic under one category, by backend category id.
    Category(i64),
}

impl CatalogClient {
    /// Create a client for the given backend base URL.
    pub fn new(base_url: Url) -> Result<Self> {
        Self::with_timeout(base_url, crate::DEFAULT_TIMEOUT_SECS)
    }

    /// Create a client with an explicit per-request timeout.
    pub fn with_timeout(base_url: Url, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .cookie_store(true)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                CurricleError::transport(None, format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, base_url })
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Log in and establish the backend session cookie.
    ///
    /// The backend answers `"1"` on success and `"0"` on bad credentials.
    #[instrument(skip_all, fields(user = %username, scope = %scope))]
    pub async fn login(&self, username: &str, password: &str, scope: &Scope) -> Result<()> {
        let url = self.route(&["api", "login"])?;
        let body = json!({
            "user": username,
            "pass": password,
            "institution": scope.institution,
            "department": scope.department,
        });

        match self.post_text(url, &body).await?.trim() {
            "1" => {
                info!("logged in");
                Ok(())
            }
            "0" => Err(CurricleError::auth("backend rejected the credentials")),
            other => Err(CurricleError::decode(format!(
                "unexpected login reply: {other:?}"
            ))),
        }
    }

    /// End the backend session.
    pub async fn logout(&self) -> Result<()> {
        let url = self.route(&["api", "logout"])?;
        let response = self.send_get(url).await?;
        check_status(&response)?;
        debug!("logged out");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Institutions and departments
    // -----------------------------------------------------------------------

    /// List every institution known to the backend.
    pub async fn fetch_institutions(&self) -> Result<Vec<Institution>> {
        // the trailing slash matters to the backend router
        let url = self.route(&["api", "institutions", ""])?;
        let envelope: InstitutionsEnvelope = self.get_json(url, &[]).await?;
        Ok(envelope
            .institutions
            .into_iter()
            .map(InstitutionWire::into_institution)
            .collect())
    }

    /// Fetch one institution by its URI slug.
    pub async fn fetch_institution(&self, institution: &str) -> Result<Institution> {
        let url = self.route(&["api", institution])?;
        let wire: InstitutionWire = self.get_json(url, &[]).await?;
        Ok(wire.into_institution())
    }

    /// List the departments of one institution.
    pub async fn fetch_departments(&self, institution: &str) -> Result<Vec<Department>> {
        let url = self.route(&["api", institution, "departments"])?;
        let envelope: DepartmentsEnvelope = self.get_json(url, &[]).await?;
        Ok(envelope
            .departments
            .iter()
            .map(|d| d.to_department())
            .collect())
    }

    /// List every institution with its departments, for scope pickers.
    pub async fn fetch_departments_grouped(&self) -> Result<Vec<InstitutionDepartments>> {
        let url = self.route(&["api", "departments_group"])?;
        let envelope: InstitutionsEnvelope = self.get_json(url, &[]).await?;
        Ok(envelope
            .institutions
            .into_iter()
            .map(InstitutionWire::into_grouped)
            .collect())
    }

    // -----------------------------------------------------------------------
    // Graphs
    // -----------------------------------------------------------------------

    /// Fetch a rendered curriculum graph as SVG text.
    #[instrument(skip_all, fields(scope = %scope, selector = ?selector))]
    pub async fn fetch_graph(&self, scope: &Scope, selector: &GraphSelector) -> Result<String> {
        let url = match selector {
            GraphSelector::Department => self.scoped(scope, &["graph"])?,
            GraphSelector::Unit(code) => self.scoped(scope, &["graph", "unit", code])?,
            GraphSelector::Topic(id) => {
                self.scoped(scope, &["graph", "topic", &id.to_string()])?
            }
            GraphSelector::Category(id) => {
                self.scoped(scope, &["graph", "category", &id.to_string()])?
            }
        };

        let response = self.send_get(url.clone()).await?;
        check_status(&response)?;
        response
            .text()
            .await
            .map_err(|e| CurricleError::decode(format!("{url}: {e}")))
    }

    // -----------------------------------------------------------------------
    // HTTP plumbing (shared by the other impl blocks)
    // -----------------------------------------------------------------------

    /// Build an absolute URL from path segments under the base.
    pub(crate) fn route(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                CurricleError::config(format!(
                    "backend base URL is not a valid HTTP base: {}",
                    self.base_url
                ))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Route under the scope prefix `api/{institution}/{department}/`.
    pub(crate) fn scoped(&self, scope: &Scope, rest: &[&str]) -> Result<Url> {
        let mut segments = vec![
            "api",
            scope.institution.as_str(),
            scope.department.as_str(),
        ];
        segments.extend_from_slice(rest);
        self.route(&segments)
    }

    async fn send_get(&self, url: Url) -> Result<reqwest::Response> {
        self.client.get(url.clone()).send().await.map_err(|e| {
            CurricleError::transport(
                e.status().map(|s| s.as_u16()),
                format!("{url}: {e}"),
            )
        })
    }

    /// GET a JSON endpoint, with optional query params.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let mut request = self.client.get(url.clone());
        if !params.is_empty() {
            request = request.query(params);
        }

        let response = request.send().await.map_err(|e| {
            CurricleError::transport(
                e.status().map(|s| s.as_u16()),
                format!("{url}: {e}"),
            )
        })?;
        check_status(&response)?;

        response
            .json::<T>()
            .await
            .map_err(|e| CurricleError::decode(format!("{url}: {e}")))
    }

    /// POST a JSON body and return the raw reply text (the backend answers
    /// writes with `''`, `'0'`, or `'1'`).
    pub(crate) async fn post_text(&self, url: Url, body: &serde_json::Value) -> Result<String> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                CurricleError::transport(
                    e.status().map(|s| s.as_u16()),
                    format!("{url}: {e}"),
                )
            })?;
        check_status(&response)?;

        response
            .text()
            .await
            .map_err(|e| CurricleError::decode(format!("{url}: {e}")))
    }

    /// POST a JSON body where any 2xx reply means done.
    pub(crate) async fn post_ok(&self, url: Url, body: &serde_json::Value) -> Result<()> {
        self.post_text(url, body).await.map(|_| ())
    }

    /// POST a JSON body and decode a JSON reply.
    pub(crate) async fn post_json<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &serde_json::Value,
    ) -> Result<T> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                CurricleError::transport(
                    e.status().map(|s| s.as_u16()),
                    format!("{url}: {e}"),
                )
            })?;
        check_status(&response)?;

        response
            .json::<T>()
            .await
            .map_err(|e| CurricleError::decode(format!("{url}: {e}")))
    }
}

fn check_status(response: &reqwest::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(CurricleError::transport(
            Some(status.as_u16()),
            format!("{}: HTTP {status}", response.url()),
        ))
    }
}
