//! Snapshot-fetch collaborator.
//!
//! The initial full-list load (and every completion-triggered refresh) goes
//! through a [`SnapshotSource`]. The production implementation is a REST
//! call to `/api/<resource>`; tests inject fakes.

use std::future::Future;

use serde_json::Value;

use crate::entity::Entity;
use crate::error::LiveListError;
use crate::kind::ListKind;

// ---------------------------------------------------------------------------
// Query and page types
// ---------------------------------------------------------------------------

/// Sort direction, rendered as the backend's `order` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
        }
    }
}

/// Filter/sort/page parameters for one snapshot fetch, mirroring the
/// backend's `/api/<resource>` query string.
#[derive(Debug, Clone)]
pub struct SnapshotQuery {
    /// 1-based page index.
    pub page: u32,
    /// Page size; also the cap on live appends to a paginated view.
    pub limit: u32,
    pub order_by: Option<String>,
    pub order: Option<SortOrder>,
    pub search: Option<String>,
    /// Server-side project restriction (documents only).
    pub project: Option<String>,
}

impl Default for SnapshotQuery {
    fn default() -> Self {
        SnapshotQuery {
            page: 1,
            limit: 25,
            order_by: None,
            order: None,
            search: None,
            project: None,
        }
    }
}

impl SnapshotQuery {
    /// Render to query-string pairs. Absent optional parameters are omitted
    /// entirely, not sent empty.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(order_by) = &self.order_by {
            pairs.push(("order_by", order_by.clone()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(project) = &self.project {
            pairs.push(("project", project.clone()));
        }
        pairs
    }
}

/// One page of entities plus server-side totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotPage {
    pub entities: Vec<Entity>,
    pub total: u64,
    pub total_pages: u32,
}

// ---------------------------------------------------------------------------
// SnapshotSource
// ---------------------------------------------------------------------------

/// Externally supplied snapshot-fetch function.
///
/// Failures surface to the caller; the client never retries a snapshot
/// fetch on its own.
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch(
        &self,
        kind: &ListKind,
        query: &SnapshotQuery,
    ) -> impl Future<Output = Result<SnapshotPage, LiveListError>> + Send;
}

// ---------------------------------------------------------------------------
// HTTP implementation
// ---------------------------------------------------------------------------

/// REST snapshot source against `<base_url>/api/<resource>`.
pub struct HttpSnapshotSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSnapshotSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Use a caller-configured `reqwest::Client` (timeouts, auth headers).
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        HttpSnapshotSource { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(
        &self,
        kind: &ListKind,
        query: &SnapshotQuery,
    ) -> Result<SnapshotPage, LiveListError> {
        let url = format!("{}{}", self.base_url, kind.api_path());
        let resp = self
            .client
            .get(&url)
            .query(&query.to_pairs())
            .send()
            .await
            .map_err(|e| LiveListError::Request {
                url: url.clone(),
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(LiveListError::Http {
                status: resp.status().as_u16(),
                url,
            });
        }

        let body: Value = resp.json().await.map_err(|e| LiveListError::Snapshot {
            resource: kind.name().to_string(),
            detail: e.to_string(),
        })?;

        parse_page(kind, &body)
    }
}

/// Parse a snapshot body.
///
/// Accepts both the paginated envelope
/// `{ "<resource>": [...], "total": n, "total_pages": m }` and a bare JSON
/// array (some endpoints return the list unwrapped) so the client stays
/// forward-compatible with the backend's response envelope changes.
pub fn parse_page(kind: &ListKind, body: &Value) -> Result<SnapshotPage, LiveListError> {
    let (items, total, total_pages) = match body {
        Value::Array(items) => (items, items.len() as u64, 1),
        Value::Object(envelope) => {
            let items = envelope
                .get(kind.name())
                .and_then(Value::as_array)
                .ok_or_else(|| LiveListError::Snapshot {
                    resource: kind.name().to_string(),
                    detail: format!("missing `{}` array", kind.name()),
                })?;
            let total = envelope
                .get("total")
                .and_then(Value::as_u64)
                .unwrap_or(items.len() as u64);
            let total_pages = envelope
                .get("total_pages")
                .and_then(Value::as_u64)
                .unwrap_or(1) as u32;
            (items, total, total_pages)
        }
        _ => {
            return Err(LiveListError::Snapshot {
                resource: kind.name().to_string(),
                detail: "body is neither an object nor an array".to_string(),
            })
        }
    };

    let entities = items
        .iter()
        .map(|item| {
            item.as_object().cloned().ok_or_else(|| LiveListError::Snapshot {
                resource: kind.name().to_string(),
                detail: "list contains a non-object entry".to_string(),
            })
        })
        .collect::<Result<Vec<Entity>, _>>()?;

    Ok(SnapshotPage {
        entities,
        total,
        total_pages,
    })
}
