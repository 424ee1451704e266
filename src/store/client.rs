//! PostgREST client for company records.
//!
//! # Responsibilities
//! - List companies with search, ordering and paging
//! - Fetch a single company by id
//! - Write back scores and arbitrary field updates

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RANGE};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;

use crate::config::DataStoreConfig;
use crate::store::types::{Company, CompanyUpdate, ListQuery, ScoreUpdate, COMPANY_COLUMNS};
use crate::store::{StoreError, StoreResult};

/// Thin REST client over the company table.
#[derive(Clone)]
pub struct DataStoreClient {
    http: Client,
    config: DataStoreConfig,
}

impl DataStoreClient {
    /// Create a client sharing the given connection pool.
    pub fn new(http: Client, config: DataStoreConfig) -> Self {
        Self { http, config }
    }

    /// List companies matching `query`.
    pub async fn list_companies(&self, query: &ListQuery) -> StoreResult<Vec<Company>> {
        let mut params = vec![
            ("select", COMPANY_COLUMNS.join(",")),
            ("order", query.order.to_string()),
        ];
        if let Some(search) = &query.search {
            let pattern = sanitize_pattern(search);
            params.push((
                "or",
                format!("(name.ilike.*{0}*,ticker.ilike.*{0}*)", pattern),
            ));
        }

        let request = self
            .request(reqwest::Method::GET)?
            .query(&params)
            .header(RANGE, query.range_header());

        tracing::debug!(
            order = %query.order,
            limit = query.limit,
            offset = query.offset,
            search = ?query.search,
            "Listing companies"
        );

        let response = send(request).await?;
        Ok(response.json().await?)
    }

    /// Fetch a single company, `None` if no row has this id.
    pub async fn fetch_company(&self, id: &str) -> StoreResult<Option<Company>> {
        let request = self.request(reqwest::Method::GET)?.query(&[
            ("select", COMPANY_COLUMNS.join(",")),
            ("id", format!("eq.{}", id)),
        ]);

        let rows: Vec<Company> = send(request).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    /// Store a freshly computed score and its rationale.
    pub async fn update_score(&self, id: &str, score: i32, reason: &str) -> StoreResult<Company> {
        let body = ScoreUpdate {
            ethics_score: score,
            source_reason: reason,
        };
        self.patch(id, &body).await
    }

    /// Apply a partial update.
    pub async fn update_fields(&self, id: &str, update: &CompanyUpdate) -> StoreResult<Company> {
        self.patch(id, update).await
    }

    async fn patch<B: Serialize + ?Sized>(&self, id: &str, body: &B) -> StoreResult<Company> {
        let request = self
            .request(reqwest::Method::PATCH)?
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(body);

        let rows: Vec<Company> = send(request).await?.json().await?;
        let updated = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        tracing::info!(company_id = %id, "Company updated");
        Ok(updated)
    }

    fn request(&self, method: reqwest::Method) -> StoreResult<RequestBuilder> {
        let base = self
            .config
            .url
            .as_deref()
            .ok_or(StoreError::NotConfigured("SUPABASE_URL"))?;
        let endpoint = format!(
            "{}/rest/v1/{}",
            base.trim_end_matches('/'),
            self.config.table
        );

        Ok(self.http.request(method, endpoint).headers(self.headers()?))
    }

    fn headers(&self) -> StoreResult<HeaderMap> {
        let key = self
            .config
            .service_key
            .as_deref()
            .ok_or(StoreError::NotConfigured("SUPABASE_KEY"))?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(key)?);
        headers.insert(AUTHORIZATION, header_value(&format!("Bearer {}", key))?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl std::fmt::Debug for DataStoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStoreClient")
            .field("url", &self.config.url)
            .field("table", &self.config.table)
            .finish()
    }
}

async fn send(request: RequestBuilder) -> StoreResult<Response> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = %status, body = %body, "Data store returned an error");
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

fn header_value(value: &str) -> StoreResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| StoreError::NotConfigured("SUPABASE_KEY"))
}

/// Strip characters with meaning inside a PostgREST logic tree.
fn sanitize_pattern(search: &str) -> String {
    search
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '"'))
        .collect()
}
