//! Shared utilities for integration testing.
//!
//! Upstreams are real axum servers bound to an ephemeral port, so requests
//! travel through the same reqwest clients the service uses in production.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;

use company_scoring_api::AppConfig;

pub const TEST_API_KEY: &str = "test-key";
pub const TEST_SERVICE_KEY: &str = "service-key";
pub const TEST_SCORE: i64 = 77;
pub const TEST_REASON: &str = "Consistent labor and environmental record.";

/// Company name the mock scorer refuses to assess.
pub const FAILING_COMPANY: &str = "FailCo";

/// A request captured by a mock upstream.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

/// In-memory PostgREST stand-in for the company table.
#[derive(Clone, Default)]
pub struct MockStore {
    pub rows: Arc<Mutex<Vec<Value>>>,
    pub requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// Server-side cap on rows per response, like PostgREST `db-max-rows`.
    pub max_rows: Option<usize>,
}

impl MockStore {
    pub fn with_rows(rows: Vec<Value>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
            requests: Arc::default(),
            max_rows: None,
        }
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn row(&self, id: &str) -> Option<Value> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r["id"] == id)
            .cloned()
    }

    fn record(&self, method: &str, query: HashMap<String, String>, headers: HeaderMap, body: Option<Value>) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            query,
            headers,
            body,
        });
    }
}

/// Chat-completions stand-in returning a fixed assessment.
#[derive(Clone, Default)]
pub struct MockScorer {
    pub requests: Arc<Mutex<Vec<Value>>>,
}

impl MockScorer {
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn company(id: &str, name: &str, ticker: Option<&str>, score: Option<i64>) -> Value {
    json!({
        "id": id,
        "name": name,
        "ticker": ticker,
        "ethics_score": score,
        "source_reason": null,
        "last_updated": "2024-05-01T12:00:00+00:00",
    })
}

pub fn sample_companies() -> Vec<Value> {
    vec![
        company("c1", "Acme Corp", Some("ACME"), Some(40)),
        company("c2", "Globex", Some("GBX"), None),
        company("c3", "Initech", None, Some(65)),
    ]
}

async fn store_get(
    State(store): State<MockStore>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Vec<Value>> {
    let range = headers
        .get("range")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split_once('-'))
        .and_then(|(a, b)| Some((a.parse::<usize>().ok()?, b.parse::<usize>().ok()?)));
    let id = query.get("id").and_then(|v| v.strip_prefix("eq.")).map(str::to_string);
    store.record("GET", query, headers, None);

    let rows = store.rows.lock().unwrap().clone();
    if let Some(id) = id {
        return Json(rows.into_iter().filter(|r| r["id"] == id.as_str()).collect());
    }

    let (start, end) = range.unwrap_or((0, usize::MAX - 1));
    let requested = end.saturating_sub(start) + 1;
    let take = store.max_rows.map_or(requested, |cap| requested.min(cap));
    Json(rows.into_iter().skip(start).take(take).collect())
}

async fn store_patch(
    State(store): State<MockStore>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Vec<Value>> {
    let id = query
        .get("id")
        .and_then(|v| v.strip_prefix("eq."))
        .unwrap_or_default()
        .to_string();
    store.record("PATCH", query, headers, Some(body.clone()));

    let mut rows = store.rows.lock().unwrap();
    match rows.iter_mut().find(|r| r["id"] == id.as_str()) {
        Some(row) => {
            if let (Some(row), Some(fields)) = (row.as_object_mut(), body.as_object()) {
                for (k, v) in fields {
                    row.insert(k.clone(), v.clone());
                }
            }
            Json(vec![row.clone()])
        }
        None => Json(vec![]),
    }
}

async fn chat_completions(State(scorer): State<MockScorer>, Json(body): Json<Value>) -> Response {
    scorer.requests.lock().unwrap().push(body.clone());

    let prompt = body["messages"][1]["content"].as_str().unwrap_or_default();
    if prompt.contains(FAILING_COMPANY) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "model overloaded").into_response();
    }

    let content = format!(
        "```json\n{{\"score\": {}, \"reason\": \"{}\"}}\n```",
        TEST_SCORE, TEST_REASON
    );
    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    }))
    .into_response()
}

/// Serve `router` on an ephemeral local port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

pub async fn start_mock_store(store: MockStore) -> SocketAddr {
    let router = Router::new()
        .route("/rest/v1/companies", get(store_get).patch(store_patch))
        .with_state(store);
    spawn(router).await
}

pub async fn start_mock_scorer(scorer: MockScorer) -> SocketAddr {
    let router = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(scorer);
    spawn(router).await
}

/// Config wired to the given mock upstreams, with a generous rate limit.
pub fn test_config(store: SocketAddr, scorer: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.api_key = Some(TEST_API_KEY.to_string());
    config.data_store.url = Some(format!("http://{}", store));
    config.data_store.service_key = Some(TEST_SERVICE_KEY.to_string());
    config.scoring.api_base = format!("http://{}", scorer);
    config.scoring.api_key = Some("sk-test".to_string());
    config.rate_limit.max_requests = 10_000;
    config.rate_limit.window_seconds = 60.0;
    config
}

/// Send one request through the fully layered router.
pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_request(uri: &str, api_key: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn patch_request(uri: &str, api_key: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("PATCH")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("x-api-key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
