//! Global admission control through the full middleware stack, and a live
//! server run with graceful shutdown.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use tokio::net::TcpListener;

use common::*;
use company_scoring_api::http::ServerError;
use company_scoring_api::{HttpServer, Shutdown};

async fn limited_router(max_requests: usize, window_seconds: f64) -> axum::Router {
    let store_addr = start_mock_store(MockStore::with_rows(sample_companies())).await;
    let scorer_addr = start_mock_scorer(MockScorer::default()).await;
    let mut config = test_config(store_addr, scorer_addr);
    config.rate_limit.max_requests = max_requests;
    config.rate_limit.window_seconds = window_seconds;
    HttpServer::new(config).unwrap().router()
}

#[tokio::test]
async fn test_requests_over_limit_get_429() {
    let router = limited_router(3, 60.0).await;

    for _ in 0..3 {
        let response = send(&router, get_request("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(&router, get_request("/health")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(body_json(response).await["detail"], "Rate limit exceeded");
}

#[tokio::test]
async fn test_every_route_shares_one_window() {
    let router = limited_router(2, 60.0).await;

    assert_eq!(send(&router, get_request("/companies")).await.status(), StatusCode::OK);
    assert_eq!(
        send(&router, get_request("/nope")).await.status(),
        StatusCode::NOT_FOUND
    );

    // Admission runs before authentication.
    let response = send(&router, post_request("/score/c1", None)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_window_slides() {
    let router = limited_router(2, 0.2).await;

    assert_eq!(send(&router, get_request("/health")).await.status(), StatusCode::OK);
    assert_eq!(send(&router, get_request("/health")).await.status(), StatusCode::OK);
    assert_eq!(
        send(&router, get_request("/health")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(send(&router, get_request("/health")).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_disabled_limit_admits_everything() {
    let store_addr = start_mock_store(MockStore::default()).await;
    let scorer_addr = start_mock_scorer(MockScorer::default()).await;
    let mut config = test_config(store_addr, scorer_addr);
    config.rate_limit.enabled = false;
    config.rate_limit.max_requests = 1;
    let server = HttpServer::new(config).unwrap();
    assert!(server.limiter().is_none());
    let router = server.router();

    for _ in 0..20 {
        assert_eq!(send(&router, get_request("/health")).await.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_unrepresentable_window_is_rejected_at_build() {
    let mut config = test_config(
        "127.0.0.1:9".parse().unwrap(),
        "127.0.0.1:9".parse().unwrap(),
    );
    config.rate_limit.window_seconds = 1e20;

    match HttpServer::new(config) {
        Err(ServerError::Config(errors)) => {
            assert_eq!(errors[0].field, "rate_limit.window_seconds");
        }
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("server built with a window longer than Duration::MAX"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_burst_admits_exactly_limit() {
    let router = limited_router(10, 60.0).await;

    let mut handles = Vec::new();
    for _ in 0..50 {
        let router = router.clone();
        handles.push(tokio::spawn(async move {
            send(&router, get_request("/health")).await.status()
        }));
    }

    let mut admitted = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            StatusCode::OK => admitted += 1,
            StatusCode::TOO_MANY_REQUESTS => rejected += 1,
            other => panic!("unexpected status {}", other),
        }
    }
    assert_eq!(admitted, 10);
    assert_eq!(rejected, 40);
}

#[tokio::test]
async fn test_served_over_tcp_and_shuts_down() {
    let store_addr = start_mock_store(MockStore::with_rows(sample_companies())).await;
    let scorer_addr = start_mock_scorer(MockScorer::default()).await;
    let mut config = test_config(store_addr, scorer_addr);
    config.rate_limit.max_requests = 2;
    config.rate_limit.window_seconds = 60.0;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config).unwrap();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let client = reqwest::Client::new();
    let url = format!("http://{}/companies", addr);
    let first = client.get(&url).send().await.unwrap();
    assert_eq!(first.status(), reqwest::StatusCode::OK);
    let companies: Vec<serde_json::Value> = first.json().await.unwrap();
    assert_eq!(companies.len(), 3);

    assert_eq!(
        client.get(&url).send().await.unwrap().status(),
        reqwest::StatusCode::OK
    );
    assert_eq!(
        client.get(&url).send().await.unwrap().status(),
        reqwest::StatusCode::TOO_MANY_REQUESTS
    );

    drop(client);
    shutdown.trigger();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server stops after shutdown")
        .unwrap()
        .unwrap();
}
