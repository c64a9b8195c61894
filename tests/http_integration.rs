//! End-to-end coverage of the `r3m::http` façade: request routing, the
//! `{ success, data, message }` envelope, status-code mapping, and the
//! batch-job lifecycle exposed through `GET /job/{id}`.

#![cfg(feature = "http")]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::Engine as _;
use r3m::http::{build_router, AppState, JobStore};
use r3m::{Engine, EngineConfig};
use tower::ServiceExt;

fn test_state() -> Arc<AppState> {
    Arc::new(AppState { engine: Engine::new(EngineConfig::default()).unwrap(), jobs: JobStore::new() })
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn health_endpoint_reports_ok() {
    tokio_test::block_on(async {
        let router = build_router(test_state());
        let response = router.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
    });
}

#[test]
fn process_endpoint_round_trips_base64_document() {
    tokio_test::block_on(async {
        let router = build_router(test_state());
        let content = base64::engine::general_purpose::STANDARD.encode(
            "Rust's ownership model enforces memory safety at compile time without a garbage \
             collector, which is why systems programmers reach for it under tight latency budgets.",
        );
        let payload = serde_json::json!({ "file_name": "doc.txt", "content_base64": content });
        let request = Request::builder()
            .method("POST")
            .uri("/process")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["processing_success"], true);
    });
}

#[test]
fn process_endpoint_rejects_invalid_base64_with_400() {
    tokio_test::block_on(async {
        let router = build_router(test_state());
        let payload = serde_json::json!({ "file_name": "doc.txt", "content_base64": "not-valid-base64!!" });
        let request = Request::builder()
            .method("POST")
            .uri("/process")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    });
}

#[test]
fn unknown_job_id_returns_404() {
    tokio_test::block_on(async {
        let router = build_router(test_state());
        let response = router.oneshot(Request::builder().uri("/job/does-not-exist").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    });
}

#[test]
fn batch_endpoint_returns_job_id_that_eventually_completes() {
    tokio_test::block_on(async {
        let state = test_state();
        let router = build_router(Arc::clone(&state));

        let content = base64::engine::general_purpose::STANDARD.encode("Short but plausible document body for batch testing purposes.");
        let payload = serde_json::json!({ "documents": [{ "file_name": "a.txt", "content_base64": content }] });
        let request = Request::builder()
            .method("POST")
            .uri("/batch")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let job_id = body["data"]["job_id"].as_str().unwrap().to_string();

        // The background thread races the assertion; poll briefly instead of
        // assuming completion on the first check.
        let router = build_router(state);
        for _ in 0..50 {
            let response = router
                .clone()
                .oneshot(Request::builder().uri(format!("/job/{job_id}")).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let body = json_body(response).await;
            if body["data"]["status"] == "completed" {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("batch job {job_id} did not complete in time");
    });
}
