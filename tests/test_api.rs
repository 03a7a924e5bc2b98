//! Integration tests for the HTTP API endpoints.
//!
//! Uses axum's oneshot pattern (via tower::ServiceExt), so no TCP binding is needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use electoral_forecast::registry::StateModelRegistry;
use electoral_forecast::server::create_router;

static REGISTRY: std::sync::OnceLock<Arc<StateModelRegistry>> = std::sync::OnceLock::new();

fn app() -> axum::Router {
    create_router(
        REGISTRY
            .get_or_init(|| Arc::new(StateModelRegistry::baseline()))
            .clone(),
    )
}

/// Parse response body as JSON.
async fn body_json(body: Body) -> serde_json::Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn simulate(body: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let resp = app().oneshot(post_json("/simulate", body)).await.unwrap();
    let status = resp.status();
    (status, body_json(resp.into_body()).await)
}

// ── GET /health ──────────────────────────────────────────────────────

#[tokio::test]
async fn health_returns_200() {
    let resp = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;
    assert_eq!(json["status"], "OK");
}

// ── /baseline ────────────────────────────────────────────────────────

#[tokio::test]
async fn baseline_get_allocates_all_votes() {
    let resp = app()
        .oneshot(Request::get("/baseline").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;
    let dem = json["dem_ev"].as_u64().unwrap();
    let rep = json["rep_ev"].as_u64().unwrap();
    assert_eq!(dem + rep, 538);
    assert_eq!(json["units"].as_array().unwrap().len(), 56);
    assert!(json["path"]["tipping_point"].is_string());
}

#[tokio::test]
async fn baseline_post_applies_scenario() {
    let resp = app()
        .oneshot(post_json(
            "/baseline",
            serde_json::json!({ "national_rep_shift": 0.2 }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp.into_body()).await;
    assert_eq!(json["winner"], "rep");
}

// ── POST /simulate ───────────────────────────────────────────────────

#[tokio::test]
async fn simulate_returns_forecast() {
    let (status, json) = simulate(serde_json::json!({
        "trials": 500,
        "seed": 7,
        "scenario": {
            "national_dem_shift": 0.01,
            "unit_overrides": { "ME-2": { "kind": "absolute", "value": 0.55 } }
        }
    }))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["trials"], 500);
    assert_eq!(json["seed"], 7);
    let p_dem = json["win_probability_dem"].as_f64().unwrap();
    let p_rep = json["win_probability_rep"].as_f64().unwrap();
    assert!((p_dem + p_rep - 1.0).abs() < 1e-12);
    assert_eq!(json["units"].as_array().unwrap().len(), 56);
    assert_eq!(json["battlegrounds"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn simulate_is_reproducible() {
    let body = serde_json::json!({ "trials": 300, "seed": 99, "correlation": 0.4 });
    let (_, first) = simulate(body.clone()).await;
    let (_, second) = simulate(body).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn simulate_zero_trials_is_400() {
    let (status, json) = simulate(serde_json::json!({ "trials": 0 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_TRIAL_COUNT");
}

#[tokio::test]
async fn simulate_negative_trials_is_400() {
    let (status, json) = simulate(serde_json::json!({ "trials": -5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_TRIAL_COUNT");
}

#[tokio::test]
async fn simulate_fractional_trials_is_400() {
    let (status, json) = simulate(serde_json::json!({ "trials": 1.5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_TRIAL_COUNT");
    assert!(json["error"].as_str().unwrap().contains("1.5"));
}

#[tokio::test]
async fn simulate_integral_float_trials_accepted() {
    let (status, json) = simulate(serde_json::json!({ "trials": 200.0, "seed": 3 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["trials"], 200);
}

#[tokio::test]
async fn simulate_non_numeric_trials_is_400() {
    let (status, json) = simulate(serde_json::json!({ "trials": "many" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn baseline_malformed_body_is_400() {
    let resp = app()
        .oneshot(
            Request::post("/baseline")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp.into_body()).await;
    assert_eq!(json["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn simulate_over_limit_is_400() {
    let (status, json) = simulate(serde_json::json!({ "trials": 1_000_000 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "TRIAL_LIMIT");
}

#[tokio::test]
async fn simulate_bad_correlation_is_400() {
    let (status, json) = simulate(serde_json::json!({ "trials": 10, "correlation": 1.5 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_CORRELATION");
}

#[tokio::test]
async fn simulate_unknown_unit_is_400() {
    let (status, json) = simulate(serde_json::json!({
        "trials": 10,
        "scenario": { "unit_overrides": { "ZZ": { "kind": "shift", "value": 0.01 } } }
    }))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_SCENARIO");
}

#[tokio::test]
async fn simulate_district_of_unsplit_state_is_400() {
    let (status, json) = simulate(serde_json::json!({
        "trials": 10,
        "scenario": { "unit_overrides": { "TX-5": { "kind": "absolute", "value": 0.6 } } }
    }))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "INVALID_SCENARIO");
    assert!(json["error"].as_str().unwrap().contains("non-split state 'TX'"));
}
