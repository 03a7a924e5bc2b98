//! Axum HTTP server: a thin boundary over the forecasting core.
//!
//! The registry is shared as `Arc<StateModelRegistry>`. Simulations are CPU-bound
//! and run on the blocking pool so the async workers stay responsive.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/baseline` | Shock-free outcome of the unmodified baseline |
//! | POST | `/baseline` | Shock-free outcome of a scenario |
//! | POST | `/simulate` | Monte Carlo forecast for a scenario |

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::error::ForecastError;
use crate::registry::StateModelRegistry;
use crate::scenario::ScenarioAdjustment;
use crate::simulation::{
    baseline_outcome, run_simulation, trial_count_from_json, NationalOutcome, SimulationConfig,
    SimulationResult,
};

pub type AppState = Arc<StateModelRegistry>;

/// Upper bound on trials per request.
pub const MAX_REQUEST_TRIALS: usize = 200_000;

type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn create_router(registry: Arc<StateModelRegistry>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health_check))
        .route("/baseline", get(handle_get_baseline).post(handle_post_baseline))
        .route("/simulate", post(handle_simulate))
        .layer(cors)
        .with_state(registry)
}

// ── Request types ───────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(default)]
struct SimulateRequest {
    scenario: ScenarioAdjustment,
    /// Any JSON number; fractional counts are rejected with `INVALID_TRIAL_COUNT`.
    trials: Option<serde_json::Number>,
    seed: Option<u64>,
    correlation: Option<f64>,
    histogram_bin_width: Option<u32>,
    battleground_count: Option<usize>,
}

impl SimulateRequest {
    fn into_config(self) -> Result<(ScenarioAdjustment, SimulationConfig), ApiError> {
        let mut config = SimulationConfig::default();
        if let Some(raw) = self.trials {
            config.trials = trial_count_from_json(&raw).map_err(forecast_error)?;
        }
        if config.trials > MAX_REQUEST_TRIALS {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "TRIAL_LIMIT",
                &format!("trials must be <= {}", MAX_REQUEST_TRIALS),
            ));
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(correlation) = self.correlation {
            config.correlation = correlation;
        }
        if let Some(width) = self.histogram_bin_width {
            config.histogram_bin_width = width;
        }
        if let Some(count) = self.battleground_count {
            config.battleground_count = count;
        }
        Ok((self.scenario, config))
    }
}

fn error_response(status: StatusCode, code: &str, msg: &str) -> ApiError {
    (status, Json(serde_json::json!({ "error": msg, "code": code })))
}

fn forecast_error(err: ForecastError) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, err.code(), &err.to_string())
}

/// Malformed bodies get the same 400 `{error, code}` shape as validation errors.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| {
            error_response(StatusCode::BAD_REQUEST, "INVALID_REQUEST", &rejection.body_text())
        })
}

// ── Handlers ────────────────────────────────────────────────────────

async fn handle_health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

async fn handle_get_baseline(
    State(registry): State<AppState>,
) -> Result<Json<NationalOutcome>, ApiError> {
    baseline_outcome(&registry, &ScenarioAdjustment::default())
        .map(Json)
        .map_err(forecast_error)
}

async fn handle_post_baseline(
    State(registry): State<AppState>,
    body: Result<Json<ScenarioAdjustment>, JsonRejection>,
) -> Result<Json<NationalOutcome>, ApiError> {
    let scenario = json_body(body)?;
    baseline_outcome(&registry, &scenario)
        .map(Json)
        .map_err(forecast_error)
}

async fn handle_simulate(
    State(registry): State<AppState>,
    body: Result<Json<SimulateRequest>, JsonRejection>,
) -> Result<Json<SimulationResult>, ApiError> {
    let (scenario, config) = json_body(body)?.into_config()?;
    let result =
        tokio::task::spawn_blocking(move || run_simulation(&registry, &scenario, &config))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "simulation task failed");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "simulation task failed",
                )
            })?;
    result.map(Json).map_err(forecast_error)
}
