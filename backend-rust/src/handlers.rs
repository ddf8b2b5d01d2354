//! handlers.rs — Simulation API surface
//!
//! Thin axum handlers over the registry. Error kinds map onto HTTP status
//! codes: bad configuration → 400, unknown id or snapshot hour → 404,
//! results requested before completion → 409.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tracing::warn;

use drift_types::{SimulationConfig, SimulationResults, SimulationStatus, StatusReport};

use crate::coordinator::SimulationRegistry;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("simulation not found")]
    NotFound,
    #[error("no snapshot at that hour")]
    SnapshotNotFound,
    #[error("results not ready — simulation is {0:?}")]
    NotReady(SimulationStatus),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound | ApiError::SnapshotNotFound => StatusCode::NOT_FOUND,
            ApiError::NotReady(_) => StatusCode::CONFLICT,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn router(registry: SimulationRegistry) -> Router {
    Router::new()
        .route("/simulations", post(start_simulation).get(list_simulations))
        .route("/simulations/:id/status", get(simulation_status))
        .route("/simulations/:id/results", get(simulation_results))
        .route("/simulations/:id/snapshot/:hour", get(simulation_snapshot))
        .route("/simulations/:id/stop", post(stop_simulation))
        .route("/simulations/:id", delete(delete_simulation))
        .with_state(registry)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn start_simulation(
    State(registry): State<SimulationRegistry>,
    Json(config): Json<SimulationConfig>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = registry.start(config).await.map_err(|e| {
        warn!("rejected simulation config: {e}");
        ApiError::BadRequest(e.to_string())
    })?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "simulationId": receipt.simulation_id,
            "status": "started",
            "estimatedDuration": receipt.estimated_duration_s,
        })),
    ))
}

async fn list_simulations(
    State(registry): State<SimulationRegistry>,
) -> Json<Vec<StatusReport>> {
    Json(registry.list().await)
}

async fn simulation_status(
    State(registry): State<SimulationRegistry>,
    Path(id): Path<String>,
) -> Result<Json<StatusReport>, ApiError> {
    registry.status(&id).await.map(Json).ok_or(ApiError::NotFound)
}

async fn simulation_results(
    State(registry): State<SimulationRegistry>,
    Path(id): Path<String>,
) -> Result<Json<SimulationResults>, ApiError> {
    let run = registry.get(&id).await.ok_or(ApiError::NotFound)?;
    let guard = run.read().await;
    match &guard.results {
        Some(results) => Ok(Json(results.clone())),
        None => Err(ApiError::NotReady(guard.status)),
    }
}

async fn simulation_snapshot(
    State(registry): State<SimulationRegistry>,
    Path((id, hour)): Path<(String, u32)>,
) -> Result<impl IntoResponse, ApiError> {
    let run = registry.get(&id).await.ok_or(ApiError::NotFound)?;
    let guard = run.read().await;
    guard
        .snapshot_at_hour(hour)
        .map(|s| Json(s.clone()))
        .ok_or(ApiError::SnapshotNotFound)
}

async fn stop_simulation(
    State(registry): State<SimulationRegistry>,
    Path(id): Path<String>,
) -> Result<Json<StatusReport>, ApiError> {
    registry.stop(&id).await.map(Json).ok_or(ApiError::NotFound)
}

async fn delete_simulation(
    State(registry): State<SimulationRegistry>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if registry.delete(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    fn start_body(particles: usize, hours: f64) -> Body {
        Body::from(
            json!({
                "lkp": { "lat": 29.3, "lng": -94.8 },
                "particleCount": particles,
                "durationHours": hours,
                "timeStepSeconds": 600.0,
            })
            .to_string(),
        )
    }

    fn post(uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unknown_simulation_is_404() {
        let app = router(SimulationRegistry::new());
        let response = app.oneshot(get_req("/simulations/nope/status")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_lkp_is_400() {
        let app = router(SimulationRegistry::new());
        let body = Body::from(json!({ "lkp": { "lat": 99.0, "lng": 0.0 } }).to_string());
        let response = app.oneshot(post("/simulations", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn results_before_completion_are_409() {
        let registry = SimulationRegistry::new();
        let app = router(registry);

        let response = app
            .clone()
            .oneshot(post("/simulations", start_body(2_000, 72.0)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = json_body(response).await;
        let id = body["simulationId"].as_str().unwrap().to_string();
        assert_eq!(body["status"], "started");

        let response = app
            .oneshot(get_req(&format!("/simulations/{id}/results")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn snapshots_resolve_by_hour_once_complete() {
        let registry = SimulationRegistry::new();
        let app = router(registry.clone());

        let response = app
            .clone()
            .oneshot(post("/simulations", start_body(200, 2.0)))
            .await
            .unwrap();
        let id = json_body(response).await["simulationId"]
            .as_str()
            .unwrap()
            .to_string();

        for _ in 0..600_000 {
            let report = registry.status(&id).await.unwrap();
            if report.status != drift_types::SimulationStatus::Running {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        let ok = app
            .clone()
            .oneshot(get_req(&format!("/simulations/{id}/snapshot/1")))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        let snap = json_body(ok).await;
        assert_eq!(snap["hour"], 1);
        assert_eq!(snap["timeSeconds"], 3600);

        let missing = app
            .clone()
            .oneshot(get_req(&format!("/simulations/{id}/snapshot/99")))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let results = app
            .oneshot(get_req(&format!("/simulations/{id}/results")))
            .await
            .unwrap();
        assert_eq!(results.status(), StatusCode::OK);
    }
}
