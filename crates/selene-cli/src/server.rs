//! HTTP surface: `POST /predict` and `GET /health`.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use selene_core::{ForecastError, Forecaster};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub dates: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
    pub confidence: f64,
}

struct ApiError(ForecastError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            ForecastError::InsufficientHistory { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_history")
            }
            ForecastError::MalformedDate { .. } => (StatusCode::BAD_REQUEST, "malformed_date"),
            ForecastError::DateOutOfRange => (StatusCode::BAD_REQUEST, "date_out_of_range"),
        };
        let body = json!({ "error": code, "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

async fn predict(
    State(forecaster): State<Arc<Forecaster>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let forecast = forecaster.predict(&request.dates).map_err(|e| {
        tracing::debug!("rejected /predict with {} dates: {e}", request.dates.len());
        ApiError(e)
    })?;
    Ok(Json(PredictResponse {
        earliest: forecast.earliest(),
        latest: forecast.latest(),
        confidence: forecast.confidence(),
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(forecaster: Arc<Forecaster>) -> Router {
    Router::new()
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(forecaster)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

pub async fn serve(listener: tokio::net::TcpListener, forecaster: Arc<Forecaster>) -> Result<()> {
    axum::serve(listener, router(forecaster))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}
