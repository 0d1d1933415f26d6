//! HTTP layer: `POST /chat`, `GET /health`, `GET /stats`.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::errors::AssistantError;
use crate::index::SharedIndex;
use crate::rag::AnswerPipeline;
use crate::telemetry::TelemetrySnapshot;
use crate::types::AnswerPayload;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnswerPipeline>,
    pub index: SharedIndex,
}

impl AppState {
    pub fn new(pipeline: Arc<AnswerPipeline>, index: SharedIndex) -> Self {
        Self { pipeline, index }
    }
}

/// Inbound chat body. A missing `message` is an empty question.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthBody {
    pub status: String,
    pub units: usize,
    pub dimension: Option<usize>,
}

/// Pipeline failure surfaced to the client. Never a 200 with an empty answer.
#[derive(Debug)]
pub struct ApiError(AssistantError);

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.code();
        tracing::error!(code, error = %self.0, "chat request failed");

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message: self.0.to_string(),
            },
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

async fn chat(
    State(state): State<AppState>,
    body: Option<Json<ChatRequest>>,
) -> Result<Json<AnswerPayload>, ApiError> {
    let message = body.map(|Json(request)| request.message).unwrap_or_default();
    let payload = state.pipeline.handle(&message).await?;
    Ok(Json(payload))
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    let index = state.index.read().await;
    Json(HealthBody {
        status: "ok".to_string(),
        units: index.len(),
        dimension: index.dimension(),
    })
}

async fn stats(State(state): State<AppState>) -> Json<TelemetrySnapshot> {
    Json(state.pipeline.telemetry().snapshot())
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(state)
}

/// Bind and serve until the process is interrupted
pub async fn serve(state: AppState, bind: &str) -> crate::errors::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown requested");
        })
        .await?;
    Ok(())
}
