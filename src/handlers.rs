//! HTTP route handlers.

use crate::error::ServerError;
use crate::pipeline::{QueryRequest, QueryResponse};
use crate::server::GenaiSqlServer;
use crate::telemetry::RequestContext;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tracing::{info, warn, Instrument};

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match &self {
            ServerError::PolicyViolation { detail, .. } => detail.clone(),
            _ => None,
        };
        let body = Json(ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
            detail,
        });
        (status, body).into_response()
    }
}

/// Build the API router.
pub fn router(server: GenaiSqlServer) -> Router {
    Router::new()
        .route("/api/query", post(query_handler))
        .route("/health", get(health_handler))
        .with_state(server)
}

/// `POST /api/query` -- answer a natural-language question.
async fn query_handler(
    State(server): State<GenaiSqlServer>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ServerError> {
    let Json(request) = payload.map_err(|e| ServerError::invalid_input(e.body_text()))?;

    let ctx = RequestContext::new().with_operation("query");
    let span = ctx.span();

    async move {
        match server.pipeline().answer(&request.question).await {
            Ok(response) => {
                info!(
                    rows = response.rows.len(),
                    elapsed_ms = ctx.elapsed().as_millis() as u64,
                    "Question answered"
                );
                Ok(Json(response))
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Question failed");
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// `GET /health` -- liveness check.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
