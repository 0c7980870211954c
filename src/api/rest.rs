// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.
//
//   GET  /api/v1/health          liveness + call counter
//   GET  /api/v1/tools           tool catalogue
//   POST /api/v1/tools/:name     run a tool; body is the argument object
//   GET  /api/v1/config          current tool defaults
//   POST /api/v1/config          partial update of tool defaults
//
// Tool failures map to 400 with `{"error": {"kind", "message"}}`; an unknown
// tool name maps to 404.
//
// CORS is configured permissively for development.
// =============================================================================

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::api::tools::{self, ToolError, TOOLS};
use crate::app_state::AppState;
use crate::error::EngineError;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/tools", get(list_tools))
        .route("/api/v1/tools/:name", post(call_tool))
        .route("/api/v1/config", get(get_config).post(set_config))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error responses
// =============================================================================

#[derive(Serialize)]
struct ErrorEnvelope<T: Serialize> {
    error: T,
}

#[derive(Serialize)]
struct PlainError {
    kind: &'static str,
    message: String,
}

fn error_response(status: StatusCode, kind: &'static str, message: String) -> Response {
    (status, Json(ErrorEnvelope { error: PlainError { kind, message } })).into_response()
}

fn engine_error_response(err: &EngineError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorEnvelope { error: err.to_body() }),
    )
        .into_response()
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    calls_served: u64,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        calls_served: state.calls_served(),
        uptime_secs: state.uptime_secs(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Tools
// =============================================================================

async fn list_tools() -> impl IntoResponse {
    Json(TOOLS)
}

async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    // An empty body is the same as `{}`.
    let args: Value = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                let err = EngineError::InputShape(format!("request body is not valid JSON: {e}"));
                warn!(tool = %name, error = %err, "Tool call rejected");
                return engine_error_response(&err);
            }
        }
    };

    let config = state.config_snapshot();
    match tools::invoke(&name, &args, &config, &state.fee_table) {
        Ok(result) => {
            let served = state.record_call();
            info!(tool = %name, calls_served = served, "Tool call served");
            Json(result).into_response()
        }
        Err(ToolError::UnknownTool(tool)) => {
            warn!(tool = %tool, "Unknown tool requested");
            error_response(
                StatusCode::NOT_FOUND,
                "unknown_tool",
                format!("unknown tool: {tool}"),
            )
        }
        Err(ToolError::Engine(err)) => {
            warn!(tool = %name, kind = err.kind(), error = %err, "Tool call failed");
            engine_error_response(&err)
        }
    }
}

// =============================================================================
// Config
// =============================================================================

async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.config_snapshot())
}

async fn set_config(State(state): State<Arc<AppState>>, Json(patch): Json<Value>) -> Response {
    if !patch.is_object() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_config",
            "config update must be a JSON object".to_string(),
        );
    }

    match state.update_config(&patch) {
        Ok(updated) => Json(updated).into_response(),
        Err(e) => {
            warn!(error = %e, "Config update rejected");
            error_response(StatusCode::BAD_REQUEST, "invalid_config", format!("{e:#}"))
        }
    }
}
