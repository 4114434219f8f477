//! HTTP API server.
//!
//! Exposes the chat pipeline over JSON and serves the resume files.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Liveness message |
//! | `GET`  | `/api/health` | Health check (returns version) |
//! | `POST` | `/api/chat` | Answer one message: `{"message": "..."}` |
//! | `GET`  | `/resumes/*` | Resume files from `server.resumes_dir` |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "message must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400, also for malformed or non-JSON chat
//! bodies), `internal` (500). Internal errors are logged in full and
//! reported to the caller with a generic message only.
//!
//! # CORS
//!
//! Origins listed in `server.allowed_origins` may call the API with
//! credentials; methods and headers are mirrored from the preflight. A `*`
//! entry opens the API to any origin without credentials.

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::assistant::Assistant;
use crate::canon::RESUMES_PREFIX;
use crate::config::Config;
use crate::models::{AnswerResponse, CanonicalFacts};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    assistant: Arc<Assistant>,
}

/// Starts the server with the OpenAI-backed assistant.
///
/// Loads the index and builds the API clients before binding, so a missing
/// credential or index stops the process instead of failing every request.
pub async fn run_server(config: &Config) -> Result<()> {
    let assistant = Assistant::from_config(config)?;
    run_server_with(config, Arc::new(assistant)).await
}

/// Starts the server with a prebuilt assistant.
///
/// Runs until the process is terminated; returns an error if binding fails.
pub async fn run_server_with(config: &Config, assistant: Arc<Assistant>) -> Result<()> {
    let model = assistant.model_name().to_string();
    let app = build_router(config, assistant)?;

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, model = %model, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Assemble the router with CORS and static resume files.
pub fn build_router(config: &Config, assistant: Arc<Assistant>) -> Result<Router> {
    let cors = cors_layer(&config.server.allowed_origins)?;

    let state = AppState {
        config: Arc::new(config.clone()),
        assistant,
    };

    Ok(Router::new()
        .route("/", get(handle_root))
        .route("/api/health", get(handle_health))
        .route("/api/chat", post(handle_chat))
        .nest_service(RESUMES_PREFIX, ServeDir::new(&config.server.resumes_dir))
        .layer(cors)
        .with_state(state))
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    if origins.iter().any(|o| o == "*") {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid allowed origin: {}", o))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`).
    code: String,
    /// Human-readable error message.
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn internal_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

fn rejection_message(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "expected Content-Type: application/json"
        }
        _ => "body must be a JSON object with a string `message` field",
    }
}

// ============ GET / ============

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
}

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "AI Portfolio Agent is live",
    })
}

// ============ GET /api/health ============

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    /// The crate version from `Cargo.toml`.
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ POST /api/chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

/// Answers one chat message.
///
/// Canonical facts are rebuilt from config per request. Pipeline failures
/// become a `500` whose body carries no upstream detail.
async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<AnswerResponse>, AppError> {
    let Json(req) = body.map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "rejected chat body");
        bad_request(rejection_message(&rejection))
    })?;

    if req.message.trim().is_empty() {
        return Err(bad_request("message must not be empty"));
    }

    let canon = CanonicalFacts::from_config(&state.config);

    let response = state
        .assistant
        .answer(&req.message, canon)
        .await
        .map_err(|e| {
            let detail = format!("{:#}", e);
            tracing::error!(error = %detail, "chat request failed");
            internal_error("failed to answer question")
        })?;

    tracing::info!(sources = response.sources.len(), "chat answered");
    Ok(Json(response))
}
