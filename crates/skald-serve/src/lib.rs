use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::OnceCell;
use tower_http::cors::CorsLayer;
use ulid::Ulid;

use skald_core::{now_rfc3339, StoredDocument, UploadPayload};
use skald_store::{InsertReceipt, StorageBackend, StoreConfig};

/// Setup budget for the first (cold) backend connection of a process.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ── Config ──

pub struct ServeConfig {
    pub bind: String,
    pub port: u16,
}

// ── App State ──

/// Produces the backend handle on first use. Injectable so tests can count
/// establishment calls; production wires [`StoreConfig::open`].
pub type BackendOpener = Box<dyn Fn() -> anyhow::Result<Box<dyn StorageBackend>> + Send + Sync>;

struct AppState {
    shared_secret: Option<String>,
    opener: BackendOpener,
    // Process-lifetime connection cache. Lazy, single-flight: concurrent
    // cold requests wait on one initialization instead of opening twice.
    // Never torn down; the handle lives as long as the warm process.
    backend: OnceCell<Arc<dyn StorageBackend>>,
}

impl AppState {
    async fn backend(self: &Arc<Self>) -> Result<Arc<dyn StorageBackend>, ApiError> {
        self.backend
            .get_or_try_init(|| async {
                let state = Arc::clone(self);
                let opened =
                    tokio::time::timeout(CONNECT_TIMEOUT, tokio::task::spawn_blocking(move || (state.opener)()))
                        .await
                        .map_err(|_| {
                            ApiError::Internal("storage connection timed out".to_string())
                        })?
                        .map_err(|e| ApiError::Internal(format!("connection task failed: {e}")))?
                        .map_err(|e| ApiError::Internal(e.to_string()))?;
                Ok(Arc::from(opened))
            })
            .await
            .cloned()
    }
}

// ── Error Handling ──

enum ApiError {
    BadRequest(&'static str),
    Unauthorized,
    MethodNotAllowed,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": "Unauthorized" }),
            ),
            ApiError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                serde_json::json!({ "error": "Method not allowed" }),
            ),
            // Diagnostic message only, never a stack trace.
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "Internal server error", "message": message }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ── Client address ──

/// Best-effort client network address: first `x-forwarded-for` entry,
/// falling back to the socket address, falling back to `"unknown"`.
/// Never trusted from the payload itself.
struct ClientIp(String);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let ip = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ci| ci.0.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());
        Ok(Self(ip))
    }
}

// ── Entrypoint ──

/// Bind and serve. Storage configuration stays lazy: a misconfigured
/// backend surfaces as a 500 on first ingest, not a failed boot.
pub async fn serve(config: ServeConfig) -> anyhow::Result<()> {
    let shared_secret = std::env::var("SKALD_SHARED_SECRET")
        .ok()
        .filter(|s| !s.is_empty());
    let app = router_with_opener(
        shared_secret,
        Box::new(|| StoreConfig::from_env()?.open()),
    );

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "skald ingestion endpoint listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Build the router for a concrete store configuration.
pub fn router(shared_secret: Option<String>, store: StoreConfig) -> Router {
    router_with_opener(shared_secret, Box::new(move || store.open()))
}

/// Build the router with an injected backend opener (for testing the
/// connection cache without a real store).
pub fn router_with_opener(shared_secret: Option<String>, opener: BackendOpener) -> Router {
    let state = Arc::new(AppState {
        shared_secret,
        opener,
        backend: OnceCell::new(),
    });
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/transcripts",
            post(ingest).fallback(method_not_allowed),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Health ──

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

// ── POST /api/transcripts ──

async fn ingest(
    State(state): State<Arc<AppState>>,
    ClientIp(client_ip): ClientIp,
    headers: HeaderMap,
    Json(payload): Json<UploadPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request_id = Ulid::new().to_string();
    let started = Instant::now();

    if let Some(secret) = &state.shared_secret {
        let presented = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        if presented != Some(secret.as_str()) {
            tracing::warn!(%request_id, %client_ip, "rejected: shared secret mismatch");
            return Err(ApiError::Unauthorized);
        }
    }

    if payload.session_id.is_empty() {
        tracing::warn!(%request_id, %client_ip, "rejected: missing session_id");
        return Err(ApiError::BadRequest("Missing session_id"));
    }

    tracing::info!(
        %request_id,
        session_id = %payload.session_id,
        entries = payload.transcript.len(),
        %client_ip,
        "ingest accepted"
    );

    let connect_start = Instant::now();
    let backend = state.backend().await.map_err(|e| {
        if let ApiError::Internal(msg) = &e {
            tracing::error!(%request_id, error = %msg, "backend unavailable");
        }
        e
    })?;
    tracing::debug!(
        %request_id,
        backend = backend.name(),
        elapsed_ms = connect_start.elapsed().as_millis() as u64,
        "backend ready"
    );

    let doc = StoredDocument::new(payload, now_rfc3339(), client_ip);
    let insert_start = Instant::now();
    let receipt = {
        let backend = Arc::clone(&backend);
        tokio::task::spawn_blocking(move || backend.insert(&doc))
            .await
            .map_err(|e| ApiError::Internal(format!("insert task failed: {e}")))?
            .map_err(|e| {
                tracing::error!(%request_id, error = %e, "insert failed");
                ApiError::Internal(e.to_string())
            })?
    };

    tracing::info!(
        %request_id,
        identifier = receipt.identifier(),
        insert_ms = insert_start.elapsed().as_millis() as u64,
        total_ms = started.elapsed().as_millis() as u64,
        "stored"
    );

    let body = match receipt {
        InsertReceipt::Record { id } => serde_json::json!({ "success": true, "id": id }),
        InsertReceipt::Object { key } => serde_json::json!({ "success": true, "key": key }),
    };
    Ok(Json(body))
}

// ── Tests ──
