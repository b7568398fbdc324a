//! HTTP front end: one page plus a small JSON API.
//!
//! Routes:
//! - `GET /` the page
//! - `POST /api/ask` `{"question": ...}` → ask outcome
//! - `POST /api/upload` multipart field `file` → saved upload and load report
//! - `GET /api/schema` → descriptor and tables
//! - `GET /health`

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{AskRequest, HealthResponse, SchemaResponse};

use std::future::Future;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{AppError, Result};
use crate::ingest::Ingestor;
use crate::pipeline::Assistant;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
    pub ingestor: Arc<Ingestor>,
    /// Held for the length of each request that touches the database, so
    /// one question or upload finishes before the next starts.
    pub interaction: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(assistant: Assistant, ingestor: Ingestor) -> Self {
        Self {
            assistant: Arc::new(assistant),
            ingestor: Arc::new(ingestor),
            interaction: Arc::new(Mutex::new(())),
        }
    }
}

/// Builds the application router. Uploads larger than
/// `upload_limit_bytes` are refused.
pub fn router(state: AppState, upload_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/ask", post(handlers::ask))
        .route(
            "/api/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(upload_limit_bytes)),
        )
        .route("/api/schema", get(handlers::schema))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr = listener
        .local_addr()
        .map_err(|e| AppError::io(format!("Failed to read listener address: {e}")))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::io(format!("Server error: {e}")))
}
