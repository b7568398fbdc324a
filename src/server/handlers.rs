//! Route handlers.

use axum::extract::{Multipart, State};
use axum::response::{Html, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::Table;
use crate::error::AppError;
use crate::ingest::Upload;
use crate::pipeline::AskOutcome;

use super::error::ApiError;
use super::AppState;

const INDEX_HTML: &str = include_str!("assets/index.html");

/// Form field carrying the uploaded file.
const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct SchemaResponse {
    /// The line handed to the SQL generator; empty without tables.
    pub descriptor: String,
    pub tables: Vec<Table>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskOutcome>, ApiError> {
    let _turn = state.interaction.lock().await;
    info!("Question: {}", request.question.trim());

    let outcome = state.assistant.ask(&request.question).await?;
    Ok(Json(outcome))
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Upload>, ApiError> {
    let (file_name, bytes) = read_file_field(multipart).await?;

    let _turn = state.interaction.lock().await;
    let upload = state.ingestor.ingest(&file_name, &bytes).await?;
    Ok(Json(upload))
}

pub async fn schema(State(state): State<AppState>) -> Result<Json<SchemaResponse>, ApiError> {
    let _turn = state.interaction.lock().await;
    let schema = state.assistant.database().read_schema().await?;

    Ok(Json(SchemaResponse {
        descriptor: schema.describe(),
        tables: schema.tables,
    }))
}

/// Pulls the file name and contents of the `file` field; other fields are
/// ignored.
async fn read_file_field(mut multipart: Multipart) -> Result<(String, Vec<u8>), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        let message = e.to_string();
        if message.to_lowercase().contains("limit") {
            AppError::validation(format!("Upload too large: {message}"))
        } else {
            AppError::validation(format!("Failed to read multipart field: {message}"))
        }
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::validation("No file name provided"))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read file data: {e}")))?;

        return Ok((file_name, bytes.to_vec()));
    }

    Err(AppError::validation("No file provided in upload"))
}
