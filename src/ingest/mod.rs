//! Upload handling.
//!
//! Uploaded files are saved verbatim under the uploads directory, then
//! loaded: a CSV replaces the `employees` table, a `.sql` file runs as a
//! script against the database.

mod csv;

pub use self::csv::{parse_csv, ColumnType, CsvTable};

use crate::db::{ColumnInfo, QueryResult, SqliteDatabase, Table};
use crate::error::{AppError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Table every CSV upload replaces.
pub const EMPLOYEES_TABLE: &str = "employees";

/// Default number of rows shown in a CSV preview.
const DEFAULT_PREVIEW_ROWS: usize = 1000;

/// Kind of upload, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Csv,
    Sql,
}

impl UploadKind {
    /// Classifies a file name. Extensions compare case-insensitively.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("sql") => Ok(Self::Sql),
            _ => Err(AppError::unsupported_upload(format!(
                "Unsupported file type: {file_name}. Upload a .csv or .sql file."
            ))),
        }
    }
}

/// What loading an upload did.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestReport {
    /// A CSV replaced the employees table.
    Csv {
        table: String,
        rows_loaded: u64,
        preview: QueryResult,
    },
    /// A SQL script ran.
    Script { rows_affected: u64 },
}

/// A saved and loaded upload.
#[derive(Debug, Clone, Serialize)]
pub struct Upload {
    pub file_name: String,
    pub saved_to: PathBuf,
    pub report: IngestReport,
}

/// Writes `bytes` to `dir/<base name of file_name>`, creating `dir` if
/// needed and overwriting any previous file of that name.
pub async fn save_upload(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    let base_name = Path::new(file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| AppError::validation(format!("Invalid upload file name: {file_name:?}")))?;

    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        AppError::io(format!(
            "Failed to create uploads directory {}: {e}",
            dir.display()
        ))
    })?;

    let path = dir.join(base_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| AppError::io(format!("Failed to save {}: {e}", path.display())))?;

    info!("Saved upload {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Saves uploads and loads them into the database.
#[derive(Debug, Clone)]
pub struct Ingestor {
    db: SqliteDatabase,
    uploads_dir: PathBuf,
    preview_rows: usize,
}

impl Ingestor {
    pub fn new(db: SqliteDatabase, uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            uploads_dir: uploads_dir.into(),
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }

    /// Caps the rows included in a CSV preview.
    pub fn with_preview_rows(mut self, preview_rows: usize) -> Self {
        self.preview_rows = preview_rows;
        self
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Saves and loads one upload.
    ///
    /// Unsupported types are rejected before anything is written. A load
    /// failure is an [`AppError::Ingest`]; the saved file stays on disk.
    pub async fn ingest(&self, file_name: &str, bytes: &[u8]) -> Result<Upload> {
        let kind = UploadKind::from_file_name(file_name)?;
        let saved_to = save_upload(&self.uploads_dir, file_name, bytes).await?;

        let report = match kind {
            UploadKind::Csv => self.load_csv(&saved_to).await,
            UploadKind::Sql => self.run_script(&saved_to).await,
        }
        .map_err(|e| {
            warn!("Failed to load {}: {e}", saved_to.display());
            e
        })?;

        Ok(Upload {
            file_name: file_name.to_string(),
            saved_to,
            report,
        })
    }

    async fn load_csv(&self, path: &Path) -> Result<IngestReport> {
        let bytes = read_saved(path).await?;
        let parsed = parse_csv(&bytes)?;

        let table = Table {
            name: EMPLOYEES_TABLE.to_string(),
            columns: parsed.columns,
        };
        let rows_loaded = self.db.replace_table(&table, &parsed.rows).await?;

        let columns = table
            .columns
            .iter()
            .map(|c| ColumnInfo::new(&c.name, &c.data_type))
            .collect();
        let preview = QueryResult::with_data(columns, parsed.rows).truncated_to(self.preview_rows);

        Ok(IngestReport::Csv {
            table: table.name,
            rows_loaded,
            preview,
        })
    }

    async fn run_script(&self, path: &Path) -> Result<IngestReport> {
        let bytes = read_saved(path).await?;
        let script = String::from_utf8(bytes)
            .map_err(|_| AppError::ingest("SQL file is not valid UTF-8 text"))?;

        let rows_affected = self.db.execute_script(&script).await?;
        info!("Executed script {} ({rows_affected} rows affected)", path.display());

        Ok(IngestReport::Script { rows_affected })
    }
}

async fn read_saved(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| AppError::ingest(format!("Failed to read {}: {e}", path.display())))
}
