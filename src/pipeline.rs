//! Question answering: schema, then generated SQL, then execution.

use crate::db::{QueryOutcome, SqliteDatabase};
use crate::error::{AppError, Result};
use crate::llm::SqlGenerator;
use crate::safety::ReadOnlyGuard;
use serde::Serialize;
use tracing::{info, warn};

/// Shown when there is nothing to ask about yet.
pub const NO_SCHEMA_MESSAGE: &str = "No tables found in the database. Upload a CSV first.";

/// Result of one question.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AskOutcome {
    /// The database has no tables; nothing was generated or executed.
    NoSchema { message: String },
    /// The completion API call failed.
    GenerationFailed { message: String },
    /// SQL was generated and run. Execution failures live in `outcome`.
    Executed { sql: String, outcome: QueryOutcome },
}

impl AskOutcome {
    /// Generated SQL, if any.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Executed { sql, .. } => Some(sql),
            _ => None,
        }
    }

    /// Query outcome, if SQL was executed.
    pub fn outcome(&self) -> Option<&QueryOutcome> {
        match self {
            Self::Executed { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}

/// Answers natural-language questions against one database.
pub struct Assistant {
    db: SqliteDatabase,
    generator: Box<dyn SqlGenerator>,
    guard: Option<ReadOnlyGuard>,
}

impl Assistant {
    pub fn new(db: SqliteDatabase, generator: Box<dyn SqlGenerator>) -> Self {
        Self {
            db,
            generator,
            guard: None,
        }
    }

    /// Rejects generated SQL that writes.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.guard = read_only.then(ReadOnlyGuard::new);
        self
    }

    pub fn database(&self) -> &SqliteDatabase {
        &self.db
    }

    /// Runs one question through the pipeline.
    ///
    /// Only a blank question or an unreadable database is an error; every
    /// other failure is reported in the returned outcome.
    pub async fn ask(&self, question: &str) -> Result<AskOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::validation("Question must not be empty"));
        }

        let schema = self.db.read_schema().await?;
        let descriptor = schema.describe();
        if descriptor.is_empty() {
            warn!("Question asked before any table exists");
            return Ok(AskOutcome::NoSchema {
                message: NO_SCHEMA_MESSAGE.to_string(),
            });
        }

        let sql = match self.generator.generate(question, &descriptor).await {
            Ok(sql) => sql,
            Err(e) => {
                warn!("SQL generation failed: {e}");
                return Ok(AskOutcome::GenerationFailed {
                    message: e.to_string(),
                });
            }
        };
        info!("Generated SQL: {sql}");

        if let Some(guard) = &self.guard {
            if let Err(e) = guard.check(&sql) {
                warn!("{e}");
                return Ok(AskOutcome::Executed {
                    sql,
                    outcome: QueryOutcome::failed(e.to_string()),
                });
            }
        }

        let outcome = self.db.execute_query(&sql).await;
        Ok(AskOutcome::Executed { sql, outcome })
    }
}
