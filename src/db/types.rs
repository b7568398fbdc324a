//! Query result types for hr-ask.
//!
//! Defines the structures used to represent query results from the database.

use serde::Serialize;
use std::time::Duration;

/// Represents the rows produced by a successful statement.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    /// Column metadata for the result set, in statement order.
    pub columns: Vec<ColumnInfo>,

    /// Rows of data; each has exactly `columns.len()` values.
    pub rows: Vec<Row>,

    /// Time taken to execute the query.
    #[serde(rename = "execution_ms", serialize_with = "duration_ms::serialize")]
    pub execution_time: Duration,

    /// Number of rows in the result (may be truncated).
    pub row_count: usize,

    /// Total number of rows before truncation.
    pub total_rows: usize,

    /// Whether the result was truncated to the configured row cap.
    pub was_truncated: bool,
}

impl QueryResult {
    /// Creates a new empty query result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query result with the given columns and rows.
    pub fn with_data(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            execution_time: Duration::ZERO,
            row_count,
            total_rows: row_count,
            was_truncated: false,
        }
    }

    /// Sets the execution time.
    pub fn with_execution_time(mut self, duration: Duration) -> Self {
        self.execution_time = duration;
        self
    }

    /// Keeps at most `max_rows` rows, recording the original count.
    pub fn truncated_to(mut self, max_rows: usize) -> Self {
        self.total_rows = self.rows.len();
        if self.rows.len() > max_rows {
            self.rows.truncate(max_rows);
            self.was_truncated = true;
        }
        self.row_count = self.rows.len();
        self
    }

    /// Returns true if the result set is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Returns a truncation warning message if the result was truncated.
    pub fn truncation_warning(&self) -> Option<String> {
        self.was_truncated.then(|| {
            format!(
                "Result truncated: showing {} of {} rows",
                self.row_count, self.total_rows
            )
        })
    }
}

/// Outcome of executing one statement.
///
/// Execution failures are data, not errors: the message travels back to the
/// page and the column list is empty.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// The statement ran; possibly zero rows and zero columns (DDL/DML).
    Rows(QueryResult),
    /// The statement failed.
    Failed {
        /// Engine error message.
        message: String,
    },
}

impl QueryOutcome {
    /// Creates a failed outcome.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    /// Column names; empty on failure.
    pub fn column_names(&self) -> Vec<&str> {
        match self {
            Self::Rows(result) => result.column_names(),
            Self::Failed { .. } => Vec::new(),
        }
    }

    /// The error message, if the statement failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Rows(_) => None,
            Self::Failed { message } => Some(message),
        }
    }

    /// The result set, if the statement succeeded.
    pub fn result(&self) -> Option<&QueryResult> {
        match self {
            Self::Rows(result) => Some(result),
            Self::Failed { .. } => None,
        }
    }
}

/// Metadata about a column in a result set.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column name as reported by the engine (e.g. `AVG(salary)`).
    pub name: String,

    /// Declared type, empty for expressions.
    pub data_type: String,
}

impl ColumnInfo {
    /// Creates a new column info with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// A single SQLite value, by storage class.
///
/// Serializes to the plain JSON value so the page can render it directly.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// INTEGER storage class.
    Int(i64),

    /// REAL storage class.
    Float(f64),

    /// TEXT storage class.
    String(String),

    /// BLOB storage class.
    Bytes(Vec<u8>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

mod duration_ms {
    use serde::{Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }
}
