//! Database layer for hr-ask.
//!
//! A single SQLite file holds everything the user can query. This module
//! reads its schema, executes generated statements against it, and writes
//! uploaded data into it.

mod schema;
mod sqlite;
mod types;

pub use schema::{Column, Schema, Table};
pub use sqlite::{quote_identifier, SqliteDatabase};
pub use types::{ColumnInfo, QueryOutcome, QueryResult, Row, Value};
