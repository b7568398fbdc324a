//! SQLite database access.
//!
//! Every operation opens its own connection and closes it before returning.
//! There is no pool: the process serves one user and the file is the only
//! shared state.

use crate::db::{Column, ColumnInfo, QueryOutcome, QueryResult, Row, Schema, Table, Value};
use crate::error::{AppError, Result};
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{
    Column as SqlxColumn, ConnectOptions, Connection, Executor, Row as SqlxRow, Sqlite,
    Statement, TypeInfo, ValueRef,
};
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long a statement waits on a locked database file.
const BUSY_TIMEOUT_SECS: u64 = 5;

/// Default maximum rows to return from a query.
const DEFAULT_MAX_ROWS: usize = 1000;

/// Reported when a query string holds more than one statement.
const MULTIPLE_STATEMENTS_MESSAGE: &str = "You can only execute one statement at a time.";

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Handle to a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    path: PathBuf,
    max_rows: usize,
}

impl SqliteDatabase {
    /// Creates a handle for the database at `path`. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }

    /// Sets the row cap applied to query results.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))
            .connect()
            .await
            .map_err(|e| {
                AppError::database(format!(
                    "Failed to open database {}: {e}",
                    self.path.display()
                ))
            })
    }

    /// Introspects user tables and their columns, tables ordered by name.
    ///
    /// Connection failures are returned as errors, never as an empty schema.
    pub async fn read_schema(&self) -> Result<Schema> {
        let mut conn = self.connect().await?;
        let result = fetch_schema(&mut conn).await;
        close(conn).await;
        result
    }

    /// Executes one statement and collects its rows.
    ///
    /// Failures of any kind, including opening the file, come back as
    /// [`QueryOutcome::Failed`]. SQL holding a second statement is refused
    /// before anything runs.
    pub async fn execute_query(&self, sql: &str) -> QueryOutcome {
        let start = Instant::now();

        if has_trailing_statement(sql) {
            warn!("Query not executed: more than one statement");
            return QueryOutcome::failed(MULTIPLE_STATEMENTS_MESSAGE);
        }

        let mut conn = match self.connect().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Query not executed: {e}");
                return QueryOutcome::failed(e.to_string());
            }
        };

        let result = run_statement(&mut conn, sql).await;
        close(conn).await;

        match result {
            Ok(result) => {
                let result = result
                    .with_execution_time(start.elapsed())
                    .truncated_to(self.max_rows);
                if let Some(warning) = result.truncation_warning() {
                    warn!("{warning}");
                }
                debug!(
                    "Query returned {} rows in {:?}",
                    result.total_rows, result.execution_time
                );
                QueryOutcome::Rows(result)
            }
            Err(message) => {
                warn!("Query failed: {message}");
                QueryOutcome::failed(message)
            }
        }
    }

    /// Executes a multi-statement script. Returns rows affected.
    ///
    /// Statements before a failing one stay applied.
    pub async fn execute_script(&self, script: &str) -> Result<u64> {
        let mut conn = self.connect().await?;
        let result = (&mut conn).execute(script).await;
        close(conn).await;

        let done = result.map_err(|e| AppError::ingest(format_query_error(e)))?;
        Ok(done.rows_affected())
    }

    /// Drops and recreates `table` with `rows`, all inside one transaction.
    ///
    /// On failure the previous table is left untouched.
    pub async fn replace_table(&self, table: &Table, rows: &[Row]) -> Result<u64> {
        let mut conn = self.connect().await?;
        let result = write_table(&mut conn, table, rows).await;
        close(conn).await;

        let inserted = result.map_err(|e| AppError::ingest(format_query_error(e)))?;
        info!("Replaced table '{}' with {} rows", table.name, inserted);
        Ok(inserted)
    }
}

async fn close(conn: SqliteConnection) {
    if let Err(e) = conn.close().await {
        warn!("Failed to close database connection: {e}");
    }
}

async fn fetch_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    let table_names: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
        ORDER BY name
        "#,
    )
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to fetch tables: {e}")))?;

    let mut tables = Vec::with_capacity(table_names.len());

    for name in table_names {
        let columns = fetch_columns(conn, &name).await?;
        tables.push(Table { name, columns });
    }

    Ok(Schema { tables })
}

async fn fetch_columns(conn: &mut SqliteConnection, table_name: &str) -> Result<Vec<Column>> {
    let rows: Vec<(String, String, i64, i64)> = sqlx::query_as(
        r#"
        SELECT name, type, "notnull", pk
        FROM pragma_table_info(?1)
        ORDER BY cid
        "#,
    )
    .bind(table_name)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| AppError::database(format!("Failed to fetch columns for {table_name}: {e}")))?;

    Ok(rows
        .into_iter()
        .map(|(name, data_type, not_null, pk)| Column {
            name,
            data_type,
            is_nullable: not_null == 0,
            is_primary_key: pk > 0,
        })
        .collect())
}

async fn run_statement(
    conn: &mut SqliteConnection,
    sql: &str,
) -> std::result::Result<QueryResult, String> {
    // Preparing first gives column names even when no rows come back.
    let statement = (&mut *conn).prepare(sql).await.map_err(format_query_error)?;

    let columns: Vec<ColumnInfo> = statement
        .columns()
        .iter()
        .map(|col| {
            let type_info = col.type_info();
            let data_type = if type_info.is_null() { "" } else { type_info.name() };
            ColumnInfo::new(col.name(), data_type)
        })
        .collect();

    let rows = statement
        .query()
        .fetch_all(&mut *conn)
        .await
        .map_err(format_query_error)?;

    Ok(QueryResult::with_data(
        columns,
        rows.iter().map(convert_row).collect(),
    ))
}

/// True when anything but blanks, semicolons or comments follows the first
/// top-level `;`. Quoted text and comments are skipped.
fn has_trailing_statement(sql: &str) -> bool {
    let mut chars = sql.chars().peekable();
    let mut ended = false;

    while let Some(c) = chars.next() {
        match (c, chars.peek().copied()) {
            ('-', Some('-')) => skip_through(&mut chars, '\n'),
            ('/', Some('*')) => {
                chars.next();
                skip_block_comment(&mut chars);
            }
            (';', _) => ended = true,
            (c, _) if c.is_whitespace() => {}
            _ if ended => return true,
            ('\'' | '"' | '`', _) => skip_through(&mut chars, c),
            ('[', _) => skip_through(&mut chars, ']'),
            _ => {}
        }
    }

    false
}

fn skip_through(chars: &mut Peekable<Chars<'_>>, end: char) {
    for c in chars.by_ref() {
        if c == end {
            break;
        }
    }
}

fn skip_block_comment(chars: &mut Peekable<Chars<'_>>) {
    let mut prev = '\0';
    for c in chars.by_ref() {
        if prev == '*' && c == '/' {
            break;
        }
        prev = c;
    }
}

async fn write_table(
    conn: &mut SqliteConnection,
    table: &Table,
    rows: &[Row],
) -> std::result::Result<u64, sqlx::Error> {
    let name = quote_identifier(&table.name);
    let column_defs = table
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_identifier(&c.name), c.data_type))
        .collect::<Vec<_>>()
        .join(", ");
    let column_list = table
        .columns
        .iter()
        .map(|c| quote_identifier(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; table.columns.len()].join(", ");

    let drop_sql = format!("DROP TABLE IF EXISTS {name}");
    let create_sql = format!("CREATE TABLE {name} ({column_defs})");
    let insert_sql = format!("INSERT INTO {name} ({column_list}) VALUES ({placeholders})");

    let mut tx = conn.begin().await?;

    sqlx::query(&drop_sql).execute(&mut *tx).await?;
    sqlx::query(&create_sql).execute(&mut *tx).await?;

    let mut inserted = 0;
    for row in rows {
        let query = row
            .iter()
            .fold(sqlx::query(&insert_sql), |query, value| bind_value(query, value));
        inserted += query.execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: &'q Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::String(s) => query.bind(s.as_str()),
        Value::Bytes(b) => query.bind(b.as_slice()),
    }
}

/// Quotes an identifier for SQLite, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Returns the engine's own message for database errors.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}

/// Converts a sqlx SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    (0..row.len()).map(|i| convert_value(row, i)).collect()
}

/// Converts a single value by its runtime storage class.
fn convert_value(row: &SqliteRow, index: usize) -> Value {
    let storage_class = match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(raw) => raw.type_info().name().to_uppercase(),
        Err(_) => return Value::Null,
    };

    match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => row
            .try_get::<i64, _>(index)
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" | "NUMERIC" => row
            .try_get::<f64, _>(index)
            .map(Value::Float)
            .unwrap_or(Value::Null),

        "BLOB" => row
            .try_get::<Vec<u8>, _>(index)
            .map(Value::Bytes)
            .unwrap_or(Value::Null),

        _ => row
            .try_get::<String, _>(index)
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
