//! CSV parsing with dataframe-style header cleanup and type inference.

use std::collections::HashMap;

use crate::db::{Column, Row, Value};
use crate::error::{AppError, Result};

/// Cell texts treated as missing values.
const NA_VALUES: &[&str] = &[
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "<NA>",
];

/// SQLite column type inferred for a CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    /// SQLite type name used in `CREATE TABLE`.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Real => "REAL",
            Self::Text => "TEXT",
        }
    }

    /// Infers the narrowest type covering every cell.
    ///
    /// A missing value forces integers to REAL; a column of nothing but
    /// missing values is REAL too.
    fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
        let mut saw_missing = false;
        let mut all_int = true;
        let mut all_real = true;

        for cell in cells {
            if is_missing(cell) {
                saw_missing = true;
                continue;
            }
            let trimmed = cell.trim();
            if trimmed.parse::<i64>().is_err() {
                all_int = false;
                if trimmed.parse::<f64>().is_err() {
                    all_real = false;
                    break;
                }
            }
        }

        match (all_int, all_real, saw_missing) {
            (true, _, false) => Self::Integer,
            (_, true, _) => Self::Real,
            _ => Self::Text,
        }
    }

    fn convert(&self, cell: &str) -> Value {
        if is_missing(cell) {
            return Value::Null;
        }
        match self {
            Self::Integer => cell.trim().parse().map(Value::Int).unwrap_or(Value::Null),
            Self::Real => cell.trim().parse().map(Value::Float).unwrap_or(Value::Null),
            Self::Text => Value::String(cell.to_string()),
        }
    }
}

/// A parsed CSV file, ready to be written as a table.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    /// Columns with inferred SQLite types.
    pub columns: Vec<Column>,
    /// Rows converted to typed values.
    pub rows: Vec<Row>,
}

fn is_missing(cell: &str) -> bool {
    NA_VALUES.contains(&cell.trim())
}

/// Parses CSV bytes. The first record is the header; every record must have
/// the header's width.
pub fn parse_csv(bytes: &[u8]) -> Result<CsvTable> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::ingest(format!("Failed to read CSV header: {e}")))?
        .clone();

    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Err(AppError::ingest("No columns to parse from file"));
    }

    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| AppError::ingest(format!("Failed to parse CSV: {e}")))?;

    let names = normalize_headers(headers.iter());
    let types: Vec<ColumnType> = (0..names.len())
        .map(|i| ColumnType::infer(records.iter().map(|r| r.get(i).unwrap_or(""))))
        .collect();

    let columns = names
        .into_iter()
        .zip(&types)
        .map(|(name, column_type)| Column::new(name, column_type.as_sql()))
        .collect();

    let rows = records
        .iter()
        .map(|record| {
            types
                .iter()
                .enumerate()
                .map(|(i, column_type)| column_type.convert(record.get(i).unwrap_or("")))
                .collect()
        })
        .collect();

    Ok(CsvTable { columns, rows })
}

/// Blank headers become `Unnamed: <index>`; repeats get `.1`, `.2`, ...
fn normalize_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut names = Vec::new();

    for (index, header) in headers.enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {index}")
        } else {
            header.to_string()
        };

        let mut name = base.clone();
        while let Some(count) = seen.get_mut(&name) {
            *count += 1;
            name = format!("{base}.{count}");
        }
        seen.insert(name.clone(), 0);
        names.push(name);
    }

    names
}
