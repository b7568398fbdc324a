//! Database schema types for hr-ask.
//!
//! Represents the tables and columns found in the database, and renders the
//! one-line schema descriptor handed to the SQL generator.

use serde::Serialize;

/// Represents the user tables of a database.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Schema {
    /// All user tables.
    pub tables: Vec<Table>,
}

impl Schema {
    /// Creates a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the database has no user tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// The table the descriptor is built from.
    ///
    /// Policy: the lexicographically smallest table name (byte order). SQLite's
    /// catalog order is not something callers should depend on.
    pub fn first_table(&self) -> Option<&Table> {
        self.tables.iter().min_by(|a, b| a.name.cmp(&b.name))
    }

    /// Renders the schema descriptor: `Table: <name>(<col1>, <col2>, ...)`.
    ///
    /// Empty string iff there are no tables.
    pub fn describe(&self) -> String {
        self.first_table()
            .map(Table::describe)
            .unwrap_or_default()
    }
}

/// Represents a database table.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Table {
    /// Table name.
    pub name: String,

    /// Columns in declaration order.
    pub columns: Vec<Column>,
}

impl Table {
    /// Creates a new table with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column.
    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Renders `Table: <name>(<col1>, <col2>, ...)`.
    pub fn describe(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        format!("Table: {}({})", self.name, columns)
    }
}

/// Represents a column in a table.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Column {
    /// Column name.
    pub name: String,

    /// Declared type (may be empty; SQLite allows untyped columns).
    pub data_type: String,

    /// Whether NULL is allowed.
    pub is_nullable: bool,

    /// Whether the column is part of the primary key.
    pub is_primary_key: bool,
}

impl Column {
    /// Creates a nullable, non-key column.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            is_nullable: true,
            is_primary_key: false,
        }
    }
}
