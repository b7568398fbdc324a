//! Read-only query guard.
//!
//! Parses generated SQL with the SQLite dialect and rejects anything that
//! could write: DML, DDL, pragmas, and data-modifying CTEs hidden inside a
//! query. Unparseable SQL is rejected as well.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use crate::error::{AppError, Result};

/// Whether a statement only reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Read,
    /// Writes; carries the leading keyword of the offending statement.
    Write(String),
}

impl Access {
    fn max(self, other: Access) -> Access {
        match self {
            Access::Read => other,
            write => write,
        }
    }
}

/// Rejects SQL that is not read-only.
#[derive(Debug)]
pub struct ReadOnlyGuard {
    dialect: SQLiteDialect,
}

impl Default for ReadOnlyGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadOnlyGuard {
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    /// Classifies every statement in `sql`; the first write wins.
    pub fn classify(&self, sql: &str) -> Result<Access> {
        let statements = Parser::parse_sql(&self.dialect, sql)
            .map_err(|e| AppError::query(format!("Read-only mode: could not parse SQL: {e}")))?;

        if statements.is_empty() {
            return Err(AppError::query("Read-only mode: empty SQL statement"));
        }

        Ok(statements
            .iter()
            .map(classify_statement)
            .fold(Access::Read, Access::max))
    }

    /// Ok when `sql` only reads.
    pub fn check(&self, sql: &str) -> Result<()> {
        match self.classify(sql)? {
            Access::Read => Ok(()),
            Access::Write(keyword) => Err(AppError::query(format!(
                "Read-only mode: {keyword} statements are not allowed"
            ))),
        }
    }
}

fn write_access(statement: &Statement) -> Access {
    let keyword = statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or("UNKNOWN")
        .to_uppercase();
    Access::Write(keyword)
}

fn classify_statement(statement: &Statement) -> Access {
    match statement {
        Statement::Query(query) => classify_query(query),
        Statement::Explain {
            analyze, statement, ..
        } => {
            // EXPLAIN ANALYZE runs the statement.
            if *analyze {
                classify_statement(statement)
            } else {
                Access::Read
            }
        }
        _ => write_access(statement),
    }
}

fn classify_query(query: &Query) -> Access {
    let ctes = query
        .with
        .iter()
        .flat_map(|with| &with.cte_tables)
        .map(|cte| classify_query(&cte.query))
        .fold(Access::Read, Access::max);

    ctes.max(classify_set_expr(&query.body))
}

fn classify_set_expr(set_expr: &SetExpr) -> Access {
    match set_expr {
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => classify_statement(stmt),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::Select(select) => classify_select(select),
        SetExpr::SetOperation { left, right, .. } => {
            classify_set_expr(left).max(classify_set_expr(right))
        }
        SetExpr::Values(_) | SetExpr::Table(_) => Access::Read,
    }
}

fn classify_select(select: &Select) -> Access {
    select
        .from
        .iter()
        .map(classify_table_with_joins)
        .fold(Access::Read, Access::max)
}

fn classify_table_with_joins(twj: &TableWithJoins) -> Access {
    twj.joins
        .iter()
        .map(|join| classify_table_factor(&join.relation))
        .fold(classify_table_factor(&twj.relation), Access::max)
}

fn classify_table_factor(factor: &TableFactor) -> Access {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => Access::Read,
    }
}
