//! SQL parsing and read-only checks.
//!
//! Uses sqlparser-rs with the SQLite dialect to parse SQL and reject any
//! statement that could modify the store.

use sqlparser::ast::{Query, Select, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

use crate::error::{InsightsError, Result};

use super::StatementType;

/// Parses SQL and admits only read-only statements.
#[derive(Debug)]
pub struct SqlGuard {
    dialect: SQLiteDialect,
}

impl Default for SqlGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlGuard {
    /// Creates a new guard.
    pub fn new() -> Self {
        Self {
            dialect: SQLiteDialect {},
        }
    }

    /// Returns the statement type if `sql` only reads, otherwise a query error.
    ///
    /// SQL that cannot be parsed is rejected as malformed.
    pub fn check(&self, sql: &str) -> Result<StatementType> {
        let statements = Parser::parse_sql(&self.dialect, sql)
            .map_err(|e| InsightsError::query(format!("SQL parse error: {e}")))?;

        let Some(first) = statements.first() else {
            return Err(InsightsError::query("Empty SQL statement"));
        };

        for statement in &statements {
            let (read_only, stmt_type) = classify_statement(statement);
            if !read_only {
                return Err(InsightsError::query(format!(
                    "Only read-only queries are allowed; {stmt_type} would modify the store"
                )));
            }
        }

        let (_, first_type) = classify_statement(first);
        if statements.len() == 1 {
            Ok(first_type)
        } else {
            Ok(StatementType::Multiple(Box::new(first_type)))
        }
    }
}

/// Classifies a single parsed statement as (read_only, type).
fn classify_statement(statement: &Statement) -> (bool, StatementType) {
    match statement {
        Statement::Query(query) => classify_query(query),
        Statement::Explain { statement, .. } => {
            let (inner_read_only, _) = classify_statement(statement);
            (inner_read_only, StatementType::Explain)
        }

        Statement::Insert { .. } => (false, StatementType::Insert),
        Statement::Update { .. } => (false, StatementType::Update),
        Statement::Delete { .. } => (false, StatementType::Delete),
        Statement::Drop { .. } => (false, StatementType::Drop),
        Statement::CreateTable { .. }
        | Statement::CreateIndex { .. }
        | Statement::CreateView { .. } => (false, StatementType::Create),
        Statement::AlterTable { .. } => (false, StatementType::Alter),

        // Conservative default: anything else may write
        _ => (false, StatementType::Unknown),
    }
}

/// Classifies a Query, recursing into CTEs and the body.
fn classify_query(query: &Query) -> (bool, StatementType) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            let (read_only, stmt_type) = classify_query(&cte.query);
            if !read_only {
                return (false, stmt_type);
            }
        }
    }

    classify_set_expr(&query.body)
}

/// Classifies a SetExpr, recursing into nested queries.
fn classify_set_expr(set_expr: &SetExpr) -> (bool, StatementType) {
    match set_expr {
        SetExpr::Select(select) => classify_select(select),
        SetExpr::Query(query) => classify_query(query),
        SetExpr::SetOperation { left, right, .. } => {
            let left = classify_set_expr(left);
            if !left.0 {
                return left;
            }
            classify_set_expr(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => (true, StatementType::Select),
        // Data-modifying bodies (INSERT/UPDATE inside a CTE, etc.)
        _ => (false, StatementType::Unknown),
    }
}

/// Classifies a Select by checking its FROM clause for subqueries.
fn classify_select(select: &Select) -> (bool, StatementType) {
    for table_with_joins in &select.from {
        let result = classify_table_with_joins(table_with_joins);
        if !result.0 {
            return result;
        }
    }
    (true, StatementType::Select)
}

/// Classifies a TableWithJoins, checking the main relation and all joins.
fn classify_table_with_joins(twj: &TableWithJoins) -> (bool, StatementType) {
    let relation = classify_table_factor(&twj.relation);
    if !relation.0 {
        return relation;
    }
    for join in &twj.joins {
        let result = classify_table_factor(&join.relation);
        if !result.0 {
            return result;
        }
    }
    (true, StatementType::Select)
}

/// Classifies a TableFactor, recursing into derived tables (subqueries).
fn classify_table_factor(factor: &TableFactor) -> (bool, StatementType) {
    match factor {
        TableFactor::Derived { subquery, .. } => classify_query(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => classify_table_with_joins(table_with_joins),
        _ => (true, StatementType::Select),
    }
}
