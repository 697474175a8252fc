//! SQL formatting, result summaries and input checks shared by the service,
//! the HTTP API and the CLI.

use crate::validator::{syntax, QueryType};
use serde::Serialize;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use tracing::warn;

const AGGREGATE_CALLS: &[&str] = &["COUNT(", "SUM(", "AVG(", "MAX(", "MIN("];

/// Keywords that suggest the user typed SQL instead of a question.
const SQL_KEYWORDS: &[&str] = &["SELECT", "FROM", "WHERE", "JOIN", "GROUP BY", "ORDER BY"];

pub const MIN_QUERY_LENGTH: usize = 3;
pub const MAX_QUERY_LENGTH: usize = 1000;

/// Canonical rendering via sqlparser. Input that does not parse comes back unchanged.
pub fn format_sql(sql: &str) -> String {
    match Parser::parse_sql(&PostgreSqlDialect {}, sql) {
        Ok(statements) if !statements.is_empty() => statements
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join("; "),
        Ok(_) => sql.to_string(),
        Err(e) => {
            warn!("Error formatting SQL: {}", e);
            sql.to_string()
        }
    }
}

pub fn has_aggregation(sql: &str) -> bool {
    let sql_upper = sql.to_uppercase();
    AGGREGATE_CALLS.iter().any(|call| sql_upper.contains(*call))
}

/// Reject empty, too short, too long, or SQL-looking questions.
pub fn validate_natural_language_query(query: &str) -> Result<(), String> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err("Query cannot be empty".to_string());
    }
    if trimmed.chars().count() < MIN_QUERY_LENGTH {
        return Err("Query is too short".to_string());
    }
    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(format!("Query is too long (max {} characters)", MAX_QUERY_LENGTH));
    }

    let query_upper = query.to_uppercase();
    if let Some(keyword) = SQL_KEYWORDS.iter().find(|k| query_upper.contains(**k)) {
        return Err(format!(
            "Query contains SQL keyword '{}'. Please use natural language.",
            keyword
        ));
    }
    Ok(())
}

/// Structural overview of an executed statement and its result shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuerySummary {
    pub query_type: QueryType,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    pub has_aggregation: bool,
    pub has_joins: bool,
    pub has_where: bool,
    pub has_order_by: bool,
    pub has_group_by: bool,
}

pub fn summarize_query(sql: &str, columns: &[String], row_count: usize) -> QuerySummary {
    let sql_upper = sql.to_uppercase();
    let query_type = if syntax::check(sql).is_ok() {
        QueryType::Select
    } else {
        QueryType::Unknown
    };

    QuerySummary {
        query_type,
        row_count,
        column_count: columns.len(),
        columns: columns.to_vec(),
        has_aggregation: has_aggregation(sql),
        has_joins: sql_upper.contains("JOIN"),
        has_where: sql_upper.contains("WHERE"),
        has_order_by: sql_upper.contains("ORDER BY"),
        has_group_by: sql_upper.contains("GROUP BY"),
    }
}
