//! Syntax phase: the statement must tokenize and lead with SELECT.

use super::tokens::{is_keyword, parse_statements, SqlNode, Statement};
use sqlparser::tokenizer::Token;

/// The first non-empty statement, or the single phase error.
pub fn check(sql: &str) -> Result<Statement, String> {
    let statements = parse_statements(sql).map_err(|e| format!("Syntax error: {}", e))?;
    let first = statements
        .into_iter()
        .next()
        .ok_or_else(|| "Empty or invalid SQL query".to_string())?;

    if !leads_with_select(&first) {
        return Err("Query must be a SELECT statement".to_string());
    }
    Ok(first)
}

fn leads_with_select(statement: &[SqlNode]) -> bool {
    matches!(
        statement.iter().find_map(SqlNode::first_leaf),
        Some(Token::Word(word)) if is_keyword(word, "SELECT")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_passes() {
        assert!(check("select id from users").is_ok());
        assert!(check("  (SELECT 1) UNION (SELECT 2)").is_ok());
    }

    #[test]
    fn test_phase_errors() {
        assert_eq!(check("").unwrap_err(), "Empty or invalid SQL query");
        assert_eq!(check(" ; ; ").unwrap_err(), "Empty or invalid SQL query");
        assert_eq!(
            check("DELETE FROM users").unwrap_err(),
            "Query must be a SELECT statement"
        );
        assert_eq!(
            check("WITH t AS (SELECT 1) SELECT * FROM t").unwrap_err(),
            "Query must be a SELECT statement"
        );
        assert!(check("SELECT 'open").unwrap_err().starts_with("Syntax error: "));
    }
}
