//! Performance phase and the complexity heuristic. Advisory only.

use super::PhaseReport;

pub const MAX_COMPLEXITY: u8 = 10;

/// Structural markers and the weight each adds once when present.
const COMPLEXITY_WEIGHTS: &[(&str, u8)] = &[
    ("JOIN", 2),
    ("GROUP BY", 1),
    ("HAVING", 1),
    ("ORDER BY", 1),
    ("LIMIT", 1),
    ("WHERE", 1),
    ("DISTINCT", 1),
    ("UNION", 2),
    // subquery proxy
    ("(", 2),
];

pub fn check(sql: &str) -> PhaseReport {
    let mut report = PhaseReport::default();
    let sql_upper = sql.to_uppercase();
    let has_limit = sql_upper.contains("LIMIT");

    if sql_upper.contains("SELECT *") && !has_limit {
        report
            .warnings
            .push("SELECT * without LIMIT may return large datasets".to_string());
        report
            .suggestions
            .push("Consider adding LIMIT clause or selecting specific columns".to_string());
    }

    if sql_upper.contains("SELECT") && !sql_upper.contains("WHERE") {
        report
            .suggestions
            .push("Consider adding WHERE clause for better performance".to_string());
    }

    if sql_upper.matches("FROM").count() > 1 && !sql_upper.contains("JOIN") {
        report
            .warnings
            .push("Multiple FROM clauses without JOIN may cause cartesian products".to_string());
    }

    if sql_upper.contains("ORDER BY") && !has_limit {
        report
            .suggestions
            .push("Consider adding LIMIT with ORDER BY for better performance".to_string());
    }

    report
}

/// 1 plus the weight of every marker present, capped at [`MAX_COMPLEXITY`].
pub fn complexity_score(sql: &str) -> u8 {
    let sql_upper = sql.to_uppercase();
    let score = COMPLEXITY_WEIGHTS
        .iter()
        .filter(|(marker, _)| sql_upper.contains(marker))
        .fold(1u8, |acc, (_, weight)| acc + weight);
    score.min(MAX_COMPLEXITY)
}
