//! Security phase. Every check runs; all hits are reported.
//!
//! Keyword checks are plain substring tests on the uppercased text, so an
//! identifier such as `dropbox_id` trips the `DROP` check.

use super::rules::ValidatorRules;
use super::PhaseReport;

pub fn check(sql: &str, rules: &ValidatorRules) -> PhaseReport {
    let mut report = PhaseReport::default();
    let sql_upper = sql.to_uppercase();

    for keyword in rules.dangerous_in(&sql_upper) {
        report.errors.push(format!("Dangerous keyword '{}' detected", keyword));
    }

    for pattern in &rules.forbidden_patterns {
        if pattern.regex.is_match(&sql_upper) {
            report.errors.push(format!("Forbidden pattern detected: {}", pattern.source));
        }
    }

    if sql.matches(';').count() > 1 {
        report.errors.push("Multiple SQL statements not allowed".to_string());
    }

    if sql.contains("--") || sql.contains("/*") {
        report.errors.push("SQL comments not allowed for security reasons".to_string());
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_select_has_no_errors() {
        let report = check("SELECT name FROM products WHERE price > 10;", &ValidatorRules::default());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_chained_drop() {
        let report = check("SELECT * FROM users; DROP TABLE users;", &ValidatorRules::default());
        assert_eq!(
            report.errors,
            vec![
                "Dangerous keyword 'DROP' detected",
                "Forbidden pattern detected: DROP\\s+TABLE",
                "Forbidden pattern detected: ;\\s*DROP",
                "Multiple SQL statements not allowed",
            ]
        );
    }

    #[test]
    fn test_comment_markers() {
        let rules = ValidatorRules::default();
        assert_eq!(
            check("SELECT 1 -- trailing", &rules).errors,
            vec!["SQL comments not allowed for security reasons"]
        );
        assert_eq!(check("SELECT /* x */ 1", &rules).errors.len(), 1);
    }

    #[test]
    fn test_substring_keywords_trip_denylist() {
        let report = check("SELECT dropbox_id, created_at FROM files", &ValidatorRules::default());
        assert_eq!(
            report.errors,
            vec!["Dangerous keyword 'DROP' detected", "Dangerous keyword 'CREATE' detected"]
        );
    }
}
