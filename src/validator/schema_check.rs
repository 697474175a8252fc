//! Schema cross-check phase: extracted names against a catalog snapshot.
//!
//! Missing tables are errors. Missing columns are only warnings, and only
//! qualified references whose qualifier resolves (alias first, then table
//! name) are checked.

use super::extraction::Extraction;
use super::PhaseReport;
use crate::schema::{SchemaCatalog, TableSchema};
use strsim::jaro_winkler;

/// Minimum Jaro-Winkler score for a "did you mean" suggestion.
pub const SUGGESTION_THRESHOLD: f64 = 0.8;

pub fn check(extraction: &Extraction, catalog: &SchemaCatalog) -> PhaseReport {
    let mut report = PhaseReport::default();

    for table in &extraction.tables {
        if catalog.resolve_table(table).is_some() {
            continue;
        }
        report
            .errors
            .push(format!("Table '{}' does not exist in schema", table));
        if let Some(candidate) = closest_table(table, catalog) {
            report
                .suggestions
                .push(format!("Did you mean '{}' instead of '{}'?", candidate, table));
        }
    }

    for column in &extraction.columns {
        let Some(qualifier) = column.table.as_deref() else {
            continue;
        };
        let Some((table_name, table)) = resolve_qualifier(qualifier, extraction, catalog) else {
            continue;
        };
        if !table.has_column(&column.column) {
            report.warnings.push(format!(
                "Column '{}' not found in table '{}'",
                column.column, table_name
            ));
        }
    }

    report
}

fn resolve_qualifier<'a>(
    qualifier: &str,
    extraction: &Extraction,
    catalog: &'a SchemaCatalog,
) -> Option<(&'a str, &'a TableSchema)> {
    extraction
        .aliases
        .get(qualifier)
        .and_then(|table| catalog.resolve_table(table))
        .or_else(|| catalog.resolve_table(qualifier))
}

fn closest_table<'a>(name: &str, catalog: &'a SchemaCatalog) -> Option<&'a str> {
    let name_lower = name.to_lowercase();
    catalog
        .tables
        .keys()
        .map(|candidate| (candidate, jaro_winkler(&name_lower, &candidate.to_lowercase())))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(candidate, _)| candidate.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures::commerce_catalog;
    use crate::validator::extraction::extract;
    use crate::validator::tokens::parse_statements;

    fn run(sql: &str) -> PhaseReport {
        let statements = parse_statements(sql).unwrap();
        check(&extract(&statements[0]), &commerce_catalog())
    }

    #[test]
    fn test_known_tables_and_columns_pass() {
        let report = run(
            "SELECT p.name, c.name FROM products p JOIN categories c ON p.category_id = c.id",
        );
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_table_with_suggestion() {
        let report = run("SELECT * FROM user");
        assert_eq!(report.errors, vec!["Table 'user' does not exist in schema"]);
        assert_eq!(report.suggestions, vec!["Did you mean 'users' instead of 'user'?"]);

        let report = run("SELECT * FROM zebra");
        assert_eq!(report.errors.len(), 1);
        assert!(report.suggestions.is_empty());
    }

    #[test]
    fn test_missing_column_is_a_warning() {
        let report = run("SELECT o.total FROM orders o WHERE users.nickname IS NULL");
        assert!(report.errors.is_empty());
        assert_eq!(
            report.warnings,
            vec![
                "Column 'total' not found in table 'orders'",
                "Column 'nickname' not found in table 'users'",
            ]
        );
    }

    #[test]
    fn test_unresolvable_qualifier_is_skipped() {
        let report = run("SELECT x.whatever FROM users");
        assert!(report.warnings.is_empty());
    }
}
