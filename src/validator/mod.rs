//! Query Validator
//!
//! Five-phase safety gate every candidate statement passes before execution:
//!
//! 1. syntax: tokenizes and leads with SELECT (failure returns immediately)
//! 2. security: denylisted keywords, forbidden patterns, chaining, comments
//! 3. extraction: tables, column references and aliases of the first statement
//! 4. schema cross-check: only when a catalog is supplied
//! 5. performance: warnings and suggestions only
//!
//! A result is valid exactly when no phase reported an error. Warnings and
//! suggestions never affect validity.

pub mod extraction;
pub mod performance;
pub mod rules;
pub mod schema_check;
pub mod security;
pub mod syntax;
pub mod tokens;

pub use performance::MAX_COMPLEXITY;
pub use rules::ValidatorRules;

use crate::schema::SchemaCatalog;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

lazy_static! {
    static ref LINE_COMMENT: Regex = Regex::new(r"(?m)--.*$").expect("valid line comment pattern");
    static ref BLOCK_COMMENT: Regex =
        Regex::new(r"(?s)/\*.*?\*/").expect("valid block comment pattern");
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("valid whitespace pattern");
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "SELECT")]
    Select,
}

/// A column reference; `table` is the qualifier as written (table or alias).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub column: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub query_type: QueryType,
    /// Deduplicated; serialized as a sorted list.
    pub tables_used: BTreeSet<String>,
    pub columns_used: Vec<ColumnRef>,
}

impl ValidationResult {
    fn absorb(&mut self, report: PhaseReport) {
        self.errors.extend(report.errors);
        self.warnings.extend(report.warnings);
        self.suggestions.extend(report.suggestions);
    }

    fn finish(mut self) -> Self {
        self.is_valid = self.errors.is_empty();
        self
    }
}

/// What a single phase contributes to the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct QueryValidator {
    rules: Arc<ValidatorRules>,
}

impl Default for QueryValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryValidator {
    pub fn new() -> Self {
        Self::with_rules(Arc::new(ValidatorRules::default()))
    }

    pub fn with_rules(rules: Arc<ValidatorRules>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ValidatorRules {
        &self.rules
    }

    /// Run all phases. Never fails: malformed input is an invalid result.
    pub fn validate(&self, sql: &str, schema: Option<&SchemaCatalog>) -> ValidationResult {
        let mut result = ValidationResult::default();

        let statement = match syntax::check(sql) {
            Ok(statement) => statement,
            Err(error) => {
                debug!("Syntax check failed: {}", error);
                result.errors.push(error);
                return result.finish();
            }
        };
        result.query_type = QueryType::Select;

        result.absorb(security::check(sql, &self.rules));

        let extraction = extraction::extract(&statement);
        if let Some(catalog) = schema {
            result.absorb(schema_check::check(&extraction, catalog));
        }
        result.tables_used = extraction.tables;
        result.columns_used = extraction.columns;

        result.absorb(performance::check(sql));
        result.finish()
    }

    /// False on any denylisted keyword; otherwise true only when a read-only
    /// keyword is present. Text with neither is not read-only.
    pub fn is_read_only(&self, sql: &str) -> bool {
        let sql_upper = sql.to_uppercase();
        if self.rules.dangerous_in(&sql_upper).next().is_some() {
            return false;
        }
        self.rules
            .read_only_keywords
            .iter()
            .any(|k| sql_upper.contains(k.as_str()))
    }

    /// Strip comments, collapse whitespace and keep only the text before the
    /// first `;`. Idempotent.
    pub fn sanitize(sql: &str) -> String {
        let mut text = sql.to_string();
        // Removing one comment can expose another marker.
        loop {
            let without_lines = LINE_COMMENT.replace_all(&text, "");
            let stripped = BLOCK_COMMENT.replace_all(&without_lines, "").into_owned();
            if stripped == text {
                break;
            }
            text = stripped;
        }

        let collapsed = WHITESPACE_RUN.replace_all(&text, " ");
        let collapsed = collapsed.trim();
        match collapsed.split_once(';') {
            Some((head, _)) => head.trim().to_string(),
            None => collapsed.to_string(),
        }
    }

    pub fn complexity_score(sql: &str) -> u8 {
        performance::complexity_score(sql)
    }
}
