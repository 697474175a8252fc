//! Prompt assembly for generative models and cleanup of what they return.

use super::GenerationContext;
use crate::few_shot::format_examples_for_prompt;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*(```)?$").expect("valid fence pattern");
    static ref STATEMENT_START: Regex =
        Regex::new(r"(?i)\b(SELECT|WITH)\b").expect("valid statement start pattern");
}

/// Labels models like to put in front of the statement.
const LABEL_PREFIXES: &[&str] = &[
    "SQL:",
    "Query:",
    "Here's the SQL query:",
    "The SQL query is:",
    "Generated SQL:",
];

pub fn build_prompt(ctx: &GenerationContext) -> String {
    format!(
        r#"You are a SQL expert. Convert the natural language query to SQL.

{}

{}
Natural Language Query: {}

Generate only the SQL query without any explanation:"#,
        ctx.schema_text.trim_end(),
        format_examples_for_prompt(&ctx.examples),
        ctx.query
    )
}

/// Reduce raw model output to a bare statement: no fences, no labels, nothing
/// before the first SELECT/WITH, no trailing `.` or `;`.
pub fn clean_generated_sql(generated: &str) -> String {
    let mut sql = generated.trim();

    if let Some(inner) = CODE_FENCE.captures(sql).and_then(|c| c.get(1)) {
        sql = inner.as_str().trim();
    }

    for prefix in LABEL_PREFIXES {
        let labelled = sql
            .get(..prefix.len())
            .map_or(false, |head| head.eq_ignore_ascii_case(prefix));
        if labelled {
            sql = sql[prefix.len()..].trim();
        }
    }

    match STATEMENT_START.find(sql) {
        Some(m) => sql = &sql[m.start()..],
        None => warn!("Generated text doesn't contain a SELECT statement"),
    }

    sql.trim_end_matches(|c: char| c == '.' || c == ';' || c.is_whitespace())
        .to_string()
}
