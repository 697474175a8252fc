//! Pattern Matcher
//!
//! Deterministic rule cascade that turns a natural-language question into a
//! candidate SELECT using only the list of known table names. Used when no
//! generative model is configured, and as the fallback when one fails.
//!
//! Rules are evaluated in priority order and the first rule that produces SQL
//! wins. Table detection is a case-insensitive substring test against the
//! question, so a table name hidden inside an unrelated word also matches.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::sync::Arc;

lazy_static! {
    static ref FIRST_NUMBER: Regex = Regex::new(r"(\d+)").expect("valid number pattern");
    static ref TOP_N: Regex = Regex::new(r"top\s+(\d+)").expect("valid top-n pattern");
}

const SHOW_ALL_PHRASES: &[&str] = &["show me all", "get all", "list all", "display all"];
const COUNT_PHRASES: &[&str] = &["count", "number of", "how many", "total"];
const FIND_PHRASES: &[&str] = &["find", "get", "show", "display"];
const PRICE_TERMS: &[&str] = &["price", "cost"];
const EXPENSIVE_TERMS: &[&str] = &["expensive", "price"];

/// Degenerate statement returned when no table is known at all.
pub const DEGENERATE_SELECT: &str = "SELECT 1";

/// Intent tag of a synthesis rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ShowAll,
    Count,
    Find,
    TopN,
    Orders,
    ProductCategory,
    Fallback,
}

/// The question as the rules see it.
pub struct QueryContext<'a> {
    pub raw: &'a str,
    pub lower: String,
    pub tables: &'a [String],
}

impl<'a> QueryContext<'a> {
    pub fn new(raw: &'a str, tables: &'a [String]) -> Self {
        Self {
            raw,
            lower: raw.to_lowercase(),
            tables,
        }
    }

    pub fn mentions(&self, term: &str) -> bool {
        self.lower.contains(term)
    }

    pub fn mentions_any(&self, terms: &[&str]) -> bool {
        terms.iter().any(|t| self.lower.contains(t))
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t == name)
    }

    /// First known table whose name occurs in the question, else `users` if present.
    pub fn target_table(&self) -> Option<&'a str> {
        self.tables
            .iter()
            .find(|t| self.lower.contains(t.to_lowercase().as_str()))
            .or_else(|| self.tables.iter().find(|t| t.as_str() == "users"))
            .map(String::as_str)
    }
}

/// One guarded template in the cascade.
#[derive(Clone, Copy)]
pub struct SynthesisRule {
    pub intent: Intent,
    pub synthesize: fn(&QueryContext<'_>) -> Option<String>,
}

impl SynthesisRule {
    pub fn apply(&self, ctx: &QueryContext<'_>) -> Option<String> {
        (self.synthesize)(ctx)
    }
}

impl std::fmt::Debug for SynthesisRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisRule")
            .field("intent", &self.intent)
            .finish()
    }
}

fn show_all(ctx: &QueryContext<'_>) -> Option<String> {
    if !ctx.mentions_any(SHOW_ALL_PHRASES) {
        return None;
    }
    ctx.target_table().map(|t| format!("SELECT * FROM {}", t))
}

fn count(ctx: &QueryContext<'_>) -> Option<String> {
    if !ctx.mentions_any(COUNT_PHRASES) {
        return None;
    }
    ctx.target_table().map(|t| format!("SELECT COUNT(*) FROM {}", t))
}

fn find(ctx: &QueryContext<'_>) -> Option<String> {
    if !ctx.mentions_any(FIND_PHRASES) {
        return None;
    }

    if ctx.mentions_any(PRICE_TERMS) && ctx.has_table("products") {
        let Some(price) = FIRST_NUMBER.captures(ctx.raw).and_then(|c| c.get(1)) else {
            return Some("SELECT * FROM products ORDER BY price DESC".to_string());
        };
        let op = if ctx.mentions_any(&["more than", "greater than"]) {
            ">"
        } else if ctx.mentions_any(&["less than", "under"]) {
            "<"
        } else {
            "="
        };
        return Some(format!("SELECT * FROM products WHERE price {} {}", op, price.as_str()));
    }

    if ctx.mentions("user") && ctx.has_table("users") {
        return Some("SELECT * FROM users".to_string());
    }
    None
}

fn top_n(ctx: &QueryContext<'_>) -> Option<String> {
    let limit = TOP_N.captures(&ctx.lower)?.get(1)?.as_str().to_string();
    if ctx.has_table("products") && ctx.mentions_any(EXPENSIVE_TERMS) {
        Some(format!("SELECT * FROM products ORDER BY price DESC LIMIT {}", limit))
    } else if ctx.has_table("users") {
        Some(format!("SELECT * FROM users LIMIT {}", limit))
    } else {
        None
    }
}

fn orders(ctx: &QueryContext<'_>) -> Option<String> {
    if !ctx.mentions("order") || !ctx.has_table("orders") {
        return None;
    }
    if ctx.mentions("customer") {
        Some("SELECT o.*, u.username FROM orders o JOIN users u ON o.user_id = u.id".to_string())
    } else {
        Some("SELECT * FROM orders".to_string())
    }
}

fn product_category(ctx: &QueryContext<'_>) -> Option<String> {
    let wanted = ctx.mentions("product") && ctx.mentions("categor");
    if wanted && ctx.has_table("products") && ctx.has_table("categories") {
        Some(
            "SELECT p.name, p.price, c.name as category FROM products p JOIN categories c ON p.category_id = c.id"
                .to_string(),
        )
    } else {
        None
    }
}

fn fallback(ctx: &QueryContext<'_>) -> Option<String> {
    let sql = if ctx.has_table("users") {
        "SELECT * FROM users LIMIT 10".to_string()
    } else if let Some(first) = ctx.tables.first() {
        format!("SELECT * FROM {} LIMIT 10", first)
    } else {
        DEGENERATE_SELECT.to_string()
    };
    Some(sql)
}

/// The built-in cascade, highest priority first.
pub fn default_rules() -> Vec<SynthesisRule> {
    vec![
        SynthesisRule { intent: Intent::ShowAll, synthesize: show_all },
        SynthesisRule { intent: Intent::Count, synthesize: count },
        SynthesisRule { intent: Intent::Find, synthesize: find },
        SynthesisRule { intent: Intent::TopN, synthesize: top_n },
        SynthesisRule { intent: Intent::Orders, synthesize: orders },
        SynthesisRule { intent: Intent::ProductCategory, synthesize: product_category },
        SynthesisRule { intent: Intent::Fallback, synthesize: fallback },
    ]
}

#[derive(Debug, Clone)]
pub struct PatternMatcher {
    rules: Arc<Vec<SynthesisRule>>,
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternMatcher {
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    pub fn with_rules(rules: Vec<SynthesisRule>) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    pub fn rules(&self) -> &[SynthesisRule] {
        &self.rules
    }

    pub fn rule(&self, intent: Intent) -> Option<&SynthesisRule> {
        self.rules.iter().find(|r| r.intent == intent)
    }

    /// Synthesize SQL, reporting which rule produced it.
    pub fn synthesize_with_intent(&self, query: &str, known_tables: &[String]) -> (Intent, String) {
        let ctx = QueryContext::new(query, known_tables);
        self.rules
            .iter()
            .find_map(|rule| rule.apply(&ctx).map(|sql| (rule.intent, sql)))
            .unwrap_or_else(|| (Intent::Fallback, fallback_sql(known_tables)))
    }

    /// Never fails: a rule set without a catch-all still ends in the fallback.
    pub fn synthesize(&self, query: &str, known_tables: &[String]) -> String {
        self.synthesize_with_intent(query, known_tables).1
    }
}

fn fallback_sql(known_tables: &[String]) -> String {
    fallback(&QueryContext::new("", known_tables)).unwrap_or_else(|| DEGENERATE_SELECT.to_string())
}
