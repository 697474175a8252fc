mod common;

use common::commerce_catalog;
use nl2sql::few_shot::{default_examples, default_patterns};
use nl2sql::validator::MAX_COMPLEXITY;
use nl2sql::{ExampleRetriever, PatternClassifier, PatternMatcher, QueryType, QueryValidator};

fn tables(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[test]
fn test_drop_table_is_always_invalid() {
    let validator = QueryValidator::new();
    let statements = [
        "DROP TABLE users",
        "drop table users",
        "SELECT * FROM users; DROP TABLE users",
        "SELECT 1 WHERE 'x' = 'Drop   Table'",
        "select * from (select 1) t; drop\ttable orders;",
    ];
    for sql in statements {
        let result = validator.validate(sql, None);
        assert!(!result.is_valid, "{sql} should be rejected");
        assert!(!result.errors.is_empty());
    }
}

#[test]
fn test_clean_selects_get_no_security_errors() {
    let validator = QueryValidator::new();
    let statements = [
        "SELECT * FROM users WHERE id = 1",
        "select name, price from products where price > 100 order by price desc limit 5",
        "SELECT p.name, c.name FROM products p JOIN categories c ON p.category_id = c.id",
        "SELECT user_id, COUNT(*) FROM orders GROUP BY user_id HAVING COUNT(*) > 2;",
        "SELECT DISTINCT status FROM orders",
    ];
    for sql in statements {
        let result = validator.validate(sql, None);
        assert!(result.errors.is_empty(), "{sql}: {:?}", result.errors);
        assert!(result.is_valid);
    }
}

#[test]
fn test_sanitize_is_idempotent() {
    let inputs = [
        "",
        "SELECT 1",
        "  SELECT   *\n\tFROM users  ",
        "SELECT * FROM users -- trailing comment",
        "SELECT /* inline */ id FROM users; DROP TABLE users",
        "-/**/- exposed\nSELECT 1",
        "/* a /* nested */ still */ SELECT 2",
        ";;;",
        "SELECT '--not really' FROM t",
    ];
    for input in inputs {
        let once = QueryValidator::sanitize(input);
        assert_eq!(QueryValidator::sanitize(&once), once, "input: {input:?}");
    }
}

#[test]
fn test_similar_respects_limit_threshold_and_order() {
    let retriever = ExampleRetriever::default();
    let examples = default_examples();
    let queries = [
        "Show me all users",
        "Find the total revenue by month",
        "How many orders per customer",
        "products with price more than 100",
        "completely unrelated words",
    ];
    for query in queries {
        for limit in [0, 1, 3, 20] {
            let found = retriever.similar(query, &examples, limit);
            assert!(found.len() <= limit);
            let scores: Vec<f64> = found
                .iter()
                .map(|e| ExampleRetriever::similarity(query, &e.natural_language))
                .collect();
            assert!(scores.iter().all(|s| *s > 0.1));
            assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}

#[test]
fn test_complexity_is_bounded_and_monotonic() {
    let steps = [
        "SELECT id FROM users",
        "SELECT id FROM users WHERE id > 1",
        "SELECT id FROM users WHERE id > 1 ORDER BY id",
        "SELECT id FROM users WHERE id > 1 ORDER BY id LIMIT 5",
        "SELECT DISTINCT id FROM users WHERE id > 1 ORDER BY id LIMIT 5",
        "SELECT DISTINCT u.id FROM users u JOIN orders o ON o.user_id = u.id WHERE u.id > 1 ORDER BY u.id LIMIT 5",
        "SELECT DISTINCT u.id FROM users u JOIN orders o ON o.user_id = u.id WHERE u.id IN (SELECT user_id FROM orders) GROUP BY u.id HAVING COUNT(*) > 1 ORDER BY u.id LIMIT 5 UNION SELECT 1",
    ];
    let scores: Vec<u8> = steps.iter().map(|s| QueryValidator::complexity_score(s)).collect();
    assert_eq!(scores[0], 1);
    assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
    assert!(scores.iter().all(|s| (1..=MAX_COMPLEXITY).contains(s)));
    assert_eq!(*scores.last().unwrap(), MAX_COMPLEXITY);
}

#[test]
fn test_validate_simple_select_scenario() {
    let result = QueryValidator::new().validate("SELECT * FROM users WHERE id = 1", None);
    assert!(result.is_valid);
    assert_eq!(result.query_type, QueryType::Select);
    assert_eq!(result.tables_used.into_iter().collect::<Vec<_>>(), vec!["users"]);
}

#[test]
fn test_validate_chained_drop_scenario() {
    let result = QueryValidator::new().validate("SELECT * FROM users; DROP TABLE users;", None);
    assert!(!result.is_valid);
    assert!(result
        .errors
        .iter()
        .any(|e| e == "Multiple SQL statements not allowed"));
    assert!(result
        .errors
        .iter()
        .any(|e| e.starts_with("Dangerous keyword") || e.starts_with("Forbidden pattern")));
}

#[test]
fn test_validate_against_catalog() {
    let catalog = commerce_catalog();
    let validator = QueryValidator::new();

    let ok = validator.validate(
        "SELECT o.id, u.username FROM orders o JOIN users u ON o.user_id = u.id LIMIT 10",
        Some(&catalog),
    );
    assert!(ok.is_valid, "{:?}", ok.errors);
    assert!(ok.warnings.is_empty());

    let typo = validator.validate("SELECT * FROM user WHERE id = 1", Some(&catalog));
    assert!(!typo.is_valid);
    assert_eq!(typo.errors, vec!["Table 'user' does not exist in schema"]);
    assert!(typo
        .suggestions
        .contains(&"Did you mean 'users' instead of 'user'?".to_string()));
}

#[test]
fn test_dropbox_column_trips_denylist() {
    // plain substring matching, kept as-is
    let result = QueryValidator::new().validate("SELECT dropbox_id FROM users", None);
    assert!(!result.is_valid);
    assert_eq!(result.errors, vec!["Dangerous keyword 'DROP' detected"]);
}

#[test]
fn test_synthesize_scenarios() {
    let matcher = PatternMatcher::new();
    assert_eq!(
        matcher.synthesize("Show me all users", &tables(&["users", "products"])),
        "SELECT * FROM users"
    );
    assert_eq!(
        matcher.synthesize("Get the top 5 most expensive products", &tables(&["products"])),
        "SELECT * FROM products ORDER BY price DESC LIMIT 5"
    );
    assert_eq!(matcher.synthesize("anything at all", &[]), "SELECT 1");
}

#[test]
fn test_synthesized_sql_passes_validation() {
    let matcher = PatternMatcher::new();
    let validator = QueryValidator::new();
    let catalog = commerce_catalog();
    let known = catalog.table_names();
    let questions = [
        "Show me all users",
        "How many orders are there",
        "Find products with price more than 100",
        "Get the top 3 most expensive products",
        "Show orders with customer names",
        "List products and their categories",
        "something vague",
    ];
    for question in questions {
        let sql = matcher.synthesize(question, &known);
        let result = validator.validate(&sql, Some(&catalog));
        assert!(result.is_valid, "{question} -> {sql}: {:?}", result.errors);
    }
}

#[test]
fn test_classify_scenario() {
    let matches = PatternClassifier::classify(
        "Count the number of orders per customer",
        &default_patterns(),
    );
    assert!(matches
        .iter()
        .any(|m| m.pattern_name == "count" && m.matched_keyword == "count"));
    assert!(matches
        .iter()
        .any(|m| m.pattern_name == "group_by" && m.matched_keyword == "per"));
}
