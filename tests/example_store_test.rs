mod common;

use common::COMMERCE_SCHEMA;
use nl2sql::{AppConfig, Example, ExampleStore, GenerateOptions, Nl2SqlService};
use std::collections::HashMap;
use tempfile::TempDir;

const EXAMPLES_DOCUMENT: &str = r#"{
  "examples": [
    {"natural_language": "Show me all invoices", "sql": "SELECT * FROM invoices", "category": "basic_select", "difficulty": "easy"},
    {"natural_language": "Total invoice amount per customer", "sql": "SELECT customer_id, SUM(amount) FROM invoices GROUP BY customer_id", "category": "aggregation", "difficulty": "medium"}
  ],
  "patterns": {
    "ranking": {"keywords": ["rank", "top"], "sql_template": "SELECT * FROM {table} ORDER BY {column} DESC LIMIT {n}", "description": "Ranked listing"},
    "aggregation": {"keywords": ["total", "sum"], "sql_template": "SELECT SUM({column}) FROM {table}", "description": "Sum a column"}
  }
}"#;

#[test]
fn test_load_replaces_examples_and_taxonomy() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("examples.json");
    std::fs::write(&path, EXAMPLES_DOCUMENT).unwrap();

    let store = ExampleStore::new();
    assert!(store.load(&path));
    assert_eq!(store.len(), 2);

    let names: Vec<String> = store.patterns().into_iter().map(|p| p.name).collect();
    assert_eq!(names, vec!["ranking", "aggregation"]);

    let matches = store.patterns_for_query("Top customers by total spend");
    let matched: Vec<(&str, &str)> = matches
        .iter()
        .map(|m| (m.pattern_name.as_str(), m.matched_keyword.as_str()))
        .collect();
    assert_eq!(matched, vec![("ranking", "top"), ("aggregation", "total")]);
}

#[test]
fn test_failed_load_keeps_previous_state() {
    let dir = TempDir::new().unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{\"examples\": [").unwrap();

    let store = ExampleStore::new();
    let before = store.snapshot();
    assert!(!store.load(&broken));
    assert!(!store.load(dir.path().join("missing.json")));
    assert_eq!(store.snapshot(), before);
}

#[test]
fn test_appended_examples_survive_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("saved.json");

    let store = ExampleStore::new();
    store.add_example(
        Example::new("List every refund", "SELECT * FROM refunds")
            .with_category("basic_select")
            .with_difficulty("easy"),
    );
    assert!(store.save(&path));

    let reloaded = ExampleStore::empty();
    assert!(reloaded.load(&path));
    assert_eq!(reloaded.snapshot(), store.snapshot());
    assert_eq!(
        reloaded.examples().last().map(|e| e.sql.as_str()),
        Some("SELECT * FROM refunds")
    );
}

#[test]
fn test_save_to_unwritable_path_reports_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no-such-dir").join("examples.json");
    assert!(!ExampleStore::new().save(path));
}

#[tokio::test]
async fn test_service_from_config_uses_files() {
    let dir = TempDir::new().unwrap();
    let schema_path = dir.path().join("schema.json");
    let examples_path = dir.path().join("examples.json");
    std::fs::write(&schema_path, COMMERCE_SCHEMA).unwrap();
    std::fs::write(&examples_path, EXAMPLES_DOCUMENT).unwrap();

    let env: HashMap<&str, String> = HashMap::from([
        ("SCHEMA_FILE", schema_path.display().to_string()),
        ("EXAMPLES_FILE", examples_path.display().to_string()),
    ]);
    let config = AppConfig::from_lookup(|key| env.get(key).cloned()).unwrap();
    let service = Nl2SqlService::from_config(&config).await.unwrap();

    assert!(!service.is_connected());
    assert_eq!(service.schema().summary.total_tables, 4);
    assert_eq!(service.schema().summary.total_relationships, 2);
    assert_eq!(service.example_store().len(), 2);

    let outcome = service
        .generate("Show me all users", &GenerateOptions::default())
        .await
        .unwrap();
    assert_eq!(outcome.generated_sql, "SELECT * FROM users");
    assert_eq!(outcome.examples_used, 1);
}
