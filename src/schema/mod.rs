//! Schema Catalog
//!
//! Immutable snapshot of table/column/key metadata. Produced by introspection
//! (or loaded from a JSON snapshot) and read, never mutated, by the pipeline.

pub mod introspect;

pub use introspect::introspect;

use crate::error::{Nl2SqlError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub default: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub constrained_columns: Vec<String>,
    pub referred_table: String,
    pub referred_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    #[serde(default)]
    pub column_names: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub indexes: Vec<Index>,
}

impl TableSchema {
    pub fn with_columns(columns: Vec<Column>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                let lower = name.to_lowercase();
                self.columns.iter().find(|c| c.name == lower)
            })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

/// Flattened foreign-key edge between two tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub total_tables: usize,
    pub total_columns: usize,
    pub total_relationships: usize,
}

/// Table name -> table metadata, plus derived relationships and summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    #[serde(default)]
    pub tables: BTreeMap<String, TableSchema>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub summary: SchemaSummary,
}

impl SchemaCatalog {
    /// Build a catalog and derive its relationships and summary.
    pub fn from_tables(tables: BTreeMap<String, TableSchema>) -> Self {
        let relationships: Vec<Relationship> = tables
            .iter()
            .flat_map(|(table_name, table)| {
                table.foreign_keys.iter().filter_map(move |fk| {
                    Some(Relationship {
                        from_table: table_name.clone(),
                        from_column: fk.constrained_columns.first()?.clone(),
                        to_table: fk.referred_table.clone(),
                        to_column: fk.referred_columns.first()?.clone(),
                    })
                })
            })
            .collect();

        let summary = SchemaSummary {
            total_tables: tables.len(),
            total_columns: tables.values().map(|t| t.columns.len()).sum(),
            total_relationships: relationships.len(),
        };

        Self {
            tables,
            relationships,
            summary,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let catalog: SchemaCatalog = serde_json::from_str(raw)?;
        // Snapshots written by hand often omit the derived parts.
        Ok(Self::from_tables(catalog.tables))
    }

    /// Load a catalog snapshot written in the introspection JSON format.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Nl2SqlError::Schema(format!("Failed to read schema file {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Flat, sorted list of table names.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    /// Exact lookup first, then the lowercase spelling (unquoted identifiers fold to lowercase).
    pub fn resolve_table(&self, name: &str) -> Option<(&str, &TableSchema)> {
        self.tables
            .get_key_value(name)
            .or_else(|| self.tables.get_key_value(name.to_lowercase().as_str()))
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn column_names(&self, table: &str) -> Vec<String> {
        self.table(table)
            .map(|t| t.columns.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Render the catalog as prompt context for a generative model.
    pub fn format_for_prompt(&self) -> String {
        if self.tables.is_empty() {
            return "No schema information available".to_string();
        }

        let mut formatted = String::from("Database Schema:\n\n");
        for (table_name, table) in &self.tables {
            formatted.push_str(&format!("Table: {}\n", table_name));

            for column in &table.columns {
                let nullable = if column.nullable { "NULL" } else { "NOT NULL" };
                formatted.push_str(&format!(
                    "  - {}: {} ({})\n",
                    column.name, column.data_type, nullable
                ));
            }

            if !table.primary_keys.is_empty() {
                formatted.push_str(&format!("  Primary Key: {}\n", table.primary_keys.join(", ")));
            }

            for fk in &table.foreign_keys {
                if let (Some(from_col), Some(to_col)) =
                    (fk.constrained_columns.first(), fk.referred_columns.first())
                {
                    formatted.push_str(&format!(
                        "  Foreign Key: {} -> {}.{}\n",
                        from_col, fk.referred_table, to_col
                    ));
                }
            }

            formatted.push('\n');
        }

        formatted
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// The sample commerce schema used across unit tests.
    pub fn commerce_catalog() -> SchemaCatalog {
        let mut tables = BTreeMap::new();

        tables.insert(
            "users".to_string(),
            TableSchema {
                columns: vec![
                    Column::new("id", "INTEGER").not_null(),
                    Column::new("username", "VARCHAR(50)").not_null(),
                    Column::new("email", "VARCHAR(100)").not_null(),
                    Column::new("created_at", "TIMESTAMP"),
                ],
                primary_keys: vec!["id".to_string()],
                ..TableSchema::default()
            },
        );
        tables.insert(
            "categories".to_string(),
            TableSchema {
                columns: vec![
                    Column::new("id", "INTEGER").not_null(),
                    Column::new("name", "VARCHAR(100)").not_null(),
                ],
                primary_keys: vec!["id".to_string()],
                ..TableSchema::default()
            },
        );
        tables.insert(
            "products".to_string(),
            TableSchema {
                columns: vec![
                    Column::new("id", "INTEGER").not_null(),
                    Column::new("name", "VARCHAR(200)").not_null(),
                    Column::new("price", "NUMERIC(10,2)").not_null(),
                    Column::new("category_id", "INTEGER"),
                    Column::new("stock_quantity", "INTEGER"),
                ],
                primary_keys: vec!["id".to_string()],
                foreign_keys: vec![ForeignKey {
                    constrained_columns: vec!["category_id".to_string()],
                    referred_table: "categories".to_string(),
                    referred_columns: vec!["id".to_string()],
                }],
                ..TableSchema::default()
            },
        );
        tables.insert(
            "orders".to_string(),
            TableSchema {
                columns: vec![
                    Column::new("id", "INTEGER").not_null(),
                    Column::new("user_id", "INTEGER"),
                    Column::new("order_date", "TIMESTAMP"),
                    Column::new("order_total", "NUMERIC(10,2)").not_null(),
                    Column::new("status", "VARCHAR(20)"),
                ],
                primary_keys: vec!["id".to_string()],
                foreign_keys: vec![ForeignKey {
                    constrained_columns: vec!["user_id".to_string()],
                    referred_table: "users".to_string(),
                    referred_columns: vec!["id".to_string()],
                }],
                ..TableSchema::default()
            },
        );

        SchemaCatalog::from_tables(tables)
    }
}
