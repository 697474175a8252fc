//! PostgreSQL introspection
//!
//! Reads `information_schema` and the `pg_index` catalog for the `public`
//! schema and assembles a [`SchemaCatalog`] snapshot.

use crate::error::Result;
use crate::schema::{Column, ForeignKey, Index, SchemaCatalog, TableSchema};
use itertools::Itertools;
use sqlx::PgPool;
use std::collections::BTreeMap;
use tracing::{debug, info};

// information_schema exposes domain types (sql_identifier, yes_or_no); cast to text so
// they decode as String.
const COLUMNS_SQL: &str = r#"
    SELECT table_name::text, column_name::text, data_type::text, is_nullable::text, column_default::text
    FROM information_schema.columns
    WHERE table_schema = 'public'
    ORDER BY table_name, ordinal_position
"#;

const PRIMARY_KEYS_SQL: &str = r#"
    SELECT tc.table_name::text, kcu.column_name::text
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
      ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema
    WHERE tc.constraint_type = 'PRIMARY KEY' AND tc.table_schema = 'public'
    ORDER BY tc.table_name, kcu.ordinal_position
"#;

const FOREIGN_KEYS_SQL: &str = r#"
    SELECT tc.constraint_name::text, tc.table_name::text, kcu.column_name::text,
           ccu.table_name::text, ccu.column_name::text
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
      ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema
    JOIN information_schema.constraint_column_usage ccu
      ON ccu.constraint_name = tc.constraint_name AND ccu.table_schema = tc.table_schema
    WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = 'public'
    ORDER BY tc.table_name, tc.constraint_name, kcu.ordinal_position
"#;

const INDEXES_SQL: &str = r#"
    SELECT t.relname::text, i.relname::text, a.attname::text, ix.indisunique
    FROM pg_class t
    JOIN pg_index ix ON t.oid = ix.indrelid
    JOIN pg_class i ON i.oid = ix.indexrelid
    JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
    JOIN pg_namespace n ON n.oid = t.relnamespace
    WHERE n.nspname = 'public' AND t.relkind = 'r' AND NOT ix.indisprimary
    ORDER BY t.relname, i.relname
"#;

type ColumnRow = (String, String, String, String, Option<String>);
type ForeignKeyRow = (String, String, String, String, String);
type IndexRow = (String, String, String, bool);

/// Build a catalog snapshot from a live PostgreSQL database.
pub async fn introspect(pool: &PgPool) -> Result<SchemaCatalog> {
    let mut tables: BTreeMap<String, TableSchema> = BTreeMap::new();

    let columns: Vec<ColumnRow> = sqlx::query_as(COLUMNS_SQL).fetch_all(pool).await?;
    for (table_name, column_name, data_type, is_nullable, column_default) in columns {
        tables.entry(table_name).or_default().columns.push(Column {
            name: column_name,
            data_type: data_type.to_uppercase(),
            nullable: is_nullable.eq_ignore_ascii_case("YES"),
            default: column_default,
        });
    }

    let primary_keys: Vec<(String, String)> =
        sqlx::query_as(PRIMARY_KEYS_SQL).fetch_all(pool).await?;
    for (table_name, column_name) in primary_keys {
        if let Some(table) = tables.get_mut(&table_name) {
            table.primary_keys.push(column_name);
        }
    }

    let foreign_keys: Vec<ForeignKeyRow> = sqlx::query_as(FOREIGN_KEYS_SQL).fetch_all(pool).await?;
    let grouped = foreign_keys
        .into_iter()
        .group_by(|(constraint, table, _, _, _)| (constraint.clone(), table.clone()));
    for ((constraint, table_name), rows) in &grouped {
        let rows: Vec<ForeignKeyRow> = rows.collect();
        let Some(table) = tables.get_mut(&table_name) else {
            continue;
        };
        let referred_table = rows
            .first()
            .map(|(_, _, _, referred, _)| referred.clone())
            .unwrap_or_default();
        debug!("Foreign key {} on {} -> {}", constraint, table_name, referred_table);
        table.foreign_keys.push(ForeignKey {
            constrained_columns: rows.iter().map(|r| r.2.clone()).unique().collect(),
            referred_table,
            referred_columns: rows.iter().map(|r| r.4.clone()).unique().collect(),
        });
    }

    let indexes: Vec<IndexRow> = sqlx::query_as(INDEXES_SQL).fetch_all(pool).await?;
    let grouped = indexes
        .into_iter()
        .group_by(|(table, index, _, _)| (table.clone(), index.clone()));
    for ((table_name, index_name), rows) in &grouped {
        let rows: Vec<IndexRow> = rows.collect();
        if let Some(table) = tables.get_mut(&table_name) {
            table.indexes.push(Index {
                name: index_name,
                unique: rows.first().map(|r| r.3).unwrap_or(false),
                column_names: rows.into_iter().map(|r| r.2).collect(),
            });
        }
    }

    let catalog = SchemaCatalog::from_tables(tables);
    info!(
        "Schema extracted: {} tables, {} columns, {} relationships",
        catalog.summary.total_tables,
        catalog.summary.total_columns,
        catalog.summary.total_relationships
    );
    Ok(catalog)
}
