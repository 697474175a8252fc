#![allow(dead_code)]

use nl2sql::{ExampleStore, Nl2SqlService, SchemaCatalog};

pub const COMMERCE_SCHEMA: &str = include_str!("../fixtures/commerce_schema.json");

pub fn commerce_catalog() -> SchemaCatalog {
    SchemaCatalog::from_json_str(COMMERCE_SCHEMA).expect("fixture schema parses")
}

pub fn commerce_service() -> Nl2SqlService {
    Nl2SqlService::new(commerce_catalog(), ExampleStore::new())
}
