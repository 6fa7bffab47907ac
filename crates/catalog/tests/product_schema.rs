//! The products table as the rest of the system relies on it.

use catalog::schema::create_table_sql;
use catalog::{Entity, PgType, Product, Schema, SchemaCodegen, SchemaDiffExt};

#[test]
fn products_has_expected_columns() {
    let table = Product::describe();
    assert_eq!(table.name, "products");
    assert_eq!(Product::TABLE, "products");

    let columns: Vec<(&str, PgType, bool)> = table
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.pg_type, c.nullable))
        .collect();

    assert_eq!(
        columns,
        vec![
            ("Code", PgType::VarChar(64), false),
            ("Name", PgType::VarChar(128), true),
            ("Description", PgType::VarChar(1024), true),
            ("ImageUrl", PgType::VarChar(128), false),
            ("Kind", PgType::Text, false),
            ("Status", PgType::Text, true),
            ("IsPackage", PgType::Boolean, false),
            ("AvailabilityStart", PgType::Timestamp, true),
            ("AvailabilityEnd", PgType::Timestamp, true),
        ]
    );
}

#[test]
fn code_is_the_only_key() {
    let table = Product::describe();
    assert_eq!(table.primary_key(), vec!["Code"]);

    let code = table.column("Code").unwrap();
    assert_eq!(code.max_length(), Some(64));
    assert!(!code.nullable);
    assert!(code.default.is_none());
}

#[test]
fn is_package_defaults_to_false() {
    let table = Product::describe();
    let col = table.column("IsPackage").unwrap();
    assert_eq!(col.default.as_deref(), Some("false"));
    assert!(!col.nullable);

    // no other column has a default
    let with_default: Vec<_> = table
        .columns
        .iter()
        .filter(|c| c.default.is_some())
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(with_default, vec!["IsPackage"]);
}

#[test]
fn free_text_lengths() {
    let table = Product::describe();
    assert_eq!(table.column("Kind").unwrap().max_length(), None);
    assert_eq!(table.column("Status").unwrap().max_length(), None);
    assert_eq!(table.column("Description").unwrap().max_length(), Some(1024));
}

#[test]
fn snapshot_round_trips_through_json() {
    let schema = catalog::schema();
    let json = schema.to_json().unwrap();
    let parsed = Schema::from_json(&json).unwrap();
    assert_eq!(parsed, schema);
    assert!(parsed.diff(&schema).is_empty());
}

#[test]
fn migrations_produce_the_current_schema() {
    let set = catalog::migrations().unwrap();
    assert_eq!(set.latest_target(), catalog::schema());
    assert!(set.pending_schema_changes(&catalog::schema()).is_empty());

    let planned = set.plan().unwrap();
    assert_eq!(planned.len(), 1);
    assert_eq!(planned[0].version, "2022_07_05_145139-initial");
    assert_eq!(planned[0].statements, catalog::schema().statements());
}

#[test]
fn initial_migration_checksum_is_stable() {
    let a = catalog::migrations().unwrap().plan().unwrap();
    let b = catalog::migrations().unwrap().plan().unwrap();
    assert_eq!(a[0].checksum, b[0].checksum);
    assert_eq!(a[0].checksum.len(), 64);
}

#[test]
fn snapshot_products_ddl() {
    insta::assert_snapshot!(create_table_sql(&Product::describe()), @r#"
    CREATE TABLE "products" (
        "Code" character varying(64) PRIMARY KEY,
        "Name" character varying(128),
        "Description" character varying(1024),
        "ImageUrl" character varying(128) NOT NULL,
        "Kind" text NOT NULL,
        "Status" text,
        "IsPackage" boolean NOT NULL DEFAULT false,
        "AvailabilityStart" timestamp without time zone,
        "AvailabilityEnd" timestamp without time zone
    );
    "#);
}
