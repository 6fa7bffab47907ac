//! The bookkeeping table that records applied migrations.

use crate::PlannedMigration;
use crate::schema::create_table_if_not_exists_sql;
use catalog_db_schema::{Column, PgType, Table};
use catalog_sql::{Lit, quote_ident};

/// Table name used when none is configured.
pub const DEFAULT_META_TABLE: &str = "__catalog_migrations";

/// Shape of the bookkeeping table.
pub fn meta_table(name: &str) -> Table {
    Table::new(name)
        .with_column(Column::new("version", PgType::Text).primary_key())
        .with_column(Column::new("name", PgType::Text))
        .with_column(Column::new("checksum", PgType::Text))
        .with_column(Column::new("applied_at", PgType::Timestamptz).default_expr("now()"))
}

/// SQL that creates the bookkeeping table if it is missing.
pub fn create_meta_table_sql(name: &str) -> String {
    create_table_if_not_exists_sql(&meta_table(name))
}

/// SQL listing applied migrations, oldest first.
pub fn select_applied_sql(name: &str) -> String {
    format!(
        "SELECT \"version\", \"name\", \"checksum\", \"applied_at\" FROM {} ORDER BY \"version\"",
        quote_ident(name)
    )
}

/// SQL recording one migration as applied.
///
/// Values are inlined as literals so the statement can travel in the same
/// simple-query batch as the migration itself.
pub fn record_migration_sql(name: &str, migration: &PlannedMigration) -> String {
    format!(
        "INSERT INTO {} (\"version\", \"name\", \"checksum\") VALUES ({}, {}, {});",
        quote_ident(name),
        Lit(&migration.version),
        Lit(&migration.name),
        Lit(&migration.checksum)
    )
}

/// The full batch for one migration: its statements, then the bookkeeping
/// insert.
///
/// Postgres runs a multi-statement simple query as one implicit
/// transaction, so either all of it lands or none of it does.
pub fn apply_migration_sql(name: &str, migration: &PlannedMigration) -> String {
    let mut sql = migration.to_sql();
    sql.push('\n');
    sql.push_str(&record_migration_sql(name, migration));
    sql
}
