//! DDL generation for schema descriptors.
//!
//! ## Example
//!
//! ```
//! use catalog::schema::create_table_sql;
//! use catalog::{Column, PgType, Table};
//!
//! let table = Table::new("tag")
//!     .with_column(Column::new("Slug", PgType::VarChar(32)).primary_key())
//!     .with_column(Column::new("Label", PgType::Text).nullable());
//!
//! assert_eq!(
//!     create_table_sql(&table),
//!     "CREATE TABLE \"tag\" (\n    \"Slug\" character varying(32) PRIMARY KEY,\n    \"Label\" text\n);"
//! );
//! ```

pub mod codegen;

use catalog_db_schema::{Column, Schema, Table};
use catalog_sql::quote_ident;

/// Extension trait for Schema to add SQL generation.
pub trait SchemaCodegen {
    /// Generate SQL to create all tables.
    fn to_sql(&self) -> String;

    /// The same SQL, one statement per element.
    fn statements(&self) -> Vec<String>;
}

impl SchemaCodegen for Schema {
    fn to_sql(&self) -> String {
        codegen::schema_to_sql(self)
    }

    fn statements(&self) -> Vec<String> {
        self.iter_tables().map(create_table_sql).collect()
    }
}

/// Generate CREATE TABLE SQL statement.
pub fn create_table_sql(table: &Table) -> String {
    create_table_statement(table, false)
}

/// Generate CREATE TABLE IF NOT EXISTS SQL statement.
pub fn create_table_if_not_exists_sql(table: &Table) -> String {
    create_table_statement(table, true)
}

fn create_table_statement(table: &Table, if_not_exists: bool) -> String {
    let mut sql = format!(
        "CREATE TABLE {}{} (\n",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        quote_ident(&table.name)
    );

    let pk_columns = table.primary_key();

    // If there's more than one PK column, we need a table constraint
    let use_table_pk_constraint = pk_columns.len() > 1;

    let mut parts: Vec<String> = table
        .columns
        .iter()
        .map(|col| format!("    {}", column_definition(col, use_table_pk_constraint)))
        .collect();

    if use_table_pk_constraint {
        let quoted_pk_cols: Vec<_> = pk_columns.iter().map(|c| quote_ident(c)).collect();
        parts.push(format!("    PRIMARY KEY ({})", quoted_pk_cols.join(", ")));
    }

    sql.push_str(&parts.join(",\n"));
    sql.push_str("\n);");

    sql
}

/// Column definition as used inside CREATE TABLE.
///
/// With `composite_pk` set, key columns get an explicit NOT NULL instead of
/// an inline PRIMARY KEY.
pub fn column_definition(col: &Column, composite_pk: bool) -> String {
    let mut def = format!("{} {}", quote_ident(&col.name), col.pg_type);

    if col.primary_key && !composite_pk {
        def.push_str(" PRIMARY KEY");
    }

    // PRIMARY KEY already implies NOT NULL
    if !col.nullable && (!col.primary_key || composite_pk) {
        def.push_str(" NOT NULL");
    }

    if let Some(default) = &col.default {
        def.push_str(&format!(" DEFAULT {}", default));
    }

    def
}
