//! Schema and migrations for the product catalog, on Postgres.
//!
//! This crate provides:
//! - Hand-written table descriptors for each entity ([`Entity`])
//! - DDL generation for those descriptors
//! - Schema diffing between two [`Schema`] values
//! - Versioned migrations, each one a frozen snapshot of the schema it
//!   leads to, applied by [`MigrationRunner`]
//!
//! # Descriptors
//!
//! A descriptor is plain data. Nothing is inferred from the model struct:
//!
//! ```
//! use catalog::{Entity, Product};
//!
//! let table = Product::describe();
//! let code = table.column("Code").unwrap();
//! assert_eq!(code.max_length(), Some(64));
//! assert!(code.primary_key);
//! ```
//!
//! # Migrations
//!
//! Each migration stores the schema it produces. The SQL is never written
//! by hand; it is the diff between a migration's target and the target of
//! the migration before it:
//!
//! ```ignore
//! let set = catalog::migrations()?;
//! let runner = MigrationRunner::new(&client, &set);
//! runner.migrate().await?;
//! ```

use std::future::Future;
use std::pin::Pin;

mod diff;
mod error;
pub mod meta;
mod migrate;
pub mod migrations;
pub mod product;
pub mod schema;
mod traced;

pub use catalog_db_schema::{Column, PgType, Schema, SchemaError, Table};
pub use diff::{Change, SchemaDiff, SchemaDiffExt, TableDiff};
pub use error::Error;
pub use migrate::{
    AppliedMigration, Migration, MigrationBackend, MigrationRunner, MigrationSet, MigrationStatus,
    PlannedMigration, RanMigration,
};
pub use product::Product;
pub use schema::SchemaCodegen;
pub use traced::TracedConn;

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed future returned by [`MigrationBackend`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type that owns a table and can describe it.
///
/// Implementations are written by hand and kept next to the model type,
/// so a change to the table shows up in review as a change to this impl.
pub trait Entity {
    /// Name of the table.
    const TABLE: &'static str;

    /// The table's current shape: columns in order, types, nullability,
    /// defaults and primary key.
    fn describe() -> Table;
}

/// The application schema: one table per entity.
pub fn schema() -> Schema {
    Schema::new().with_table(Product::describe())
}

/// The application's migrations, ordered by version.
pub fn migrations() -> Result<MigrationSet> {
    MigrationSet::new(migrations::all())
}
