//! Schema diffing - compare two [`Schema`] values.
//!
//! This module compares a desired schema against a current one and produces
//! the list of changes that turns the current schema into the desired one.
//! Migrations are built from this: each migration's SQL is the diff between
//! its target schema and the previous migration's target.
//!
//! Columns are matched by name, so reordering columns in a descriptor is
//! not a change. That includes key columns: a primary key is compared as a
//! set of column names. Within one table, changes are ordered so the generated SQL
//! can run top to bottom:
//!
//! 1. drop the primary key (if it changes)
//! 2. add columns
//! 3. drop columns
//! 4. alter type, nullability, default
//! 5. add the new primary key

use crate::schema::create_table_sql;
use catalog_db_schema::{Column, PgType, Schema, Table};
use catalog_sql::{primary_key_constraint_name, quote_ident};
use std::collections::HashSet;

/// A diff between two schemas.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaDiff {
    /// Changes organized by table, sorted by table name.
    pub table_diffs: Vec<TableDiff>,
}

impl SchemaDiff {
    /// Returns true if there are no differences.
    pub fn is_empty(&self) -> bool {
        self.table_diffs.is_empty()
    }

    /// Count total number of changes.
    pub fn change_count(&self) -> usize {
        self.table_diffs.iter().map(|t| t.changes.len()).sum()
    }

    /// One SQL statement per change, in application order.
    pub fn statements(&self) -> Vec<String> {
        self.table_diffs
            .iter()
            .flat_map(|td| td.changes.iter().map(|c| c.to_sql(&td.table)))
            .collect()
    }

    /// Generate SQL statements for all changes in this diff.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        for table_diff in &self.table_diffs {
            sql.push_str(&format!("-- Table: {}\n", table_diff.table));
            for change in &table_diff.changes {
                sql.push_str(&change.to_sql(&table_diff.table));
                sql.push('\n');
            }
            sql.push('\n');
        }
        sql
    }
}

/// Changes for a single table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDiff {
    /// Table name.
    pub table: String,
    /// List of changes.
    pub changes: Vec<Change>,
}

/// A single schema change.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Add a new table.
    AddTable(Table),
    /// Drop an existing table.
    DropTable(String),
    /// Add a new column.
    AddColumn(Column),
    /// Drop an existing column.
    DropColumn(String),
    /// Change a column's type.
    AlterColumnType {
        name: String,
        from: PgType,
        to: PgType,
    },
    /// Change a column's nullability.
    AlterColumnNullable { name: String, from: bool, to: bool },
    /// Change a column's default value.
    AlterColumnDefault {
        name: String,
        from: Option<String>,
        to: Option<String>,
    },
    /// Add a primary key.
    AddPrimaryKey(Vec<String>),
    /// Drop the primary key.
    DropPrimaryKey,
}

impl Change {
    /// Generate SQL statement for this change.
    ///
    /// The `table_name` is required for column-level changes.
    pub fn to_sql(&self, table_name: &str) -> String {
        let table = quote_ident(table_name);
        match self {
            Change::AddTable(t) => create_table_sql(t),
            Change::DropTable(name) => format!("DROP TABLE {};", quote_ident(name)),
            Change::AddColumn(col) => {
                let not_null = if col.nullable { "" } else { " NOT NULL" };
                let default = col
                    .default
                    .as_ref()
                    .map(|d| format!(" DEFAULT {}", d))
                    .unwrap_or_default();
                format!(
                    "ALTER TABLE {} ADD COLUMN {} {}{}{};",
                    table,
                    quote_ident(&col.name),
                    col.pg_type,
                    not_null,
                    default
                )
            }
            Change::DropColumn(name) => {
                format!("ALTER TABLE {} DROP COLUMN {};", table, quote_ident(name))
            }
            Change::AlterColumnType { name, to, .. } => {
                let col = quote_ident(name);
                format!(
                    "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::{};",
                    table, col, to, col, to
                )
            }
            Change::AlterColumnNullable { name, to, .. } => {
                let action = if *to { "DROP NOT NULL" } else { "SET NOT NULL" };
                format!(
                    "ALTER TABLE {} ALTER COLUMN {} {};",
                    table,
                    quote_ident(name),
                    action
                )
            }
            Change::AlterColumnDefault { name, to, .. } => match to {
                Some(default) => format!(
                    "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {};",
                    table,
                    quote_ident(name),
                    default
                ),
                None => format!(
                    "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT;",
                    table,
                    quote_ident(name)
                ),
            },
            Change::AddPrimaryKey(cols) => {
                let quoted: Vec<_> = cols.iter().map(|c| quote_ident(c)).collect();
                format!(
                    "ALTER TABLE {} ADD PRIMARY KEY ({});",
                    table,
                    quoted.join(", ")
                )
            }
            Change::DropPrimaryKey => format!(
                "ALTER TABLE {} DROP CONSTRAINT {};",
                table,
                quote_ident(&primary_key_constraint_name(table_name))
            ),
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::AddTable(t) => write!(f, "+ table {}", t.name),
            Change::DropTable(name) => write!(f, "- table {}", name),
            Change::AddColumn(col) => {
                let nullable = if col.nullable { " (nullable)" } else { "" };
                write!(f, "+ {}: {}{}", col.name, col.pg_type, nullable)
            }
            Change::DropColumn(name) => write!(f, "- {}", name),
            Change::AlterColumnType { name, from, to } => {
                write!(f, "~ {}: {} -> {}", name, from, to)
            }
            Change::AlterColumnNullable { name, from, to } => {
                let from_str = if *from { "nullable" } else { "not null" };
                let to_str = if *to { "nullable" } else { "not null" };
                write!(f, "~ {}: {} -> {}", name, from_str, to_str)
            }
            Change::AlterColumnDefault { name, from, to } => {
                let from_str = from.as_deref().unwrap_or("(none)");
                let to_str = to.as_deref().unwrap_or("(none)");
                write!(f, "~ {} default: {} -> {}", name, from_str, to_str)
            }
            Change::AddPrimaryKey(cols) => write!(f, "+ PRIMARY KEY ({})", cols.join(", ")),
            Change::DropPrimaryKey => write!(f, "- PRIMARY KEY"),
        }
    }
}

impl std::fmt::Display for SchemaDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            writeln!(f, "No changes detected.")?;
        } else {
            writeln!(f, "Changes detected:\n")?;
            for table_diff in &self.table_diffs {
                writeln!(f, "  {}:", table_diff.table)?;
                for change in &table_diff.changes {
                    writeln!(f, "    {}", change)?;
                }
            }
        }
        Ok(())
    }
}

/// Extension trait for Schema to add diffing.
pub trait SchemaDiffExt {
    /// Compare this schema (desired) against another schema (current).
    ///
    /// Returns the changes needed to transform `current` into `self`.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog::{Schema, SchemaDiffExt};
    ///
    /// let desired = catalog::schema();
    /// let diff = desired.diff(&Schema::new());
    /// assert_eq!(diff.change_count(), 1);
    /// assert!(desired.diff(&desired).is_empty());
    /// ```
    fn diff(&self, current: &Schema) -> SchemaDiff;
}

impl SchemaDiffExt for Schema {
    fn diff(&self, current: &Schema) -> SchemaDiff {
        let mut table_diffs = Vec::new();

        for desired_table in self.iter_tables() {
            match current.get_table(&desired_table.name) {
                None => table_diffs.push(TableDiff {
                    table: desired_table.name.clone(),
                    changes: vec![Change::AddTable(desired_table.clone())],
                }),
                Some(current_table) => {
                    let changes = diff_table(desired_table, current_table);
                    if !changes.is_empty() {
                        table_diffs.push(TableDiff {
                            table: desired_table.name.clone(),
                            changes,
                        });
                    }
                }
            }
        }

        for current_table in current.iter_tables() {
            if self.get_table(&current_table.name).is_none() {
                table_diffs.push(TableDiff {
                    table: current_table.name.clone(),
                    changes: vec![Change::DropTable(current_table.name.clone())],
                });
            }
        }

        // Sort by table name for consistent output
        table_diffs.sort_by(|a, b| a.table.cmp(&b.table));

        SchemaDiff { table_diffs }
    }
}

fn sorted<'a>(names: &[&'a str]) -> Vec<&'a str> {
    let mut names = names.to_vec();
    names.sort_unstable();
    names
}

/// Diff two tables with the same name.
fn diff_table(desired: &Table, current: &Table) -> Vec<Change> {
    let mut changes = Vec::new();

    let desired_pk = desired.primary_key();
    let current_pk = current.primary_key();
    // Key columns follow declaration order; only membership counts.
    let pk_changed = sorted(&desired_pk) != sorted(&current_pk);

    if pk_changed && !current_pk.is_empty() {
        changes.push(Change::DropPrimaryKey);
    }

    changes.extend(diff_columns(&desired.columns, &current.columns));

    if pk_changed && !desired_pk.is_empty() {
        changes.push(Change::AddPrimaryKey(
            desired_pk.iter().map(|c| c.to_string()).collect(),
        ));
    }

    changes
}

/// Diff columns between desired and current state.
fn diff_columns(desired: &[Column], current: &[Column]) -> Vec<Change> {
    let mut changes = Vec::new();

    let desired_names: HashSet<&str> = desired.iter().map(|c| c.name.as_str()).collect();
    let current_names: HashSet<&str> = current.iter().map(|c| c.name.as_str()).collect();

    // Columns to add
    for col in desired {
        if !current_names.contains(col.name.as_str()) {
            changes.push(Change::AddColumn(col.clone()));
        }
    }

    // Columns to drop
    for col in current {
        if !desired_names.contains(col.name.as_str()) {
            changes.push(Change::DropColumn(col.name.clone()));
        }
    }

    // Columns in both - check for changes
    for desired_col in desired {
        let Some(current_col) = current.iter().find(|c| c.name == desired_col.name) else {
            continue;
        };

        if desired_col.pg_type != current_col.pg_type {
            changes.push(Change::AlterColumnType {
                name: desired_col.name.clone(),
                from: current_col.pg_type,
                to: desired_col.pg_type,
            });
        }

        if desired_col.nullable != current_col.nullable {
            changes.push(Change::AlterColumnNullable {
                name: desired_col.name.clone(),
                from: current_col.nullable,
                to: desired_col.nullable,
            });
        }

        if desired_col.default != current_col.default {
            changes.push(Change::AlterColumnDefault {
                name: desired_col.name.clone(),
                from: current_col.default.clone(),
                to: desired_col.default.clone(),
            });
        }

        // Primary key membership is compared at table level
    }

    changes
}
