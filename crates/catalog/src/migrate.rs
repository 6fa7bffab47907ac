//! Versioned migrations and the runner that applies them.
//!
//! A [`Migration`] does not carry SQL. It carries the schema the database
//! should have once it has run. The SQL for migration `n` is the diff
//! between its target and the target of migration `n - 1` (the empty schema
//! for the first one), so the statements can never drift from the
//! descriptors they were derived from.
//!
//! Applied migrations are recorded in a bookkeeping table together with a
//! checksum of their SQL. A recorded checksum that no longer matches means
//! a migration file was edited after it ran, which is refused.

use crate::diff::{SchemaDiff, SchemaDiffExt};
use crate::meta::{self, DEFAULT_META_TABLE};
use crate::traced::TracedConn;
use crate::{BoxFuture, Error, Result};
use catalog_db_schema::Schema;
use catalog_sql::statements_checksum;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A migration: a version, a name, and the schema it leads to.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Sortable version, e.g. `2022_07_05_145139-initial`.
    pub version: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// The schema once this migration has run.
    pub target: fn() -> Schema,
}

impl Migration {
    pub const fn new(version: &'static str, name: &'static str, target: fn() -> Schema) -> Self {
        Self {
            version,
            name,
            target,
        }
    }
}

/// A migration with its SQL computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMigration {
    pub version: String,
    pub name: String,
    /// Statements in application order.
    pub statements: Vec<String>,
    /// Checksum of `statements`, recorded when the migration is applied.
    pub checksum: String,
}

impl PlannedMigration {
    /// The statements as one script.
    pub fn to_sql(&self) -> String {
        self.statements.join("\n")
    }
}

/// A row of the bookkeeping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: String,
    pub name: String,
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
}

/// Status of one known migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub version: String,
    pub name: String,
    /// When it was applied, if it was.
    pub applied_at: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}

/// A migration applied by [`MigrationRunner::migrate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RanMigration {
    pub version: String,
    pub name: String,
    pub statement_count: usize,
}

/// All known migrations, sorted by version.
#[derive(Debug, Clone)]
pub struct MigrationSet {
    migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Sort migrations by version. Two migrations may not share a version.
    pub fn new(mut migrations: Vec<Migration>) -> Result<Self> {
        migrations.sort_by(|a, b| a.version.cmp(b.version));

        if let Some(pair) = migrations.windows(2).find(|w| w[0].version == w[1].version) {
            return Err(Error::DuplicateMigration {
                version: pair[0].version.to_string(),
            });
        }

        Ok(Self { migrations })
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    /// Target of the newest migration, or the empty schema if there is none.
    pub fn latest_target(&self) -> Schema {
        self.migrations
            .last()
            .map(|m| (m.target)())
            .unwrap_or_default()
    }

    /// Compute the SQL of every migration.
    ///
    /// Fails if a target is not a valid schema, or if a migration does not
    /// change anything relative to the one before it.
    pub fn plan(&self) -> Result<Vec<PlannedMigration>> {
        let mut previous = Schema::new();
        let mut planned = Vec::with_capacity(self.migrations.len());

        for migration in &self.migrations {
            let target = (migration.target)();
            target.validate()?;

            let diff = target.diff(&previous);
            if diff.is_empty() {
                return Err(Error::EmptyMigration {
                    version: migration.version.to_string(),
                });
            }

            let statements = diff.statements();
            let checksum = statements_checksum(&statements);
            planned.push(PlannedMigration {
                version: migration.version.to_string(),
                name: migration.name.to_string(),
                statements,
                checksum,
            });

            previous = target;
        }

        Ok(planned)
    }

    /// Changes in `desired` that no migration covers yet.
    ///
    /// Empty when the newest migration's target matches `desired`.
    pub fn pending_schema_changes(&self, desired: &Schema) -> SchemaDiff {
        desired.diff(&self.latest_target())
    }
}

/// Where migrations are recorded and applied.
///
/// Implemented for [`tokio_postgres::Client`]. Methods return boxed futures
/// so the trait stays object safe.
pub trait MigrationBackend: Send + Sync {
    /// Create the bookkeeping table if it does not exist.
    fn ensure_meta_table<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Applied migrations, oldest first.
    fn applied<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<Vec<AppliedMigration>>>;

    /// Run a migration and record it, atomically.
    fn apply<'a>(
        &'a self,
        table: &'a str,
        migration: &'a PlannedMigration,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Applies a [`MigrationSet`] through a [`MigrationBackend`].
pub struct MigrationRunner<'a, B: MigrationBackend + ?Sized> {
    backend: &'a B,
    set: &'a MigrationSet,
    meta_table: String,
}

impl<'a, B: MigrationBackend + ?Sized> MigrationRunner<'a, B> {
    pub fn new(backend: &'a B, set: &'a MigrationSet) -> Self {
        Self {
            backend,
            set,
            meta_table: DEFAULT_META_TABLE.to_string(),
        }
    }

    /// Use a different bookkeeping table.
    pub fn with_meta_table(mut self, table: impl Into<String>) -> Self {
        self.meta_table = table.into();
        self
    }

    /// Plan all migrations and check them against what the database recorded.
    async fn reconcile(&self) -> Result<(Vec<PlannedMigration>, HashMap<String, AppliedMigration>)> {
        self.backend.ensure_meta_table(&self.meta_table).await?;
        let applied = self.backend.applied(&self.meta_table).await?;
        let planned = self.set.plan()?;

        let mut by_version = HashMap::with_capacity(applied.len());
        for row in applied {
            let Some(known) = planned.iter().find(|p| p.version == row.version) else {
                return Err(Error::UnknownMigration {
                    version: row.version,
                });
            };
            if known.checksum != row.checksum {
                return Err(Error::ChecksumMismatch {
                    version: row.version,
                    recorded: row.checksum,
                    expected: known.checksum.clone(),
                });
            }
            by_version.insert(row.version.clone(), row);
        }

        Ok((planned, by_version))
    }

    /// Every known migration and whether it has been applied.
    pub async fn status(&self) -> Result<Vec<MigrationStatus>> {
        let (planned, applied) = self.reconcile().await?;

        Ok(planned
            .into_iter()
            .map(|p| MigrationStatus {
                applied_at: applied.get(&p.version).map(|a| a.applied_at),
                version: p.version,
                name: p.name,
            })
            .collect())
    }

    /// Apply every pending migration, oldest first.
    ///
    /// Each migration runs in its own implicit transaction. If one fails,
    /// the ones before it stay applied and the error is returned.
    pub async fn migrate(&self) -> Result<Vec<RanMigration>> {
        let (planned, applied) = self.reconcile().await?;
        let newest_applied = applied.keys().max().cloned();

        let mut ran = Vec::new();
        for migration in planned {
            if applied.contains_key(&migration.version) {
                continue;
            }

            if let Some(newest) = &newest_applied
                && newest.as_str() > migration.version.as_str()
            {
                tracing::warn!(
                    version = %migration.version,
                    newest_applied = %newest,
                    "applying migration older than one already applied"
                );
            }

            self.backend.apply(&self.meta_table, &migration).await?;
            tracing::info!(
                version = %migration.version,
                name = %migration.name,
                statements = migration.statements.len(),
                "applied migration"
            );

            ran.push(RanMigration {
                statement_count: migration.statements.len(),
                version: migration.version,
                name: migration.name,
            });
        }

        if ran.is_empty() {
            tracing::info!("database is up to date");
        }

        Ok(ran)
    }
}

impl MigrationBackend for tokio_postgres::Client {
    fn ensure_meta_table<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            TracedConn::new(self)
                .batch_execute(&meta::create_meta_table_sql(table))
                .await?;
            Ok(())
        })
    }

    fn applied<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<Vec<AppliedMigration>>> {
        Box::pin(async move {
            let rows = TracedConn::new(self)
                .query(&meta::select_applied_sql(table), &[])
                .await?;

            let mut applied = Vec::with_capacity(rows.len());
            for row in rows {
                applied.push(AppliedMigration {
                    version: row.try_get("version")?,
                    name: row.try_get("name")?,
                    checksum: row.try_get("checksum")?,
                    applied_at: row.try_get("applied_at")?,
                });
            }
            Ok(applied)
        })
    }

    fn apply<'a>(
        &'a self,
        table: &'a str,
        migration: &'a PlannedMigration,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            TracedConn::new(self)
                .batch_execute(&meta::apply_migration_sql(table, migration))
                .await?;
            Ok(())
        })
    }
}
