use catalog_db_schema::SchemaError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    #[error("invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("migration {version} is declared more than once")]
    DuplicateMigration { version: String },

    #[error("migration {version} does not change the schema")]
    EmptyMigration { version: String },

    #[error(
        "migration {version} was applied with checksum {recorded}, but its SQL now hashes to {expected}"
    )]
    ChecksumMismatch {
        version: String,
        recorded: String,
        expected: String,
    },

    #[error("database records migration {version}, which this build does not know about")]
    UnknownMigration { version: String },
}
