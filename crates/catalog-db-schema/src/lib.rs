//! Database schema types for catalog.
//!
//! This crate contains the plain-data description of tables and columns
//! that is shared between the entity descriptors, the diff engine and the
//! CLI. Values are built by hand (see `catalog::Entity`), never reflected
//! from model types, and serialize to JSON so a snapshot of the schema can
//! be stored next to the code and diffed later.

use catalog_sql::PG_IDENT_MAX;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest `n` Postgres accepts in `character varying(n)`.
pub const VARCHAR_MAX_LENGTH: u32 = 10_485_760;

/// Errors produced when validating or parsing a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("table name is empty")]
    EmptyTableName,

    #[error("table '{table}' has a column with an empty name")]
    EmptyColumnName { table: String },

    #[error("identifier '{ident}' is {len} bytes long, postgres keeps at most {max}", max = PG_IDENT_MAX)]
    IdentifierTooLong { ident: String, len: usize },

    #[error("table '{table}' declares column '{column}' more than once")]
    DuplicateColumn { table: String, column: String },

    #[error("table '{table}' has no primary key")]
    MissingPrimaryKey { table: String },

    #[error("primary key column '{table}.{column}' is nullable")]
    NullablePrimaryKey { table: String, column: String },

    #[error("column '{table}.{column}' is character varying(0)")]
    ZeroLengthVarChar { table: String, column: String },

    #[error(
        "column '{table}.{column}' is character varying({len}), postgres allows at most {max}",
        max = VARCHAR_MAX_LENGTH
    )]
    VarCharTooLong {
        table: String,
        column: String,
        len: u32,
    },

    #[error("table stored under key '{key}' is named '{name}'")]
    TableKeyMismatch { key: String, name: String },

    #[error("unknown postgres type '{0}'")]
    UnknownType(String),

    #[error("invalid schema json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Postgres column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PgType {
    /// SMALLINT (2 bytes)
    SmallInt,
    /// INTEGER (4 bytes)
    Integer,
    /// BIGINT (8 bytes)
    BigInt,
    /// REAL (4 bytes floating point)
    Real,
    /// DOUBLE PRECISION (8 bytes floating point)
    DoublePrecision,
    /// NUMERIC (arbitrary precision)
    Numeric,
    /// BOOLEAN
    Boolean,
    /// TEXT, no length limit
    Text,
    /// CHARACTER VARYING(n)
    VarChar(u32),
    /// BYTEA (binary)
    Bytea,
    /// TIMESTAMP WITHOUT TIME ZONE
    Timestamp,
    /// TIMESTAMP WITH TIME ZONE
    Timestamptz,
    /// DATE
    Date,
    /// TIME WITHOUT TIME ZONE
    Time,
    /// UUID
    Uuid,
    /// JSONB
    Jsonb,
}

impl PgType {
    /// Maximum length in characters, for bounded string types.
    pub fn max_length(&self) -> Option<u32> {
        match self {
            PgType::VarChar(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for PgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgType::SmallInt => write!(f, "smallint"),
            PgType::Integer => write!(f, "integer"),
            PgType::BigInt => write!(f, "bigint"),
            PgType::Real => write!(f, "real"),
            PgType::DoublePrecision => write!(f, "double precision"),
            PgType::Numeric => write!(f, "numeric"),
            PgType::Boolean => write!(f, "boolean"),
            PgType::Text => write!(f, "text"),
            PgType::VarChar(n) => write!(f, "character varying({})", n),
            PgType::Bytea => write!(f, "bytea"),
            PgType::Timestamp => write!(f, "timestamp without time zone"),
            PgType::Timestamptz => write!(f, "timestamp with time zone"),
            PgType::Date => write!(f, "date"),
            PgType::Time => write!(f, "time without time zone"),
            PgType::Uuid => write!(f, "uuid"),
            PgType::Jsonb => write!(f, "jsonb"),
        }
    }
}

impl FromStr for PgType {
    type Err = SchemaError;

    /// Parses canonical names as printed by `Display` plus the usual
    /// Postgres aliases (`varchar(n)`, `int4`, `timestamptz`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();

        if let Some(len) = parse_varchar_length(&normalized) {
            return Ok(PgType::VarChar(len));
        }

        let ty = match normalized.as_str() {
            "smallint" | "int2" => PgType::SmallInt,
            "integer" | "int" | "int4" => PgType::Integer,
            "bigint" | "int8" => PgType::BigInt,
            "real" | "float4" => PgType::Real,
            "double precision" | "float8" => PgType::DoublePrecision,
            "numeric" | "decimal" => PgType::Numeric,
            "boolean" | "bool" => PgType::Boolean,
            "text" => PgType::Text,
            "bytea" => PgType::Bytea,
            "timestamp" | "timestamp without time zone" => PgType::Timestamp,
            "timestamptz" | "timestamp with time zone" => PgType::Timestamptz,
            "date" => PgType::Date,
            "time" | "time without time zone" => PgType::Time,
            "uuid" => PgType::Uuid,
            "jsonb" => PgType::Jsonb,
            _ => return Err(SchemaError::UnknownType(s.to_string())),
        };
        Ok(ty)
    }
}

/// Extract `n` from `character varying(n)` / `varchar(n)`.
fn parse_varchar_length(normalized: &str) -> Option<u32> {
    let rest = normalized
        .strip_prefix("character varying")
        .or_else(|| normalized.strip_prefix("varchar"))?;
    let inner = rest.trim().strip_prefix('(')?.strip_suffix(')')?;
    inner.trim().parse().ok()
}

impl From<PgType> for String {
    fn from(ty: PgType) -> Self {
        ty.to_string()
    }
}

impl TryFrom<String> for PgType {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A database column definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, used verbatim (quoted) in SQL
    pub name: String,
    /// Postgres type
    #[serde(rename = "type")]
    pub pg_type: PgType,
    /// Whether the column allows NULL
    #[serde(default)]
    pub nullable: bool,
    /// Default value expression (if any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Whether this column is part of the primary key
    #[serde(default)]
    pub primary_key: bool,
    /// Doc comment (if any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl Column {
    /// A required (`NOT NULL`) column with no default.
    pub fn new(name: impl Into<String>, pg_type: PgType) -> Self {
        Self {
            name: name.into(),
            pg_type,
            nullable: false,
            default: None,
            primary_key: false,
            doc: None,
        }
    }

    /// Allow NULL in this column.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Mark this column as (part of) the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Set the SQL default expression, e.g. `false` or `now()`.
    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Maximum length in characters, if the type is bounded.
    pub fn max_length(&self) -> Option<u32> {
        self.pg_type.max_length()
    }
}

/// A database table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name
    pub name: String,
    /// Columns, in declaration order
    pub columns: Vec<Column>,
    /// Doc comment (if any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl Table {
    /// An empty table; add columns with [`Table::with_column`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            doc: None,
        }
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the primary key columns, in declaration order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Check the table against the rules Postgres will enforce anyway, so
    /// a broken descriptor is caught before any DDL is generated.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyTableName);
        }
        check_ident_len(&self.name)?;

        let mut seen = std::collections::HashSet::new();
        for col in &self.columns {
            if col.name.is_empty() {
                return Err(SchemaError::EmptyColumnName {
                    table: self.name.clone(),
                });
            }
            check_ident_len(&col.name)?;

            if !seen.insert(col.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.name.clone(),
                    column: col.name.clone(),
                });
            }

            if col.primary_key && col.nullable {
                return Err(SchemaError::NullablePrimaryKey {
                    table: self.name.clone(),
                    column: col.name.clone(),
                });
            }

            match col.pg_type {
                PgType::VarChar(0) => {
                    return Err(SchemaError::ZeroLengthVarChar {
                        table: self.name.clone(),
                        column: col.name.clone(),
                    });
                }
                PgType::VarChar(len) if len > VARCHAR_MAX_LENGTH => {
                    return Err(SchemaError::VarCharTooLong {
                        table: self.name.clone(),
                        column: col.name.clone(),
                        len,
                    });
                }
                _ => {}
            }
        }

        if self.primary_key().is_empty() {
            return Err(SchemaError::MissingPrimaryKey {
                table: self.name.clone(),
            });
        }

        Ok(())
    }
}

fn check_ident_len(ident: &str) -> Result<(), SchemaError> {
    if ident.len() > PG_IDENT_MAX {
        return Err(SchemaError::IdentifierTooLong {
            ident: ident.to_string(),
            len: ident.len(),
        });
    }
    Ok(())
}

/// A complete database schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Tables in the schema, indexed by name, in insertion order
    pub tables: IndexMap<String, Table>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table.
    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.insert(table.name.clone(), table);
        self
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// Iterate over all tables.
    pub fn iter_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Validate every table, and that each is stored under its own name.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for (key, table) in &self.tables {
            if key != &table.name {
                return Err(SchemaError::TableKeyMismatch {
                    key: key.clone(),
                    name: table.name.clone(),
                });
            }
            table.validate()?;
        }
        Ok(())
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON snapshot and validate it.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schema: Schema = serde_json::from_str(json)?;
        schema.validate()?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests;
