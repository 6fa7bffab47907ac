//! The `products` table.

use crate::Entity;
use catalog_db_schema::{Column, PgType, Table};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Column names of the `products` table, as they appear in SQL.
pub mod columns {
    pub const CODE: &str = "Code";
    pub const NAME: &str = "Name";
    pub const DESCRIPTION: &str = "Description";
    pub const IMAGE_URL: &str = "ImageUrl";
    pub const KIND: &str = "Kind";
    pub const STATUS: &str = "Status";
    pub const IS_PACKAGE: &str = "IsPackage";
    pub const AVAILABILITY_START: &str = "AvailabilityStart";
    pub const AVAILABILITY_END: &str = "AvailabilityEnd";
}

/// A product offered in the catalog.
///
/// Field names serialize to the column names, so a row read as JSON
/// (`row_to_json`) deserializes straight into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Product {
    /// Immutable identifier.
    pub code: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: String,
    /// Enum-like, stored as free text.
    pub kind: String,
    /// Enum-like, stored as free text.
    pub status: Option<String>,
    #[serde(default)]
    pub is_package: bool,
    /// Not checked against `availability_end`; an inverted window is
    /// stored as given.
    pub availability_start: Option<NaiveDateTime>,
    pub availability_end: Option<NaiveDateTime>,
}

impl Product {
    /// A product with only the required fields set.
    pub fn new(
        code: impl Into<String>,
        image_url: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: None,
            description: None,
            image_url: image_url.into(),
            kind: kind.into(),
            status: None,
            is_package: false,
            availability_start: None,
            availability_end: None,
        }
    }
}

impl Entity for Product {
    const TABLE: &'static str = "products";

    fn describe() -> Table {
        Table::new(Self::TABLE)
            .with_doc("Products offered in the catalog.")
            .with_column(Column::new(columns::CODE, PgType::VarChar(64)).primary_key())
            .with_column(Column::new(columns::NAME, PgType::VarChar(128)).nullable())
            .with_column(Column::new(columns::DESCRIPTION, PgType::VarChar(1024)).nullable())
            .with_column(Column::new(columns::IMAGE_URL, PgType::VarChar(128)))
            .with_column(Column::new(columns::KIND, PgType::Text))
            .with_column(Column::new(columns::STATUS, PgType::Text).nullable())
            .with_column(Column::new(columns::IS_PACKAGE, PgType::Boolean).default_expr("false"))
            .with_column(Column::new(columns::AVAILABILITY_START, PgType::Timestamp).nullable())
            .with_column(Column::new(columns::AVAILABILITY_END, PgType::Timestamp).nullable())
    }
}
