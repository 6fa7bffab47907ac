//! Creates `products`.

use crate::{Column, Migration, PgType, Schema, Table};

pub fn migration() -> Migration {
    Migration::new("2022_07_05_145139-initial", "initial", target)
}

fn target() -> Schema {
    Schema::new().with_table(
        Table::new("products")
            .with_doc("Products offered in the catalog.")
            .with_column(Column::new("Code", PgType::VarChar(64)).primary_key())
            .with_column(Column::new("Name", PgType::VarChar(128)).nullable())
            .with_column(Column::new("Description", PgType::VarChar(1024)).nullable())
            .with_column(Column::new("ImageUrl", PgType::VarChar(128)))
            .with_column(Column::new("Kind", PgType::Text))
            .with_column(Column::new("Status", PgType::Text).nullable())
            .with_column(Column::new("IsPackage", PgType::Boolean).default_expr("false"))
            .with_column(Column::new("AvailabilityStart", PgType::Timestamp).nullable())
            .with_column(Column::new("AvailabilityEnd", PgType::Timestamp).nullable()),
    )
}
