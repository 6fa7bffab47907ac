use super::*;

fn sample_table() -> Table {
    Table::new("widgets")
        .with_column(Column::new("Id", PgType::VarChar(32)).primary_key())
        .with_column(Column::new("Label", PgType::Text).nullable())
        .with_column(Column::new("Active", PgType::Boolean).default_expr("false"))
}

#[test]
fn test_pg_type_display_uses_postgres_names() {
    assert_eq!(PgType::VarChar(64).to_string(), "character varying(64)");
    assert_eq!(PgType::Text.to_string(), "text");
    assert_eq!(PgType::Boolean.to_string(), "boolean");
    assert_eq!(PgType::Timestamp.to_string(), "timestamp without time zone");
    assert_eq!(PgType::Timestamptz.to_string(), "timestamp with time zone");
}

#[test]
fn test_pg_type_parse_aliases() {
    assert_eq!("varchar(128)".parse::<PgType>().unwrap(), PgType::VarChar(128));
    assert_eq!(
        "CHARACTER VARYING ( 1024 )".parse::<PgType>().unwrap(),
        PgType::VarChar(1024)
    );
    assert_eq!("int4".parse::<PgType>().unwrap(), PgType::Integer);
    assert_eq!("bool".parse::<PgType>().unwrap(), PgType::Boolean);
    assert_eq!("timestamp".parse::<PgType>().unwrap(), PgType::Timestamp);
    assert_eq!("timestamptz".parse::<PgType>().unwrap(), PgType::Timestamptz);
    assert_eq!(
        "timestamp   without time zone".parse::<PgType>().unwrap(),
        PgType::Timestamp
    );
}

#[test]
fn test_pg_type_parse_rejects_unknown() {
    assert!(matches!(
        "money".parse::<PgType>(),
        Err(SchemaError::UnknownType(t)) if t == "money"
    ));
    // Unbounded varchar is not something we model.
    assert!("character varying".parse::<PgType>().is_err());
    assert!("varchar(abc)".parse::<PgType>().is_err());
}

#[test]
fn test_max_length_only_for_varchar() {
    assert_eq!(PgType::VarChar(64).max_length(), Some(64));
    assert_eq!(PgType::Text.max_length(), None);
    assert_eq!(PgType::Boolean.max_length(), None);
}

#[test]
fn test_column_builder() {
    let col = Column::new("Flag", PgType::Boolean).default_expr("false");
    assert!(!col.nullable);
    assert!(!col.primary_key);
    assert_eq!(col.default.as_deref(), Some("false"));

    let col = Column::new("Note", PgType::Text).nullable().doc("free text");
    assert!(col.nullable);
    assert_eq!(col.doc.as_deref(), Some("free text"));
}

#[test]
fn test_table_lookup_and_primary_key() {
    let table = sample_table();
    assert_eq!(table.primary_key(), vec!["Id"]);
    assert_eq!(table.column("Label").map(|c| c.nullable), Some(true));
    assert!(table.column("label").is_none(), "lookup is case sensitive");
}

#[test]
fn test_validate_ok() {
    sample_table().validate().unwrap();
}

#[test]
fn test_validate_missing_primary_key() {
    let table = Table::new("t").with_column(Column::new("a", PgType::Text));
    assert!(matches!(
        table.validate(),
        Err(SchemaError::MissingPrimaryKey { table }) if table == "t"
    ));
}

#[test]
fn test_validate_duplicate_column() {
    let table = sample_table().with_column(Column::new("Label", PgType::Text));
    assert!(matches!(
        table.validate(),
        Err(SchemaError::DuplicateColumn { column, .. }) if column == "Label"
    ));
}

#[test]
fn test_validate_nullable_primary_key() {
    let table =
        Table::new("t").with_column(Column::new("a", PgType::Text).primary_key().nullable());
    assert!(matches!(
        table.validate(),
        Err(SchemaError::NullablePrimaryKey { .. })
    ));
}

#[test]
fn test_validate_identifier_length() {
    let ok = "c".repeat(63);
    let too_long = "c".repeat(64);

    let table = Table::new("t").with_column(Column::new(ok, PgType::Text).primary_key());
    table.validate().unwrap();

    let table = Table::new("t").with_column(Column::new(too_long, PgType::Text).primary_key());
    assert!(matches!(
        table.validate(),
        Err(SchemaError::IdentifierTooLong { len: 64, .. })
    ));
}

#[test]
fn test_validate_empty_names_and_zero_varchar() {
    assert!(matches!(
        Table::new("").validate(),
        Err(SchemaError::EmptyTableName)
    ));

    let table = Table::new("t").with_column(Column::new("", PgType::Text));
    assert!(matches!(
        table.validate(),
        Err(SchemaError::EmptyColumnName { .. })
    ));

    let table = Table::new("t").with_column(Column::new("a", PgType::VarChar(0)).primary_key());
    assert!(matches!(
        table.validate(),
        Err(SchemaError::ZeroLengthVarChar { .. })
    ));
}

#[test]
fn test_validate_varchar_upper_bound() {
    let at_limit = Table::new("t")
        .with_column(Column::new("a", PgType::VarChar(VARCHAR_MAX_LENGTH)).primary_key());
    at_limit.validate().unwrap();

    let over = Table::new("t")
        .with_column(Column::new("a", PgType::VarChar(VARCHAR_MAX_LENGTH + 1)).primary_key());
    assert!(matches!(
        over.validate(),
        Err(SchemaError::VarCharTooLong { len, .. }) if len == VARCHAR_MAX_LENGTH + 1
    ));
}

#[test]
fn test_from_json_rejects_oversized_varchar() {
    let json = r#"{
        "tables": {
            "t": {
                "name": "t",
                "columns": [
                    { "name": "a", "type": "character varying(10485761)", "primary_key": true }
                ]
            }
        }
    }"#;
    assert!(matches!(
        Schema::from_json(json),
        Err(SchemaError::VarCharTooLong { .. })
    ));
}

#[test]
fn test_column_json_shape() {
    let col = Column::new("Code", PgType::VarChar(64)).primary_key();
    let json = serde_json::to_value(&col).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "Code",
            "type": "character varying(64)",
            "nullable": false,
            "primary_key": true,
        })
    );
}

#[test]
fn test_schema_json_round_trip() {
    let schema = Schema::new().with_table(sample_table());
    let json = schema.to_json().unwrap();
    let parsed = Schema::from_json(&json).unwrap();
    assert_eq!(parsed, schema);
}

#[test]
fn test_schema_from_json_fills_defaults() {
    let json = r#"{
        "tables": {
            "t": {
                "name": "t",
                "columns": [
                    { "name": "id", "type": "varchar(10)", "primary_key": true },
                    { "name": "note", "type": "text", "nullable": true }
                ]
            }
        }
    }"#;
    let schema = Schema::from_json(json).unwrap();
    let table = schema.get_table("t").unwrap();
    assert_eq!(table.columns[0].pg_type, PgType::VarChar(10));
    assert!(!table.columns[0].nullable);
    assert_eq!(table.columns[1].default, None);
}

#[test]
fn test_schema_from_json_rejects_key_mismatch() {
    let json = r#"{
        "tables": {
            "a": { "name": "b", "columns": [ { "name": "id", "type": "text", "primary_key": true } ] }
        }
    }"#;
    assert!(matches!(
        Schema::from_json(json),
        Err(SchemaError::TableKeyMismatch { .. })
    ));
}

#[test]
fn test_schema_from_json_rejects_unknown_type() {
    let json = r#"{
        "tables": {
            "t": { "name": "t", "columns": [ { "name": "id", "type": "money", "primary_key": true } ] }
        }
    }"#;
    assert!(matches!(Schema::from_json(json), Err(SchemaError::Json(_))));
}
