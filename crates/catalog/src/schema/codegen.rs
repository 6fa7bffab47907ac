use super::create_table_sql;
use catalog_db_schema::Schema;

/// Generate SQL to create all tables.
///
/// Returns a complete SQL script that can be executed to create the schema,
/// one CREATE TABLE per table in schema order, separated by a blank line.
pub fn schema_to_sql(schema: &Schema) -> String {
    let mut sql = String::new();

    for table in schema.iter_tables() {
        sql.push_str(&create_table_sql(table));
        sql.push_str("\n\n");
    }

    sql.trim_end().to_string()
}
