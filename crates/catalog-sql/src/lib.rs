//! SQL quoting and naming helpers.
//!
//! Everything that ends up in generated DDL goes through [`Ident`] or
//! [`Lit`], so reserved words (`user`, `order`, ...) and mixed-case column
//! names like `ImageUrl` survive the trip to Postgres unchanged.

/// Maximum identifier length Postgres keeps (NAMEDATALEN - 1).
pub const PG_IDENT_MAX: usize = 63;

/// A PostgreSQL string literal wrapper.
///
/// Display writes the value escaped and quoted with single quotes.
///
/// # Example
/// ```
/// use catalog_sql::Lit;
/// assert_eq!(format!("{}", Lit("foo")), "'foo'");
/// assert_eq!(format!("{}", Lit("it's")), "'it''s'");
/// ```
pub struct Lit<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Lit<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'")?;
        for c in self.0.as_ref().chars() {
            if c == '\'' {
                write!(f, "''")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "'")
    }
}

/// A PostgreSQL identifier wrapper.
///
/// Display writes the value escaped and quoted with double quotes.
///
/// # Example
/// ```
/// use catalog_sql::Ident;
/// assert_eq!(format!("{}", Ident("ImageUrl")), "\"ImageUrl\"");
/// assert_eq!(format!("{}", Ident("bla\"h")), "\"bla\"\"h\"");
/// ```
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> std::fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"")?;
        for c in self.0.as_ref().chars() {
            if c == '"' {
                write!(f, "\"\"")?;
            } else {
                write!(f, "{}", c)?;
            }
        }
        write!(f, "\"")
    }
}

/// Quote a PostgreSQL identifier.
///
/// Always quotes, which also preserves case: `ImageUrl` stays `ImageUrl`
/// instead of being folded to `imageurl`.
pub fn quote_ident(name: &str) -> String {
    format!("{}", Ident(name))
}

/// Name of the primary key constraint Postgres creates for a table.
///
/// Follows the server's own `{table}_pkey` convention, truncating the
/// table part so the result fits in [`PG_IDENT_MAX`].
///
/// # Examples
///
/// ```
/// assert_eq!(catalog_sql::primary_key_constraint_name("products"), "products_pkey");
/// ```
pub fn primary_key_constraint_name(table: &str) -> String {
    let max_table_len = PG_IDENT_MAX.saturating_sub("_pkey".len());
    format!("{}_pkey", truncate_ident(table, max_table_len))
}

/// Stable checksum of a list of SQL statements.
///
/// Whitespace outside of quoted strings and identifiers is normalized
/// before hashing, so re-indenting generated SQL does not change the
/// checksum, while any change to names, types or literals does.
pub fn statements_checksum(statements: &[impl AsRef<str>]) -> String {
    let mut hasher = blake3::Hasher::new();
    for stmt in statements {
        hasher.update(normalize_sql_for_hash(stmt.as_ref()).as_bytes());
        hasher.update(b";\n");
    }
    hasher.finalize().to_hex().to_string()
}

fn truncate_ident(name: &str, max_len: usize) -> &str {
    if name.len() <= max_len {
        return name;
    }
    let mut len = max_len;
    while len > 0 && !name.is_char_boundary(len) {
        len -= 1;
    }
    &name[..len]
}

fn normalize_sql_for_hash(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut pending_space = false;

    let mut in_single_quote = false;
    let mut in_double_quote = false;

    let mut chars = sql.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_single_quote {
            out.push(ch);
            if ch == '\'' {
                // '' is an escaped quote, not the end of the literal
                if let Some(next) = chars.next_if_eq(&'\'') {
                    out.push(next);
                } else {
                    in_single_quote = false;
                }
            }
            continue;
        }

        if in_double_quote {
            out.push(ch);
            if ch == '"' {
                if let Some(next) = chars.next_if_eq(&'"') {
                    out.push(next);
                } else {
                    in_double_quote = false;
                }
            }
            continue;
        }

        match ch {
            c if c.is_whitespace() => {
                pending_space = true;
            }
            c => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                match c {
                    '\'' => in_single_quote = true,
                    '"' => in_double_quote = true,
                    _ => {}
                }
                out.push(c);
            }
        }
    }

    out.trim().trim_end_matches(';').trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_preserves_case() {
        assert_eq!(quote_ident("IsPackage"), "\"IsPackage\"");
        assert_eq!(quote_ident("user"), "\"user\"");
    }

    #[test]
    fn test_primary_key_constraint_name_truncates() {
        let long = "t".repeat(80);
        let name = primary_key_constraint_name(&long);
        assert_eq!(name.len(), PG_IDENT_MAX);
        assert!(name.ends_with("_pkey"));
    }

    #[test]
    fn test_checksum_ignores_layout() {
        let c = statements_checksum(&["CREATE TABLE \"products\"  (\n\"Code\"   text\n)"]);
        let d = statements_checksum(&["CREATE TABLE \"products\" ( \"Code\" text );"]);
        assert_eq!(c, d);
    }

    #[test]
    fn test_checksum_sees_quoted_content() {
        let a = statements_checksum(&["SELECT 'a  b'"]);
        let b = statements_checksum(&["SELECT 'a b'"]);
        assert_ne!(a, b);

        let c = statements_checksum(&["ALTER TABLE \"products\" ADD \"A  B\" text"]);
        let d = statements_checksum(&["ALTER TABLE \"products\" ADD \"A B\" text"]);
        assert_ne!(c, d);
    }

    #[test]
    fn test_checksum_depends_on_statement_boundaries() {
        let one = statements_checksum(&["SELECT 1; SELECT 2"]);
        let two = statements_checksum(&["SELECT 1", "SELECT 2"]);
        assert_ne!(one, two);
    }
}
