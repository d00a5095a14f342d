//! SQL identifier quoting utilities
//!
//! Destination table and column names are interpolated into DDL/DML, so every
//! identifier goes through these helpers.

/// Quote a SQL identifier to prevent injection.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use st_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("SKU"), r#""SKU""#);
/// assert_eq!(quote_ident(r#"my"col"#), r#""my""col""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a potentially schema-qualified name (e.g. `schema.table`).
///
/// Splits on `.` and individually quotes each component.
///
/// # Examples
/// ```
/// use st_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("SNAP"), r#""SNAP""#);
/// assert_eq!(quote_qualified("raw.SNAP"), r#""raw"."SNAP""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_simple() {
        assert_eq!(quote_ident("PRODUCT_ID"), r#""PRODUCT_ID""#);
    }

    #[test]
    fn test_quote_ident_with_embedded_quotes() {
        assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
    }

    #[test]
    fn test_quote_qualified_three_parts() {
        assert_eq!(quote_qualified("db.raw.SNAP"), r#""db"."raw"."SNAP""#);
    }
}
