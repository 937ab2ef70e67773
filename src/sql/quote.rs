use crate::models::TableRef;

/// Quote an identifier for interpolation into SQL text.
///
/// Embedded double quotes are doubled. Input is cut at the first NUL byte,
/// which PostgreSQL cannot accept inside an identifier.
pub fn quote_ident(name: &str) -> String {
    let name = name.split('\0').next().unwrap_or_default();
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `"schema"."table"`
pub fn qualified(target: &TableRef) -> String {
    format!("{}.{}", quote_ident(&target.schema), quote_ident(&target.table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_identifiers() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("Mixed Case"), "\"Mixed Case\"");
    }

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(
            quote_ident("x\"; DROP TABLE users; --"),
            "\"x\"\"; DROP TABLE users; --\""
        );
    }

    #[test]
    fn truncates_at_nul() {
        assert_eq!(quote_ident("abc\0def"), "\"abc\"");
    }

    #[test]
    fn qualifies_schema_and_table() {
        assert_eq!(
            qualified(&TableRef::new("public", "users")),
            "\"public\".\"users\""
        );
    }
}
