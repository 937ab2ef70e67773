use crate::core::{ColumnType, Value};
use crate::models::TableRef;

use super::quote::{qualified, quote_ident};

/// SQL text plus its positional parameters.
///
/// Identifiers only enter the text through [`Statement::push_ident`] and
/// [`Statement::push_table`]; literal values only through
/// [`Statement::bind`] and the `push_bind*` helpers built on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Append trusted SQL text (keywords, punctuation).
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    pub fn push_ident(&mut self, name: &str) -> &mut Self {
        self.sql.push_str(&quote_ident(name));
        self
    }

    pub fn push_table(&mut self, target: &TableRef) -> &mut Self {
        self.sql.push_str(&qualified(target));
        self
    }

    /// Add a parameter for a `$n` placeholder already present in the text.
    pub fn bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.params.push(value.into());
        self
    }

    /// Bind a value and append its `$n` placeholder.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.bind(value);
        let placeholder = format!("${}", self.params.len());
        self.sql.push_str(&placeholder);
        self
    }

    /// Bind a value and append `CAST($n AS "udt_schema"."udt_name")`, so the
    /// parameter lands in the column's own type whatever it was bound as.
    pub fn push_bind_cast(&mut self, value: impl Into<Value>, column_type: &ColumnType) -> &mut Self {
        self.push("CAST(");
        self.push_bind(value);
        self.push(" AS ");
        self.push_ident(&column_type.udt_schema);
        self.push(".");
        self.push_ident(&column_type.udt_name);
        self.push(")")
    }

    /// Append items separated by `separator`.
    pub fn push_separated<T>(
        &mut self,
        items: impl IntoIterator<Item = T>,
        separator: &str,
        mut push_item: impl FnMut(&mut Self, T),
    ) -> &mut Self {
        for (index, item) in items.into_iter().enumerate() {
            if index > 0 {
                self.push(separator);
            }
            push_item(self, item);
        }
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.params)
    }
}
