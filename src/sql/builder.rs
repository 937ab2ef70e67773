//! Statement builders for the generic record operations.
//!
//! Every builder takes already-validated request data and returns a
//! [`Statement`]; nothing here touches the database.

use crate::core::{AdminError, AdminResult};
use crate::models::{BoundColumn, ForeignKeyTarget, ListRequest, TableRef};

use super::Statement;

/// Expression used as the human-readable label of a foreign-key option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelExpr {
    /// `CONCAT_WS(' ', col1, col2, ...)` over the referenced table's text columns.
    Concat(Vec<String>),
    /// `CAST(key AS TEXT)` when the referenced table has no text column.
    KeyAsText(String),
}

impl LabelExpr {
    pub fn from_text_columns(text_columns: Vec<String>, key_column: &str) -> Self {
        if text_columns.is_empty() {
            Self::KeyAsText(key_column.to_string())
        } else {
            Self::Concat(text_columns)
        }
    }

    fn push_to(&self, stmt: &mut Statement) {
        match self {
            Self::Concat(columns) => {
                stmt.push("CONCAT_WS(' ', ");
                stmt.push_separated(columns, ", ", |s, column| {
                    s.push_ident(column);
                });
                stmt.push(")");
            }
            Self::KeyAsText(column) => {
                stmt.push("CAST(");
                stmt.push_ident(column);
                stmt.push(" AS TEXT)");
            }
        }
    }
}

/// One column of the list projection. Columns the row codec cannot decode
/// natively are read back as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    pub name: String,
    pub as_text: bool,
}

impl Projection {
    pub fn new(name: impl Into<String>, as_text: bool) -> Self {
        Self {
            name: name.into(),
            as_text,
        }
    }
}

fn push_projection(stmt: &mut Statement, columns: &[Projection]) {
    if columns.is_empty() {
        stmt.push("*");
        return;
    }
    stmt.push_separated(columns, ", ", |s, column| {
        if column.as_text {
            s.push("CAST(");
            s.push_ident(&column.name);
            s.push(" AS TEXT) AS ");
        }
        s.push_ident(&column.name);
    });
}

/// `(CAST("c1" AS TEXT) ILIKE $n OR ...)` with `%filter%` bound once per column.
fn push_filter(stmt: &mut Statement, filter: Option<&str>, columns: &[Projection]) {
    let Some(filter) = filter else {
        return;
    };
    if columns.is_empty() {
        return;
    }

    let pattern = format!("%{filter}%");
    stmt.push(" WHERE (");
    stmt.push_separated(columns, " OR ", |s, column| {
        s.push("CAST(");
        s.push_ident(&column.name);
        s.push(" AS TEXT) ILIKE ");
        s.push_bind(pattern.clone());
    });
    stmt.push(")");
}

/// Page of rows for `/api/table-content`.
///
/// `columns` is the table's current column list in ordinal order. It drives
/// both the projection and the filter; when empty the statement falls back
/// to `SELECT *` without a filter.
pub fn select_page(request: &ListRequest, columns: &[Projection]) -> Statement {
    let mut stmt = Statement::new("SELECT ");
    push_projection(&mut stmt, columns);
    stmt.push(" FROM ");
    stmt.push_table(&request.target);
    push_filter(&mut stmt, request.filter.as_deref(), columns);

    if let Some(sort) = &request.sort {
        stmt.push(" ORDER BY ");
        stmt.push_ident(&sort.column);
        stmt.push(" ");
        stmt.push(sort.order.as_sql());
    }

    stmt.push(" LIMIT ");
    stmt.push_bind(request.page.limit);
    stmt.push(" OFFSET ");
    stmt.push_bind(request.page.offset);
    stmt
}

/// Row count under the same predicate as [`select_page`], ignoring paging.
pub fn count(request: &ListRequest, columns: &[Projection]) -> Statement {
    let mut stmt = Statement::new("SELECT COUNT(*) FROM ");
    stmt.push_table(&request.target);
    push_filter(&mut stmt, request.filter.as_deref(), columns);
    stmt
}

/// `INSERT ... RETURNING <primary_key>`. With no columns, `DEFAULT VALUES`.
pub fn insert(target: &TableRef, primary_key: &str, columns: &[BoundColumn]) -> Statement {
    let mut stmt = Statement::new("INSERT INTO ");
    stmt.push_table(target);

    if columns.is_empty() {
        stmt.push(" DEFAULT VALUES");
    } else {
        stmt.push(" (");
        stmt.push_separated(columns, ", ", |s, column| {
            s.push_ident(&column.name);
        });
        stmt.push(") VALUES (");
        stmt.push_separated(columns, ", ", |s, column| {
            s.push_bind_cast(column.value.clone(), &column.column_type);
        });
        stmt.push(")");
    }

    stmt.push(" RETURNING ");
    stmt.push_ident(primary_key);
    stmt
}

pub fn update(
    target: &TableRef,
    key: &BoundColumn,
    columns: &[BoundColumn],
) -> AdminResult<Statement> {
    if columns.is_empty() {
        return Err(AdminError::validation("No columns to update"));
    }

    let mut stmt = Statement::new("UPDATE ");
    stmt.push_table(target);
    stmt.push(" SET ");
    stmt.push_separated(columns, ", ", |s, column| {
        s.push_ident(&column.name);
        s.push(" = ");
        s.push_bind_cast(column.value.clone(), &column.column_type);
    });
    push_key_predicate(&mut stmt, key);
    Ok(stmt)
}

pub fn delete(target: &TableRef, key: &BoundColumn) -> Statement {
    let mut stmt = Statement::new("DELETE FROM ");
    stmt.push_table(target);
    push_key_predicate(&mut stmt, key);
    stmt
}

fn push_key_predicate(stmt: &mut Statement, key: &BoundColumn) {
    stmt.push(" WHERE ");
    stmt.push_ident(&key.name);
    stmt.push(" = ");
    stmt.push_bind_cast(key.value.clone(), &key.column_type);
}

/// `SELECT <key> AS value, <label> AS label FROM <referenced table>`.
pub fn options(target: &ForeignKeyTarget, label: &LabelExpr) -> Statement {
    let mut stmt = Statement::new("SELECT ");
    stmt.push_ident(&target.column);
    stmt.push(" AS value, ");
    label.push_to(&mut stmt);
    stmt.push(" AS label FROM ");
    stmt.push_table(&target.table_ref());
    stmt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ColumnType, Value};
    use crate::models::{Page, Sort, SortOrder};

    fn users() -> TableRef {
        TableRef::new("public", "users")
    }

    fn list(filter: Option<&str>, sort: Option<Sort>, limit: i64, offset: i64) -> ListRequest {
        ListRequest {
            target: users(),
            filter: filter.map(str::to_string),
            sort,
            page: Page { limit, offset },
        }
    }

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn projected(names: &[&str]) -> Vec<Projection> {
        names.iter().map(|n| Projection::new(*n, false)).collect()
    }

    fn bound(name: &str, value: impl Into<Value>, udt: &str) -> BoundColumn {
        BoundColumn {
            name: name.to_string(),
            value: value.into(),
            column_type: ColumnType::new("irrelevant", "pg_catalog", udt),
        }
    }

    #[test]
    fn unfiltered_page_binds_limit_and_offset() {
        let stmt = select_page(&list(None, None, 100, 0), &[]);
        assert_eq!(
            stmt.sql(),
            "SELECT * FROM \"public\".\"users\" LIMIT $1 OFFSET $2"
        );
        assert_eq!(stmt.params(), &[Value::Integer(100), Value::Integer(0)]);
    }

    #[test]
    fn filter_ors_one_condition_per_column() {
        let cols = projected(&["id", "name", "dept_id"]);
        let stmt = select_page(&list(Some("ann"), None, 10, 20), &cols);

        assert_eq!(
            stmt.sql(),
            "SELECT \"id\", \"name\", \"dept_id\" FROM \"public\".\"users\" WHERE (CAST(\"id\" AS TEXT) ILIKE $1 \
             OR CAST(\"name\" AS TEXT) ILIKE $2 OR CAST(\"dept_id\" AS TEXT) ILIKE $3) \
             LIMIT $4 OFFSET $5"
        );
        assert_eq!(stmt.sql().matches("ILIKE").count(), cols.len());
        let patterns = &stmt.params()[..cols.len()];
        assert!(patterns.iter().all(|p| p == &Value::Text("%ann%".into())));
        assert_eq!(&stmt.params()[cols.len()..], &[Value::Integer(10), Value::Integer(20)]);
    }

    #[test]
    fn filter_text_never_enters_sql() {
        let cols = projected(&["name"]);
        let stmt = select_page(&list(Some("'; DROP TABLE users; --"), None, 1, 0), &cols);
        assert!(!stmt.sql().contains("DROP"));
        assert_eq!(stmt.params()[0], Value::Text("%'; DROP TABLE users; --%".into()));
    }

    #[test]
    fn filter_on_table_without_columns_is_ignored() {
        let stmt = count(&list(Some("x"), None, 1, 0), &[]);
        assert_eq!(stmt.sql(), "SELECT COUNT(*) FROM \"public\".\"users\"");
        assert!(stmt.params().is_empty());
    }

    #[test]
    fn count_shares_the_predicate_without_paging() {
        let cols = projected(&["id", "name"]);
        let request = list(
            Some("ann"),
            Some(Sort {
                column: "name".into(),
                order: SortOrder::Desc,
            }),
            10,
            0,
        );
        let page = select_page(&request, &cols);
        let total = count(&request, &cols);

        assert_eq!(
            total.sql(),
            "SELECT COUNT(*) FROM \"public\".\"users\" WHERE (CAST(\"id\" AS TEXT) ILIKE $1 \
             OR CAST(\"name\" AS TEXT) ILIKE $2)"
        );
        assert_eq!(total.params(), &page.params()[..2]);
        assert!(page.sql().contains(" ORDER BY \"name\" DESC LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn non_native_columns_are_projected_as_text() {
        let cols = vec![
            Projection::new("id", false),
            Projection::new("mood", true),
            Projection::new("span", true),
        ];
        let stmt = select_page(&list(None, None, 10, 0), &cols);
        assert_eq!(
            stmt.sql(),
            "SELECT \"id\", CAST(\"mood\" AS TEXT) AS \"mood\", CAST(\"span\" AS TEXT) AS \"span\" \
             FROM \"public\".\"users\" LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn sort_column_is_quoted() {
        let request = list(
            None,
            Some(Sort {
                column: "na\"me".into(),
                order: SortOrder::Asc,
            }),
            5,
            0,
        );
        let stmt = select_page(&request, &[]);
        assert!(stmt.sql().contains("ORDER BY \"na\"\"me\" ASC"));
    }

    #[test]
    fn insert_returns_the_key() {
        let stmt = insert(
            &users(),
            "id",
            &[bound("name", "Ann", "text"), bound("dept_id", 1_i64, "int4")],
        );
        assert_eq!(
            stmt.sql(),
            "INSERT INTO \"public\".\"users\" (\"name\", \"dept_id\") VALUES \
             (CAST($1 AS \"pg_catalog\".\"text\"), CAST($2 AS \"pg_catalog\".\"int4\")) \
             RETURNING \"id\""
        );
        assert_eq!(stmt.params(), &[Value::Text("Ann".into()), Value::Integer(1)]);
    }

    #[test]
    fn insert_without_columns_uses_defaults() {
        let stmt = insert(&users(), "id", &[]);
        assert_eq!(
            stmt.sql(),
            "INSERT INTO \"public\".\"users\" DEFAULT VALUES RETURNING \"id\""
        );
    }

    #[test]
    fn update_binds_key_last() {
        let stmt = update(
            &users(),
            &bound("id", 7_i64, "int4"),
            &[bound("name", "Bob", "text")],
        )
        .unwrap();
        assert_eq!(
            stmt.sql(),
            "UPDATE \"public\".\"users\" SET \"name\" = CAST($1 AS \"pg_catalog\".\"text\") \
             WHERE \"id\" = CAST($2 AS \"pg_catalog\".\"int4\")"
        );
        assert_eq!(stmt.params(), &[Value::Text("Bob".into()), Value::Integer(7)]);
    }

    #[test]
    fn update_without_columns_is_rejected() {
        let err = update(&users(), &bound("id", 7_i64, "int4"), &[]).unwrap_err();
        assert!(matches!(err, AdminError::Validation(_)));
    }

    #[test]
    fn delete_targets_one_key() {
        let stmt = delete(&users(), &bound("id", 3_i64, "int4"));
        assert_eq!(
            stmt.sql(),
            "DELETE FROM \"public\".\"users\" WHERE \"id\" = CAST($1 AS \"pg_catalog\".\"int4\")"
        );
        assert_eq!(stmt.params(), &[Value::Integer(3)]);
    }

    #[test]
    fn options_concatenate_text_columns() {
        let target = ForeignKeyTarget {
            schema: "public".into(),
            table: "departments".into(),
            column: "id".into(),
        };
        let label = LabelExpr::from_text_columns(columns(&["name", "code"]), "id");
        assert_eq!(
            options(&target, &label).sql(),
            "SELECT \"id\" AS value, CONCAT_WS(' ', \"name\", \"code\") AS label \
             FROM \"public\".\"departments\""
        );

        let fallback = LabelExpr::from_text_columns(Vec::new(), "id");
        assert_eq!(fallback, LabelExpr::KeyAsText("id".into()));
        assert_eq!(
            options(&target, &fallback).sql(),
            "SELECT \"id\" AS value, CAST(\"id\" AS TEXT) AS label FROM \"public\".\"departments\""
        );
    }
}
