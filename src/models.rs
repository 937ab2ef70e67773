use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{AdminError, AdminResult, ColumnType, NormalizedType, Value};

pub const DEFAULT_LIMIT: i64 = 100;
pub const DEFAULT_OFFSET: i64 = 0;

/// One result row keyed by column name.
pub type Row = BTreeMap<String, Value>;

/// A schema-qualified table addressed by a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Build from optional request parameters, rejecting blanks.
    pub fn from_params(schema: Option<&str>, table: Option<&str>) -> AdminResult<Self> {
        match (schema.filter(|s| !s.is_empty()), table.filter(|t| !t.is_empty())) {
            (Some(schema), Some(table)) => Ok(Self::new(schema, table)),
            _ => Err(AdminError::validation("Schema or table name missing")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableDescriptor {
    #[serde(skip)]
    pub schema: String,
    #[serde(rename = "tableName")]
    pub name: String,
    #[serde(rename = "primaryKeyColumn")]
    pub primary_key_column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaTables {
    pub schema: String,
    pub tables: Vec<TableDescriptor>,
}

/// Group descriptors by schema, keeping the first occurrence of each table.
/// Input is expected in (schema, table) order.
pub fn group_by_schema(descriptors: Vec<TableDescriptor>) -> Vec<SchemaTables> {
    let mut grouped: Vec<SchemaTables> = Vec::new();
    for descriptor in descriptors {
        match grouped.last_mut() {
            Some(group) if group.schema == descriptor.schema => {
                if group.tables.iter().any(|t| t.name == descriptor.name) {
                    continue;
                }
                group.tables.push(descriptor);
            }
            _ => grouped.push(SchemaTables {
                schema: descriptor.schema.clone(),
                tables: vec![descriptor],
            }),
        }
    }
    grouped
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: NormalizedType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
    pub readonly: bool,
}

/// The column a foreign key points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyTarget {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl ForeignKeyTarget {
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(self.schema.clone(), self.table.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than exactly `asc` or `desc` sorts ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl Page {
    pub fn has_next_page(&self, total_count: i64) -> bool {
        total_count > self.offset.saturating_add(self.limit)
    }
}

/// Raw query string of `/api/table-content`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableContentQuery {
    pub schema: Option<String>,
    pub table: Option<String>,
    pub filter: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

/// Raw query string of `/api/table-fields`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableFieldsQuery {
    pub schema: Option<String>,
    pub table: Option<String>,
}

/// A validated list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub target: TableRef,
    pub filter: Option<String>,
    pub sort: Option<Sort>,
    pub page: Page,
}

impl TryFrom<TableContentQuery> for ListRequest {
    type Error = AdminError;

    fn try_from(query: TableContentQuery) -> AdminResult<Self> {
        let limit = parse_non_negative(query.limit.as_deref(), DEFAULT_LIMIT, "limit")?;
        let offset = parse_non_negative(query.offset.as_deref(), DEFAULT_OFFSET, "offset")?;
        let target = TableRef::from_params(query.schema.as_deref(), query.table.as_deref())?;

        let sort = query
            .sort_by
            .filter(|column| !column.is_empty())
            .map(|column| Sort {
                column,
                order: SortOrder::parse(query.order.as_deref()),
            });

        Ok(Self {
            target,
            filter: query.filter.filter(|f| !f.is_empty()),
            sort,
            page: Page { limit, offset },
        })
    }
}

fn parse_non_negative(raw: Option<&str>, default: i64, name: &str) -> AdminResult<i64> {
    let Some(raw) = raw.filter(|r| !r.is_empty()) else {
        return Ok(default);
    };
    match raw.parse::<i64>() {
        Ok(value) if value >= 0 => Ok(value),
        _ => Err(AdminError::validation(format!("Invalid {name} parameter"))),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult {
    pub data: Vec<Row>,
    pub total_count: i64,
    pub has_next_page: bool,
}

impl PagedResult {
    pub fn new(data: Vec<Row>, total_count: i64, page: Page) -> Self {
        Self {
            data,
            total_count,
            has_next_page: page.has_next_page(total_count),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub name: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// Body of `/api/save-record`, echoed back with the generated key on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayload {
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub primary_key: String,
    #[serde(default)]
    pub columns: Vec<ColumnEntry>,
}

/// Body of `/api/delete-record`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub primary_key: String,
    #[serde(default)]
    pub primary_key_value: serde_json::Value,
}

/// A converted write value together with the column's type, ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundColumn {
    pub name: String,
    pub value: Value,
    pub column_type: ColumnType,
}

/// A key value counts as present unless it is null or an empty string.
pub fn is_present(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
