use std::cmp::Ordering;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    core::{AdminError, AdminResult, ColumnType, NormalizedType, Value, WriteClass, normalize},
    models::{
        BoundColumn, ColumnDescriptor, ForeignKeyTarget, ListRequest, PagedResult, Row,
        SchemaTables, SelectOption, SortOrder, TableDescriptor, TableRef, group_by_schema,
    },
};

use super::{AdminRepository, ColumnTypes};

#[derive(Debug, Clone)]
pub struct MemoryColumn {
    pub name: String,
    /// Catalog-style type name, e.g. `integer` or `character varying`.
    pub data_type: String,
    pub primary_key: bool,
    pub references: Option<ForeignKeyTarget>,
}

impl MemoryColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            primary_key: false,
            references: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn references(
        mut self,
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        self.references = Some(ForeignKeyTarget {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        });
        self
    }

    fn is_text(&self) -> bool {
        matches!(
            self.data_type.to_ascii_lowercase().as_str(),
            "character varying" | "text" | "character"
        )
    }
}

#[derive(Debug, Clone)]
pub struct MemoryTable {
    pub schema: String,
    pub name: String,
    pub columns: Vec<MemoryColumn>,
    rows: Vec<Vec<Value>>,
    next_key: i64,
}

impl MemoryTable {
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<MemoryColumn>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns,
            rows: Vec::new(),
            next_key: 1,
        }
    }

    /// Append a row given in column order. Missing trailing cells are NULL.
    pub fn with_row(mut self, mut values: Vec<Value>) -> Self {
        values.resize(self.columns.len(), Value::Null);
        if let Some(key) = self.key_index().and_then(|index| values.get(index)?.as_i64()) {
            self.next_key = self.next_key.max(key + 1);
        }
        self.rows.push(values);
        self
    }

    fn key_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.primary_key)
    }

    fn column_index(&self, name: &str) -> AdminResult<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| {
                AdminError::Execution(format!(
                    "column \"{name}\" of relation \"{}\" does not exist",
                    self.name
                ))
            })
    }

    fn matches(&self, target: &TableRef) -> bool {
        self.schema == target.schema && self.name == target.table
    }

    fn row_map(&self, row: &[Value]) -> Row {
        self.columns
            .iter()
            .zip(row)
            .map(|(column, value)| (column.name.clone(), value.clone()))
            .collect()
    }

    fn key_matches(&self, row: &[Value], index: usize, key: &Value) -> bool {
        row.get(index)
            .is_some_and(|value| !value.is_null() && value.compare(key) == Ordering::Equal)
    }
}

/// Column-typed coercion of a bound value, standing in for the
/// `CAST(... AS <type>)` the SQL path applies.
fn coerce(value: Value, column: &MemoryColumn) -> AdminResult<Value> {
    let invalid = |value: &Value| {
        AdminError::Execution(format!(
            "invalid input syntax for type {}: \"{value}\"",
            column.data_type
        ))
    };

    match (WriteClass::of(&column.data_type), value) {
        (_, Value::Null) => Ok(Value::Null),
        (WriteClass::Integer, Value::Text(text)) => text
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| invalid(&Value::Text(text))),
        (WriteClass::Numeric, Value::Integer(i)) => Ok(Value::Float(i as f64)),
        (WriteClass::Numeric, Value::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid(&Value::Text(text))),
        (WriteClass::Other, value) if column.is_text() => Ok(Value::Text(value.to_string())),
        (_, value) => Ok(value),
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAdminRepository {
    tables: RwLock<Vec<MemoryTable>>,
}

impl InMemoryAdminRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Vec<MemoryTable>) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }

    /// Snapshot of a table's rows, keyed by column name.
    pub async fn rows(&self, target: &TableRef) -> Vec<Row> {
        self.tables
            .read()
            .await
            .iter()
            .find(|t| t.matches(target))
            .map(|table| table.rows.iter().map(|row| table.row_map(row)).collect())
            .unwrap_or_default()
    }
}

fn missing_relation(target: &TableRef) -> AdminError {
    AdminError::Execution(format!(
        "relation \"{}.{}\" does not exist",
        target.schema, target.table
    ))
}

fn options_for(tables: &[MemoryTable], reference: &ForeignKeyTarget) -> Vec<SelectOption> {
    let Some(table) = tables.iter().find(|t| t.matches(&reference.table_ref())) else {
        return Vec::new();
    };
    let Ok(key_index) = table.column_index(&reference.column) else {
        return Vec::new();
    };
    let text_indexes: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, column)| column.is_text())
        .map(|(index, _)| index)
        .collect();

    table
        .rows
        .iter()
        .map(|row| {
            let label = if text_indexes.is_empty() {
                row[key_index].to_string()
            } else {
                text_indexes
                    .iter()
                    .filter(|index| !row[**index].is_null())
                    .map(|index| row[*index].to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            SelectOption {
                value: row[key_index].clone(),
                label,
            }
        })
        .collect()
}

#[async_trait]
impl AdminRepository for InMemoryAdminRepository {
    async fn list_schemas_and_tables(&self) -> AdminResult<Vec<SchemaTables>> {
        let tables = self.tables.read().await;
        let mut descriptors: Vec<TableDescriptor> = tables
            .iter()
            .map(|table| TableDescriptor {
                schema: table.schema.clone(),
                name: table.name.clone(),
                primary_key_column: table
                    .key_index()
                    .map(|index| table.columns[index].name.clone()),
            })
            .collect();
        descriptors.sort_by(|a, b| (&a.schema, &a.name).cmp(&(&b.schema, &b.name)));
        Ok(group_by_schema(descriptors))
    }

    async fn describe_columns(&self, target: &TableRef) -> AdminResult<Vec<ColumnDescriptor>> {
        let tables = self.tables.read().await;
        let Some(table) = tables.iter().find(|t| t.matches(target)) else {
            return Ok(Vec::new());
        };

        Ok(table
            .columns
            .iter()
            .map(|column| {
                let (kind, options) = match &column.references {
                    Some(reference) => (NormalizedType::Select, Some(options_for(&tables, reference))),
                    None => (normalize(&column.data_type), None),
                };
                ColumnDescriptor {
                    name: column.name.clone(),
                    kind,
                    options,
                    readonly: column.primary_key,
                }
            })
            .collect())
    }

    async fn column_types(&self, target: &TableRef) -> AdminResult<ColumnTypes> {
        let tables = self.tables.read().await;
        Ok(tables
            .iter()
            .find(|t| t.matches(target))
            .map(|table| {
                table
                    .columns
                    .iter()
                    .map(|column| {
                        (
                            column.name.clone(),
                            ColumnType::new(&column.data_type, "pg_catalog", &column.data_type),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_page(&self, request: &ListRequest) -> AdminResult<PagedResult> {
        let tables = self.tables.read().await;
        let table = tables
            .iter()
            .find(|t| t.matches(&request.target))
            .ok_or_else(|| missing_relation(&request.target))?;

        let needle = request.filter.as_deref().map(str::to_lowercase);
        let mut rows: Vec<&Vec<Value>> = table
            .rows
            .iter()
            .filter(|row| match &needle {
                Some(needle) if !table.columns.is_empty() => row
                    .iter()
                    .any(|value| value.to_string().to_lowercase().contains(needle.as_str())),
                _ => true,
            })
            .collect();

        if let Some(sort) = &request.sort {
            let index = table.column_index(&sort.column)?;
            rows.sort_by(|a, b| {
                let order = a[index].compare(&b[index]);
                match sort.order {
                    SortOrder::Asc => order,
                    SortOrder::Desc => order.reverse(),
                }
            });
        }

        let total_count = rows.len() as i64;
        let data = rows
            .into_iter()
            .skip(usize::try_from(request.page.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(request.page.limit).unwrap_or(usize::MAX))
            .map(|row| table.row_map(row))
            .collect();

        Ok(PagedResult::new(data, total_count, request.page))
    }

    async fn insert_record(
        &self,
        target: &TableRef,
        primary_key: &str,
        columns: &[BoundColumn],
    ) -> AdminResult<Value> {
        let mut tables = self.tables.write().await;
        let table = tables
            .iter_mut()
            .find(|t| t.matches(target))
            .ok_or_else(|| missing_relation(target))?;

        let key_index = table.column_index(primary_key)?;
        let mut row = vec![Value::Null; table.columns.len()];
        for column in columns {
            let index = table.column_index(&column.name)?;
            row[index] = coerce(column.value.clone(), &table.columns[index])?;
        }

        if row[key_index].is_null() {
            row[key_index] = Value::Integer(table.next_key);
        }
        if let Some(key) = row[key_index].as_i64() {
            table.next_key = table.next_key.max(key + 1);
        }

        let key = row[key_index].clone();
        if table
            .rows
            .iter()
            .any(|existing| table.key_matches(existing, key_index, &key))
        {
            return Err(AdminError::Execution(format!(
                "duplicate key value violates unique constraint on \"{primary_key}\""
            )));
        }

        table.rows.push(row);
        Ok(key)
    }

    async fn update_record(
        &self,
        target: &TableRef,
        key: &BoundColumn,
        columns: &[BoundColumn],
    ) -> AdminResult<u64> {
        if columns.is_empty() {
            return Err(AdminError::validation("No columns to update"));
        }

        let mut tables = self.tables.write().await;
        let table = tables
            .iter_mut()
            .find(|t| t.matches(target))
            .ok_or_else(|| missing_relation(target))?;

        let key_index = table.column_index(&key.name)?;
        let key_value = coerce(key.value.clone(), &table.columns[key_index])?;

        let mut assignments = Vec::with_capacity(columns.len());
        for column in columns {
            let index = table.column_index(&column.name)?;
            assignments.push((index, coerce(column.value.clone(), &table.columns[index])?));
        }

        let matching: Vec<usize> = (0..table.rows.len())
            .filter(|row| table.key_matches(&table.rows[*row], key_index, &key_value))
            .collect();
        for row in &matching {
            for (index, value) in &assignments {
                table.rows[*row][*index] = value.clone();
            }
        }
        Ok(matching.len() as u64)
    }

    async fn delete_record(&self, target: &TableRef, key: &BoundColumn) -> AdminResult<u64> {
        let mut tables = self.tables.write().await;
        let table = tables
            .iter_mut()
            .find(|t| t.matches(target))
            .ok_or_else(|| missing_relation(target))?;

        let key_index = table.column_index(&key.name)?;
        let key_value = coerce(key.value.clone(), &table.columns[key_index])?;

        let rows = std::mem::take(&mut table.rows);
        let before = rows.len();
        table.rows = rows
            .into_iter()
            .filter(|row| !table.key_matches(row, key_index, &key_value))
            .collect();
        Ok((before - table.rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Page, Sort};

    fn people() -> MemoryTable {
        MemoryTable::new(
            "public",
            "people",
            vec![
                MemoryColumn::new("id", "integer").primary_key(),
                MemoryColumn::new("name", "text"),
                MemoryColumn::new("score", "numeric"),
            ],
        )
        .with_row(vec![Value::Integer(1), "Anna".into(), Value::Float(2.5)])
        .with_row(vec![Value::Integer(2), "Joe".into(), Value::Null])
        .with_row(vec![Value::Integer(3), "Hannah".into(), Value::Float(1.0)])
    }

    fn request(filter: Option<&str>, sort: Option<Sort>, page: Page) -> ListRequest {
        ListRequest {
            target: TableRef::new("public", "people"),
            filter: filter.map(str::to_string),
            sort,
            page,
        }
    }

    #[tokio::test]
    async fn filter_matches_any_column_case_insensitively() {
        let repo = InMemoryAdminRepository::with_tables(vec![people()]);
        let page = repo
            .fetch_page(&request(Some("ANN"), None, Page::default()))
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert!(!page.has_next_page);

        let page = repo
            .fetch_page(&request(Some("2.5"), None, Page::default()))
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
    }

    #[tokio::test]
    async fn desc_sort_puts_nulls_first() {
        let repo = InMemoryAdminRepository::with_tables(vec![people()]);
        let sort = Sort {
            column: "score".into(),
            order: SortOrder::Desc,
        };
        let page = repo
            .fetch_page(&request(None, Some(sort), Page { limit: 2, offset: 0 }))
            .await
            .unwrap();

        assert_eq!(page.total_count, 3);
        assert!(page.has_next_page);
        assert_eq!(page.data[0]["name"], Value::Text("Joe".into()));
        assert_eq!(page.data[1]["name"], Value::Text("Anna".into()));
    }

    #[tokio::test]
    async fn insert_assigns_next_key_and_coerces_text() {
        let repo = InMemoryAdminRepository::with_tables(vec![people()]);
        let target = TableRef::new("public", "people");
        let score = BoundColumn {
            name: "score".into(),
            value: Value::Text("4.5".into()),
            column_type: ColumnType::new("numeric", "pg_catalog", "numeric"),
        };

        let key = repo.insert_record(&target, "id", &[score]).await.unwrap();
        assert_eq!(key, Value::Integer(4));

        let rows = repo.rows(&target).await;
        assert_eq!(rows[3]["score"], Value::Float(4.5));
    }

    #[tokio::test]
    async fn writes_report_matched_rows() {
        let repo = InMemoryAdminRepository::with_tables(vec![people()]);
        let target = TableRef::new("public", "people");
        let key = |id: i64| BoundColumn {
            name: "id".into(),
            value: Value::Integer(id),
            column_type: ColumnType::new("integer", "pg_catalog", "int4"),
        };
        let name = BoundColumn {
            name: "name".into(),
            value: Value::Text("Renamed".into()),
            column_type: ColumnType::new("text", "pg_catalog", "text"),
        };

        assert_eq!(repo.update_record(&target, &key(2), &[name.clone()]).await.unwrap(), 1);
        assert_eq!(repo.update_record(&target, &key(99), &[name]).await.unwrap(), 0);
        assert_eq!(repo.delete_record(&target, &key(99)).await.unwrap(), 0);
        assert_eq!(repo.delete_record(&target, &key(2)).await.unwrap(), 1);
        assert_eq!(repo.rows(&target).await.len(), 2);
    }

    #[tokio::test]
    async fn missing_table_is_an_execution_error() {
        let repo = InMemoryAdminRepository::new();
        let err = repo
            .fetch_page(&request(None, None, Page::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Execution(_)));
    }
}
