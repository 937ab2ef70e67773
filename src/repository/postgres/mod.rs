use async_trait::async_trait;
use sqlx::{
    PgPool, Postgres, Row as _,
    postgres::{PgArguments, PgRow},
    query::Query,
};
use tracing::debug;

use crate::{
    core::{AdminError, AdminResult, NormalizedType, Value, normalize},
    models::{BoundColumn, ColumnDescriptor, ListRequest, PagedResult, SchemaTables, TableRef, group_by_schema},
    sql::{Projection, Statement, builder},
};

use super::{AdminRepository, ColumnTypes};

pub mod catalog;
pub mod codec;
pub mod foreign_key;

#[derive(Clone)]
pub struct PgAdminRepository {
    pool: PgPool,
}

impl PgAdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Boolean(b) => query.bind(*b),
        Value::Integer(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.clone()),
        Value::Date(d) => query.bind(*d),
        Value::Time(t) => query.bind(*t),
        Value::Timestamp(ts) => query.bind(*ts),
    }
}

fn query_for(stmt: &Statement) -> Query<'_, Postgres, PgArguments> {
    debug!(sql = stmt.sql(), params = stmt.params().len(), "executing statement");
    stmt.params()
        .iter()
        .fold(sqlx::query(stmt.sql()), bind_value)
}

pub(crate) async fn fetch_all(pool: &PgPool, stmt: &Statement) -> Result<Vec<PgRow>, sqlx::Error> {
    query_for(stmt).fetch_all(pool).await
}

async fn fetch_one(pool: &PgPool, stmt: &Statement) -> Result<PgRow, sqlx::Error> {
    query_for(stmt).fetch_one(pool).await
}

async fn execute(pool: &PgPool, stmt: &Statement) -> Result<u64, sqlx::Error> {
    let result = query_for(stmt).execute(pool).await?;
    Ok(result.rows_affected())
}

#[async_trait]
impl AdminRepository for PgAdminRepository {
    async fn list_schemas_and_tables(&self) -> AdminResult<Vec<SchemaTables>> {
        let tables = catalog::list_tables(&self.pool).await?;
        Ok(group_by_schema(tables))
    }

    async fn describe_columns(&self, target: &TableRef) -> AdminResult<Vec<ColumnDescriptor>> {
        let metadata = catalog::column_metadata(&self.pool, target).await?;

        let mut columns = Vec::with_capacity(metadata.len());
        for column in metadata {
            let (kind, options) = match &column.foreign_key {
                Some(reference) => (
                    NormalizedType::Select,
                    Some(foreign_key::resolve_options(&self.pool, &column.name, reference).await),
                ),
                None => (normalize(&column.data_type), None),
            };

            columns.push(ColumnDescriptor {
                name: column.name,
                kind,
                options,
                readonly: column.is_primary_key,
            });
        }

        Ok(columns)
    }

    async fn column_types(&self, target: &TableRef) -> AdminResult<ColumnTypes> {
        catalog::column_types(&self.pool, target).await
    }

    async fn fetch_page(&self, request: &ListRequest) -> AdminResult<PagedResult> {
        let columns: Vec<Projection> = catalog::column_layout(&self.pool, &request.target)
            .await?
            .into_iter()
            .map(|(name, column_type)| {
                let as_text = !codec::reads_natively(&column_type.data_type);
                Projection::new(name, as_text)
            })
            .collect();

        let total_count = fetch_one(&self.pool, &builder::count(request, &columns))
            .await
            .and_then(|row| row.try_get::<i64, _>(0))
            .map_err(|err| AdminError::execution("Error counting rows", err))?;

        let rows = fetch_all(&self.pool, &builder::select_page(request, &columns))
            .await
            .map_err(|err| AdminError::execution("Failed to fetch table content", err))?;

        let data = rows.iter().map(codec::decode_row).collect();
        Ok(PagedResult::new(data, total_count, request.page))
    }

    async fn insert_record(
        &self,
        target: &TableRef,
        primary_key: &str,
        columns: &[BoundColumn],
    ) -> AdminResult<Value> {
        let stmt = builder::insert(target, primary_key, columns);
        let row = fetch_one(&self.pool, &stmt)
            .await
            .map_err(|err| AdminError::execution("Failed to insert record", err))?;

        Ok(codec::decode_column(&row, 0))
    }

    async fn update_record(
        &self,
        target: &TableRef,
        key: &BoundColumn,
        columns: &[BoundColumn],
    ) -> AdminResult<u64> {
        let stmt = builder::update(target, key, columns)?;
        let affected = execute(&self.pool, &stmt)
            .await
            .map_err(|err| AdminError::execution("Failed to update record", err))?;

        debug!(schema = %target.schema, table = %target.table, affected, "record updated");
        Ok(affected)
    }

    async fn delete_record(&self, target: &TableRef, key: &BoundColumn) -> AdminResult<u64> {
        let stmt = builder::delete(target, key);
        let affected = execute(&self.pool, &stmt)
            .await
            .map_err(|err| AdminError::execution("Failed to delete record", err))?;

        debug!(schema = %target.schema, table = %target.table, affected, "record deleted");
        Ok(affected)
    }
}
