use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    core::{AdminResult, ColumnType, Value},
    models::{BoundColumn, ColumnDescriptor, ListRequest, PagedResult, SchemaTables, TableRef},
};

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryAdminRepository, MemoryColumn, MemoryTable};
pub use postgres::PgAdminRepository;

/// Column name to raw type, as used by the write path.
pub type ColumnTypes = HashMap<String, ColumnType>;

/// Storage seam behind the HTTP handlers.
///
/// Every call is request-scoped: implementations read metadata fresh each
/// time and keep no per-request state between calls.
#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn list_schemas_and_tables(&self) -> AdminResult<Vec<SchemaTables>>;

    async fn describe_columns(&self, target: &TableRef) -> AdminResult<Vec<ColumnDescriptor>>;

    async fn column_types(&self, target: &TableRef) -> AdminResult<ColumnTypes>;

    async fn fetch_page(&self, request: &ListRequest) -> AdminResult<PagedResult>;

    /// Insert a row and return the generated primary-key value.
    async fn insert_record(
        &self,
        target: &TableRef,
        primary_key: &str,
        columns: &[BoundColumn],
    ) -> AdminResult<Value>;

    /// Returns the number of rows the key matched.
    async fn update_record(
        &self,
        target: &TableRef,
        key: &BoundColumn,
        columns: &[BoundColumn],
    ) -> AdminResult<u64>;

    /// Returns the number of rows removed.
    async fn delete_record(&self, target: &TableRef, key: &BoundColumn) -> AdminResult<u64>;
}
