//! Catalog lookups against `information_schema`.
//!
//! `information_schema` exposes its names as `sql_identifier`/
//! `character_data` domains, so every text column is cast to `text` before
//! it is decoded.

use sqlx::{PgPool, Row as _, postgres::PgRow};

use crate::core::{AdminError, AdminResult, ColumnType};
use crate::models::{ForeignKeyTarget, TableDescriptor, TableRef};
use crate::repository::ColumnTypes;
use crate::sql::Statement;

use super::fetch_all;

const TABLES_WITH_PRIMARY_KEYS: &str = r#"
    SELECT
        t.table_schema::text AS table_schema,
        t.table_name::text AS table_name,
        kcu.column_name::text AS primary_key_column
    FROM information_schema.tables AS t
    LEFT JOIN information_schema.table_constraints AS tc
        ON t.table_schema = tc.table_schema
        AND t.table_name = tc.table_name
        AND tc.constraint_type = 'PRIMARY KEY'
    LEFT JOIN information_schema.key_column_usage AS kcu
        ON tc.constraint_name = kcu.constraint_name
        AND tc.table_schema = kcu.table_schema
        AND tc.table_name = kcu.table_name
    WHERE t.table_type = 'BASE TABLE'
        AND t.table_schema NOT IN ('pg_catalog', 'information_schema')
    ORDER BY t.table_schema, t.table_name, kcu.ordinal_position
"#;

const COLUMN_METADATA: &str = r#"
    SELECT
        col.column_name::text AS column_name,
        col.data_type::text AS data_type,
        ccu.table_schema::text AS referenced_schema,
        ccu.table_name::text AS referenced_table,
        ccu.column_name::text AS referenced_column,
        pk.constraint_type IS NOT NULL AS is_primary_key
    FROM information_schema.columns AS col
    LEFT JOIN information_schema.key_column_usage AS kcu
        ON col.table_schema = kcu.table_schema
        AND col.table_name = kcu.table_name
        AND col.column_name = kcu.column_name
    LEFT JOIN information_schema.table_constraints AS fk
        ON kcu.constraint_name = fk.constraint_name
        AND kcu.table_schema = fk.table_schema
        AND fk.constraint_type = 'FOREIGN KEY'
    LEFT JOIN information_schema.table_constraints AS pk
        ON kcu.constraint_name = pk.constraint_name
        AND kcu.table_schema = pk.table_schema
        AND pk.constraint_type = 'PRIMARY KEY'
    LEFT JOIN information_schema.constraint_column_usage AS ccu
        ON fk.constraint_name = ccu.constraint_name
        AND fk.table_schema = ccu.table_schema
    WHERE col.table_schema = $1 AND col.table_name = $2
    ORDER BY col.ordinal_position
"#;

const COLUMN_TYPES: &str = r#"
    SELECT
        column_name::text AS column_name,
        data_type::text AS data_type,
        udt_schema::text AS udt_schema,
        udt_name::text AS udt_name
    FROM information_schema.columns
    WHERE table_schema = $1 AND table_name = $2
    ORDER BY ordinal_position
"#;

const TEXT_COLUMNS: &str = r#"
    SELECT column_name::text AS column_name
    FROM information_schema.columns
    WHERE table_schema = $1
        AND table_name = $2
        AND data_type IN ('character varying', 'text', 'character')
    ORDER BY ordinal_position
"#;

/// One row of [`COLUMN_METADATA`]. A column covered by several constraints
/// shows up once per constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadataRow {
    pub name: String,
    pub data_type: String,
    pub referenced_schema: Option<String>,
    pub referenced_table: Option<String>,
    pub referenced_column: Option<String>,
    pub is_primary_key: bool,
}

/// Constraint-merged view of a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub name: String,
    pub data_type: String,
    pub foreign_key: Option<ForeignKeyTarget>,
    pub is_primary_key: bool,
}

/// Fold per-constraint rows into one entry per column, keeping first-seen
/// order. A foreign key needs all three referenced parts to count.
pub fn merge_column_rows(rows: Vec<ColumnMetadataRow>) -> Vec<ColumnMetadata> {
    let mut merged: Vec<ColumnMetadata> = Vec::new();
    for row in rows {
        let foreign_key = match (row.referenced_schema, row.referenced_table, row.referenced_column) {
            (Some(schema), Some(table), Some(column)) => Some(ForeignKeyTarget {
                schema,
                table,
                column,
            }),
            _ => None,
        };

        if let Some(existing) = merged.iter_mut().find(|c| c.name == row.name) {
            existing.is_primary_key |= row.is_primary_key;
            if existing.foreign_key.is_none() {
                existing.foreign_key = foreign_key;
            }
            continue;
        }

        merged.push(ColumnMetadata {
            name: row.name,
            data_type: row.data_type,
            foreign_key,
            is_primary_key: row.is_primary_key,
        });
    }
    merged
}

fn table_filter(sql: &str, target: &TableRef) -> Statement {
    let mut stmt = Statement::new(sql);
    stmt.bind(target.schema.as_str());
    stmt.bind(target.table.as_str());
    stmt
}

fn text(row: &PgRow, column: &str) -> Result<String, sqlx::Error> {
    row.try_get::<String, _>(column)
}

fn optional_text(row: &PgRow, column: &str) -> Result<Option<String>, sqlx::Error> {
    row.try_get::<Option<String>, _>(column)
}

pub async fn list_tables(pool: &PgPool) -> AdminResult<Vec<TableDescriptor>> {
    let rows = fetch_all(pool, &Statement::new(TABLES_WITH_PRIMARY_KEYS))
        .await
        .map_err(|err| AdminError::metadata("Error fetching tables", err))?;

    rows.iter()
        .map(|row| -> Result<TableDescriptor, sqlx::Error> {
            Ok(TableDescriptor {
                schema: text(row, "table_schema")?,
                name: text(row, "table_name")?,
                primary_key_column: optional_text(row, "primary_key_column")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(|err| AdminError::metadata("Error scanning tables", err))
}

pub async fn column_metadata(pool: &PgPool, target: &TableRef) -> AdminResult<Vec<ColumnMetadata>> {
    let rows = fetch_all(pool, &table_filter(COLUMN_METADATA, target))
        .await
        .map_err(|err| AdminError::metadata("Error querying columns", err))?;

    let rows = rows
        .iter()
        .map(|row| -> Result<ColumnMetadataRow, sqlx::Error> {
            Ok(ColumnMetadataRow {
                name: text(row, "column_name")?,
                data_type: text(row, "data_type")?,
                referenced_schema: optional_text(row, "referenced_schema")?,
                referenced_table: optional_text(row, "referenced_table")?,
                referenced_column: optional_text(row, "referenced_column")?,
                is_primary_key: row.try_get::<bool, _>("is_primary_key")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(|err| AdminError::metadata("Error scanning column data", err))?;

    Ok(merge_column_rows(rows))
}

/// Column names and types in ordinal order.
pub async fn column_layout(
    pool: &PgPool,
    target: &TableRef,
) -> AdminResult<Vec<(String, ColumnType)>> {
    let rows = fetch_all(pool, &table_filter(COLUMN_TYPES, target))
        .await
        .map_err(|err| AdminError::metadata("failed to fetch column types", err))?;

    rows.iter()
        .map(|row| -> Result<(String, ColumnType), sqlx::Error> {
            Ok((
                text(row, "column_name")?,
                ColumnType::new(
                    text(row, "data_type")?,
                    text(row, "udt_schema")?,
                    text(row, "udt_name")?,
                ),
            ))
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(|err| AdminError::metadata("failed to scan column types", err))
}

pub async fn column_types(pool: &PgPool, target: &TableRef) -> AdminResult<ColumnTypes> {
    Ok(column_layout(pool, target).await?.into_iter().collect())
}

/// Character/text columns of a table, used to label foreign-key options.
pub async fn text_columns(pool: &PgPool, target: &TableRef) -> AdminResult<Vec<String>> {
    let rows = fetch_all(pool, &table_filter(TEXT_COLUMNS, target))
        .await
        .map_err(|err| AdminError::metadata("Error fetching text columns", err))?;

    rows.iter()
        .map(|row| text(row, "column_name"))
        .collect::<Result<Vec<_>, sqlx::Error>>()
        .map_err(|err| AdminError::metadata("Error scanning text columns", err))
}
