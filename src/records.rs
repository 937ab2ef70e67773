//! Write path: turns a save/delete payload into typed binds and hands them to
//! the repository.

use tracing::{info, warn};

use crate::{
    core::{AdminError, AdminResult, convert_for_write},
    models::{BoundColumn, ColumnEntry, DeleteRequest, RecordPayload, TableRef, is_present},
    repository::{AdminRepository, ColumnTypes},
};

/// Column types of an existing table. A table with no visible columns does
/// not exist for the write path, which is a statement failure rather than a
/// bad column name.
async fn table_types(
    repo: &dyn AdminRepository,
    target: &TableRef,
    context: &str,
) -> AdminResult<ColumnTypes> {
    let types = repo.column_types(target).await?;
    if types.is_empty() {
        return Err(AdminError::execution(
            context,
            format!("relation \"{}\".\"{}\" does not exist", target.schema, target.table),
        ));
    }
    Ok(types)
}

fn bind_column(types: &ColumnTypes, name: &str, value: &serde_json::Value) -> AdminResult<BoundColumn> {
    let column_type = types
        .get(name)
        .ok_or_else(|| AdminError::validation(format!("Unknown column: {name}")))?;

    Ok(BoundColumn {
        name: name.to_string(),
        value: convert_for_write(name, column_type, value)?,
        column_type: column_type.clone(),
    })
}

/// Insert or update one row.
///
/// A present, non-empty value for the `primaryKey` entry means UPDATE;
/// anything else means INSERT, after which the generated key is written back
/// into the returned payload.
pub async fn save_record(
    repo: &dyn AdminRepository,
    mut payload: RecordPayload,
) -> AdminResult<RecordPayload> {
    if payload.schema.is_empty() || payload.table.is_empty() || payload.primary_key.is_empty() {
        return Err(AdminError::validation("Schema, table or primary key missing"));
    }
    let target = TableRef::new(payload.schema.as_str(), payload.table.as_str());
    let types = table_types(repo, &target, "Failed to save record").await?;

    let mut key_value = None;
    let mut columns = Vec::with_capacity(payload.columns.len());
    for entry in &payload.columns {
        if entry.name == payload.primary_key {
            if !types.contains_key(&entry.name) {
                return Err(AdminError::validation(format!("Unknown column: {}", entry.name)));
            }
            key_value = Some(&entry.value);
            continue;
        }
        columns.push(bind_column(&types, &entry.name, &entry.value)?);
    }

    match key_value.filter(|value| is_present(value)) {
        Some(value) => {
            let key = bind_column(&types, &payload.primary_key, value)?;
            let affected = repo.update_record(&target, &key, &columns).await?;
            if affected == 0 {
                warn!(schema = %target.schema, table = %target.table, key = %key.value, "update matched no rows");
            } else {
                info!(schema = %target.schema, table = %target.table, affected, "record updated");
            }
        }
        None => {
            if !types.contains_key(&payload.primary_key) {
                return Err(AdminError::validation(format!(
                    "Unknown column: {}",
                    payload.primary_key
                )));
            }
            let generated = repo
                .insert_record(&target, &payload.primary_key, &columns)
                .await?;
            info!(schema = %target.schema, table = %target.table, key = %generated, "record inserted");

            let value = generated.to_json();
            match payload
                .columns
                .iter_mut()
                .find(|entry| entry.name == payload.primary_key)
            {
                Some(entry) => entry.value = value,
                None => payload.columns.push(ColumnEntry {
                    name: payload.primary_key.clone(),
                    value,
                }),
            }
        }
    }

    Ok(payload)
}

pub async fn delete_record(repo: &dyn AdminRepository, request: DeleteRequest) -> AdminResult<()> {
    if request.schema.is_empty()
        || request.table.is_empty()
        || request.primary_key.is_empty()
        || !is_present(&request.primary_key_value)
    {
        return Err(AdminError::validation("Missing parameters for delete"));
    }

    let target = TableRef::new(request.schema.as_str(), request.table.as_str());
    let types = table_types(repo, &target, "Failed to delete record").await?;
    let key = bind_column(&types, &request.primary_key, &request.primary_key_value)?;

    let affected = repo.delete_record(&target, &key).await?;
    if affected == 0 {
        warn!(schema = %target.schema, table = %target.table, key = %key.value, "delete matched no rows");
    } else {
        info!(schema = %target.schema, table = %target.table, key = %key.value, "record deleted");
    }
    Ok(())
}
