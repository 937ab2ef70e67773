use axum::{Json, extract::State, response::Response};
use serde_json::json;
use tracing::debug;

use crate::{
    core::{AdminError, AdminResult},
    models::{
        DeleteRequest, ListRequest, RecordPayload, TableContentQuery, TableFieldsQuery, TableRef,
    },
    records,
};

use super::{
    extract::{JsonBody, QueryParams, json_response},
    state::AppState,
};

pub async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_tables(State(state): State<AppState>) -> AdminResult<Response> {
    let schemas = state.repo.list_schemas_and_tables().await?;
    json_response(&schemas)
}

pub async fn table_content(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TableContentQuery>,
) -> AdminResult<Response> {
    let request = ListRequest::try_from(query)?;
    debug!(
        schema = %request.target.schema,
        table = %request.target.table,
        limit = request.page.limit,
        offset = request.page.offset,
        "listing table content"
    );

    let page = state.repo.fetch_page(&request).await?;
    json_response(&page)
}

pub async fn table_fields(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TableFieldsQuery>,
) -> AdminResult<Response> {
    let target = TableRef::from_params(query.schema.as_deref(), query.table.as_deref())?;
    let columns = state.repo.describe_columns(&target).await?;
    json_response(&columns)
}

pub async fn save_record(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RecordPayload>,
) -> AdminResult<Response> {
    let saved = records::save_record(state.repo.as_ref(), payload).await?;
    json_response(&saved)
}

pub async fn delete_record(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<DeleteRequest>,
) -> AdminResult<&'static str> {
    records::delete_record(state.repo.as_ref(), request).await?;
    Ok("Record deleted successfully")
}

pub async fn method_not_allowed() -> AdminError {
    AdminError::MethodNotAllowed
}
