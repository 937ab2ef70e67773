use axum::{
    extract::{FromRequest, FromRequestParts},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::core::{AdminError, AdminResult};

/// `Json` body whose rejections surface as plain-text 400s.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AdminError))]
pub struct JsonBody<T>(pub T);

/// `Query` string whose rejections surface as plain-text 400s.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AdminError))]
pub struct QueryParams<T>(pub T);

/// Serialize up front so a failure becomes an `Encoding` error instead of
/// a truncated body.
pub fn json_response<T: Serialize>(value: &T) -> AdminResult<Response> {
    let body = serde_json::to_vec(value)?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body).into_response())
}
