use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{
    handlers::{
        delete_record, healthcheck, list_tables, method_not_allowed, save_record, table_content,
        table_fields,
    },
    state::AppState,
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/api/tables", get(list_tables))
        .route("/api/table-content", get(table_content))
        .route("/api/table-fields", get(table_fields))
        .route(
            "/api/save-record",
            post(save_record).fallback(method_not_allowed),
        )
        .route(
            "/api/delete-record",
            post(delete_record).fallback(method_not_allowed),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
