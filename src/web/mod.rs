//! HTTP surface: router, handlers, shared state and error mapping.

pub mod app;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

pub use app::build_router;
pub use state::AppState;
