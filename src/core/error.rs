use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    /// Malformed or missing request input. No mutation has been attempted.
    #[error("{0}")]
    Validation(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Catalog/introspection query failed.
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// The main SELECT/COUNT/INSERT/UPDATE/DELETE statement failed.
    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Encoding error: {0}")]
    Encoding(String),
}

pub type AdminResult<T> = std::result::Result<T, AdminError>;

impl AdminError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn metadata(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Metadata(format!("{context}: {err}"))
    }

    pub fn execution(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Execution(format!("{context}: {err}"))
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encoding(err.to_string())
    }
}
