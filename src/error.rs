//! Error taxonomy shared by every core operation.
//!
//! Per-field extraction misses are not errors: they are absorbed into a partial
//! [`SpecRecord`](crate::domain::extract::SpecRecord). Everything below aborts the
//! operation that raised it; nothing is retried.

/// Failure of a core operation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Network, DNS, timeout or non-success status while fetching an external page.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Any persistence operation error.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The referenced catalog item, review or session does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The admin gate was not satisfied.
    #[error("not authorized: {0}")]
    Authorization(String),

    /// Missing upload or malformed input.
    #[error("invalid input: {0}")]
    Validation(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    /// Whether the detail of this error may be shown to a caller.
    ///
    /// Storage and fetch failures keep their detail in the logs only.
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            CoreError::NotFound { .. } | CoreError::Authorization(_) | CoreError::Validation(_)
        )
    }
}

impl From<sqlx::Error> for CoreError {
    fn from(e: sqlx::Error) -> Self {
        CoreError::Storage(e.to_string())
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Storage(format!("file storage: {}", e))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
