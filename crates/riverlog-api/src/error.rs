use thiserror::Error;

use riverlog_db::models::WriteOutcome;

/// Errors surfaced to GraphQL callers. Domain variants carry the exact
/// message the caller sees; store failures pass through untouched.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid credential, or failed login.
    #[error("{0}")]
    Auth(String),

    /// Referenced row is absent or not owned by the caller.
    #[error("{0}")]
    NotFound(String),

    /// Natural-key or uniqueness collision.
    #[error("{0}")]
    Duplicate(String),

    /// Password reset token invalid or expired.
    #[error("{0}")]
    Token(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate(message.into())
    }

    pub fn token(message: impl Into<String>) -> Self {
        Self::Token(message.into())
    }
}

/// Map a guarded store write onto the caller-facing error for each way it
/// can be refused.
pub(crate) fn settle<T>(outcome: WriteOutcome<T>, missing: &str, conflict: &str) -> ApiResult<T> {
    match outcome {
        WriteOutcome::Done(row) => Ok(row),
        WriteOutcome::Missing => Err(ApiError::not_found(missing)),
        WriteOutcome::Conflict => Err(ApiError::duplicate(conflict)),
    }
}
