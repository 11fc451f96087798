//! Error taxonomy shared by every layer of the tracker.

use thiserror::Error;

/// Result alias used across the library.
pub type Result<T> = std::result::Result<T, FinanceError>;

#[derive(Debug, Error)]
pub enum FinanceError {
    /// Bad user input: non-numeric amount, month out of range, empty category...
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation, e.g. a username that is already taken.
    #[error("{0}")]
    Conflict(String),

    /// Row does not exist, or exists but belongs to another user.
    #[error("{0}")]
    NotFound(String),

    #[error("Invalid username or password.")]
    InvalidCredentials,

    /// A sum or difference of amounts does not fit in a Decimal.
    #[error("Amounts are too large to add up.")]
    Overflow,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl FinanceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        FinanceError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        FinanceError::NotFound(msg.into())
    }

    /// True for errors caused by the caller's input rather than by storage
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            FinanceError::Validation(_)
                | FinanceError::Conflict(_)
                | FinanceError::NotFound(_)
                | FinanceError::InvalidCredentials
                | FinanceError::Overflow
        )
    }
}
