//! Error types for the fit_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fit_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The database was written by a newer build
    #[error("Database schema version {found} is newer than supported {supported}")]
    Schema { found: u32, supported: u32 },

    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Malformed or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unique identifier already in use
    #[error("Duplicate: {0}")]
    Duplicate(String),
}

impl Error {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::Duplicate(_))
    }

    /// Errors caused by user input rather than the environment.
    ///
    /// The interactive menu reports these and keeps running.
    pub fn is_user_error(&self) -> bool {
        self.is_not_found() || self.is_validation() || self.is_duplicate()
    }
}
