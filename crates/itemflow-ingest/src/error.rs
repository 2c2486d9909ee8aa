//! Import error types

use thiserror::Error;

/// Result type alias for import operations
pub type ImportResult<T> = std::result::Result<T, ImportError>;

/// Pipeline phase, used to attribute failures in logs and spans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Extract,
    Transform,
    Load,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Extract => "extract",
            Phase::Transform => "transform",
            Phase::Load => "load",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by an item store
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// The store rejected an item whose name already exists
    #[error("Unique constraint violation: {detail}")]
    UniqueConstraintViolation {
        name: Option<String>,
        detail: String,
    },

    /// The store could not be reached or failed the write
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl PersistenceError {
    /// Create a unique constraint violation for a known name
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::UniqueConstraintViolation {
            detail: format!("item '{}' already exists", name),
            name: Some(name),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueConstraintViolation { .. })
    }

    /// Short machine-friendly kind, recorded on spans
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UniqueConstraintViolation { .. } => "unique_constraint_violation",
            Self::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::UniqueConstraintViolation {
                    name: None,
                    detail: db_err.message().to_string(),
                };
            }
        }

        Self::StoreUnavailable(err.to_string())
    }
}

/// Errors that abort an import run
#[derive(Error, Debug)]
pub enum ImportError {
    /// The input could not be opened or read
    #[error("Source '{source_name}' is unavailable: {source}")]
    SourceUnavailable {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    /// The input is not CSV with the expected header columns
    #[error("Failed to parse '{source_name}': {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// The store rejected the batch
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl ImportError {
    pub fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Phase that raised this error
    pub fn phase(&self) -> Phase {
        match self {
            Self::SourceUnavailable { .. } | Self::Parse { .. } => Phase::Extract,
            Self::Persistence(_) => Phase::Load,
        }
    }

    /// Short machine-friendly kind, recorded on spans
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "source_unavailable",
            Self::Parse { .. } => "parse_error",
            Self::Persistence(e) => e.kind(),
        }
    }
}
