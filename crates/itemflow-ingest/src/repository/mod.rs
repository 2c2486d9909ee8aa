//! Item store port and its adapters
//!
//! The loader only ever talks to [`ItemRepository`]. Two adapters ship with
//! the crate:
//!
//! - [`PgItemRepository`]: PostgreSQL via sqlx, used by the CLI
//! - [`InMemoryItemRepository`]: process-local, used for dry runs and tests
//!
//! Whether a batch containing one conflicting name keeps its other rows is
//! decided by the adapter's [`CommitPolicy`], not by the loader.

use async_trait::async_trait;
use itemflow_common::NewItem;

use crate::error::PersistenceError;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryItemRepository;
pub use postgres::PgItemRepository;

/// Append-only access to the item store
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Insert every item as one unit of work.
    ///
    /// Returns the number of items inserted. A name that already exists must
    /// be reported as `PersistenceError::UniqueConstraintViolation`, never
    /// overwritten.
    async fn add_batch(&self, items: &[NewItem]) -> Result<usize, PersistenceError>;
}

/// What happens to the rest of a batch when one item conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitPolicy {
    /// Roll back the whole batch
    #[default]
    Atomic,
    /// Keep the non-conflicting items, still report the conflict
    BestEffort,
}

impl CommitPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitPolicy::Atomic => "atomic",
            CommitPolicy::BestEffort => "best-effort",
        }
    }
}

impl std::str::FromStr for CommitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "atomic" | "all-or-nothing" => Ok(CommitPolicy::Atomic),
            "best-effort" | "best_effort" | "partial" => Ok(CommitPolicy::BestEffort),
            _ => Err(format!(
                "invalid commit policy '{}', expected 'atomic' or 'best-effort'",
                s
            )),
        }
    }
}

impl std::fmt::Display for CommitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
