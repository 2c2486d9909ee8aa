//! PostgreSQL item store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itemflow_common::{Item, NewItem};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, info, warn};

use super::{CommitPolicy, ItemRepository};
use crate::error::PersistenceError;

const CREATE_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT items_name_key UNIQUE (name)
)
"#;

/// Item store backed by the `items` table
#[derive(Debug, Clone)]
pub struct PgItemRepository {
    pool: PgPool,
    policy: CommitPolicy,
}

impl PgItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            policy: CommitPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CommitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create the `items` table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        sqlx::query(CREATE_ITEMS_TABLE).execute(&self.pool).await?;
        debug!("Ensured items table exists");
        Ok(())
    }

    /// All stored items ordered by id
    pub async fn list(&self) -> Result<Vec<Item>, PersistenceError> {
        let rows = sqlx::query("SELECT id, name, description, created_at FROM items ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Item {
                    id: row.try_get::<i64, _>("id")?,
                    name: row.try_get::<String, _>("name")?,
                    description: row.try_get::<Option<String>, _>("description")?,
                    created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(PersistenceError::from)
    }

    async fn insert_tx(
        tx: &mut Transaction<'_, Postgres>,
        item: &NewItem,
    ) -> Result<(), PersistenceError> {
        sqlx::query("INSERT INTO items (name, description, created_at) VALUES ($1, $2, $3)")
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.created_at)
            .execute(&mut **tx)
            .await
            .map_err(|e| with_name(e.into(), &item.name))?;

        Ok(())
    }

    /// One transaction, first failure rolls everything back
    async fn add_atomic(&self, items: &[NewItem]) -> Result<usize, PersistenceError> {
        let mut tx = self.pool.begin().await?;

        for item in items {
            Self::insert_tx(&mut tx, item).await?;
        }

        tx.commit().await?;
        Ok(items.len())
    }

    /// One transaction, each row isolated by a savepoint so a duplicate
    /// name only discards that row
    async fn add_best_effort(&self, items: &[NewItem]) -> Result<usize, PersistenceError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        let mut first_conflict = None;

        for item in items {
            sqlx::query("SAVEPOINT item_savepoint").execute(&mut *tx).await?;

            match Self::insert_tx(&mut tx, item).await {
                Ok(()) => {
                    sqlx::query("RELEASE SAVEPOINT item_savepoint")
                        .execute(&mut *tx)
                        .await?;
                    inserted += 1;
                },
                Err(e) if e.is_unique_violation() => {
                    sqlx::query("ROLLBACK TO SAVEPOINT item_savepoint")
                        .execute(&mut *tx)
                        .await?;
                    warn!(name = %item.name, "Skipped item with duplicate name");
                    first_conflict.get_or_insert(e);
                },
                Err(e) => return Err(e),
            }
        }

        tx.commit().await?;

        info!(
            inserted,
            skipped = items.len() - inserted,
            "Committed batch with savepoint isolation"
        );

        match first_conflict {
            Some(conflict) => Err(conflict),
            None => Ok(inserted),
        }
    }
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn add_batch(&self, items: &[NewItem]) -> Result<usize, PersistenceError> {
        debug!(count = items.len(), policy = %self.policy, "Inserting item batch");

        match self.policy {
            CommitPolicy::Atomic => self.add_atomic(items).await,
            CommitPolicy::BestEffort => self.add_best_effort(items).await,
        }
    }
}

/// Fill in the offending name on a unique violation
fn with_name(err: PersistenceError, item_name: &str) -> PersistenceError {
    match err {
        PersistenceError::UniqueConstraintViolation { name: None, detail } => {
            PersistenceError::UniqueConstraintViolation {
                name: Some(item_name.to_string()),
                detail,
            }
        },
        other => other,
    }
}
