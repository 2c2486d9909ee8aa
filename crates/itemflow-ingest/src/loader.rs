//! Batch loader

use std::sync::Arc;

use itemflow_common::NewItem;
use tracing::{debug, info};

use crate::error::PersistenceError;
use crate::repository::ItemRepository;

/// Persists validated items through an [`ItemRepository`]
#[derive(Clone)]
pub struct ItemLoader {
    repository: Arc<dyn ItemRepository>,
}

impl ItemLoader {
    pub fn new(repository: Arc<dyn ItemRepository>) -> Self {
        Self { repository }
    }

    /// Submit the whole batch as one unit of work.
    ///
    /// No retries and no splitting: whatever the store reports is returned
    /// as-is. An empty batch never reaches the store.
    pub async fn load(&self, items: Vec<NewItem>) -> Result<usize, PersistenceError> {
        if items.is_empty() {
            debug!("No items to load, skipping store round-trip");
            return Ok(0);
        }

        let submitted = items.len();
        self.repository.add_batch(&items).await?;

        info!(inserted = submitted, "Loaded items");
        Ok(submitted)
    }
}
