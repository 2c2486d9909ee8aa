//! In-memory item store

use std::collections::HashSet;

use async_trait::async_trait;
use itemflow_common::{Item, NewItem};
use tokio::sync::Mutex;
use tracing::debug;

use super::{CommitPolicy, ItemRepository};
use crate::error::PersistenceError;

#[derive(Debug, Default)]
struct State {
    items: Vec<Item>,
    next_id: i64,
    add_batch_calls: usize,
    available: bool,
}

/// Item store held in process memory.
///
/// Enforces the same unique-name rule as the database table.
#[derive(Debug)]
pub struct InMemoryItemRepository {
    state: Mutex<State>,
    policy: CommitPolicy,
}

impl Default for InMemoryItemRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                available: true,
                ..State::default()
            }),
            policy: CommitPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CommitPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pre-populate the store, bypassing `add_batch` accounting
    pub async fn seed(&self, items: impl IntoIterator<Item = NewItem>) {
        let mut state = self.state.lock().await;
        for item in items {
            let id = state.next_id;
            state.next_id += 1;
            state.items.push(item.into_item(id));
        }
    }

    /// Simulate the store going away (or coming back)
    pub async fn set_available(&self, available: bool) {
        self.state.lock().await.available = available;
    }

    /// Snapshot of everything stored, in insertion order
    pub async fn items(&self) -> Vec<Item> {
        self.state.lock().await.items.clone()
    }

    /// Number of times `add_batch` has been called
    pub async fn add_batch_calls(&self) -> usize {
        self.state.lock().await.add_batch_calls
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn add_batch(&self, items: &[NewItem]) -> Result<usize, PersistenceError> {
        let mut state = self.state.lock().await;
        state.add_batch_calls += 1;

        if !state.available {
            return Err(PersistenceError::StoreUnavailable(
                "in-memory store is offline".to_string(),
            ));
        }

        let mut taken: HashSet<String> = state.items.iter().map(|i| i.name.clone()).collect();
        let mut accepted = Vec::with_capacity(items.len());
        let mut conflict = None;

        for item in items {
            if taken.insert(item.name.clone()) {
                accepted.push(item.clone());
            } else if conflict.is_none() {
                conflict = Some(item.name.clone());
                if self.policy == CommitPolicy::Atomic {
                    break;
                }
            }
        }

        if conflict.is_some() && self.policy == CommitPolicy::Atomic {
            accepted.clear();
        }

        let inserted = accepted.len();
        for item in accepted {
            let id = state.next_id;
            state.next_id += 1;
            state.items.push(item.into_item(id));
        }

        match conflict {
            Some(name) => {
                debug!(
                    name = %name,
                    kept = inserted,
                    policy = %self.policy,
                    "Batch hit a duplicate name"
                );
                Err(PersistenceError::duplicate_name(name))
            },
            None => Ok(inserted),
        }
    }
}
