//! Item entity shared by the importer and the item API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored item.
///
/// `name` is unique across all items and never blank. `id` is assigned by
/// the store on insert; everything else is fixed when the item is
/// normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A validated item that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewItem {
    /// Build a new item, trimming both fields.
    ///
    /// Returns `None` when the name is blank after trimming. A blank
    /// description collapses to `None`.
    pub fn normalized(
        name: &str,
        description: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        Some(Self {
            name: name.to_string(),
            description,
            created_at,
        })
    }

    /// Attach the store-assigned id
    pub fn into_item(self, id: i64) -> Item {
        Item {
            id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        }
    }
}
