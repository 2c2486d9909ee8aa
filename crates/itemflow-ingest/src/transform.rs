//! Row validation and normalization
//!
//! Blank names are dropped, not reported as errors: partial input is
//! expected, and `valid < extracted` is the only trace a dropped row leaves.

use chrono::{DateTime, Utc};
use itemflow_common::NewItem;
use tracing::debug;

use crate::reader::RawRecord;

type Clock = fn() -> DateTime<Utc>;

/// Filters raw records down to valid, trimmed items
#[derive(Debug, Clone)]
pub struct ItemValidator {
    clock: Clock,
}

impl Default for ItemValidator {
    fn default() -> Self {
        Self { clock: Utc::now }
    }
}

impl ItemValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed time source for `created_at`
    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    /// Normalize a single record, `None` if it must be dropped
    pub fn normalize(&self, record: &RawRecord) -> Option<NewItem> {
        let name = record.name.as_deref()?;
        NewItem::normalized(name, record.description.as_deref(), (self.clock)())
    }

    /// Validate and normalize every record, keeping input order.
    ///
    /// Duplicate names pass through untouched; the store's uniqueness
    /// constraint is what rejects them.
    pub fn transform(&self, records: Vec<RawRecord>) -> Vec<NewItem> {
        let total = records.len();
        let items: Vec<NewItem> = records.iter().filter_map(|r| self.normalize(r)).collect();

        let dropped = total - items.len();
        if dropped > 0 {
            debug!(dropped, total, "Dropped records with blank names");
        }

        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_drops_blank_and_missing_names() {
        let validator = ItemValidator::new();
        let records = vec![
            RawRecord::new(Some(""), Some("empty")),
            RawRecord::new(Some(" "), Some("space")),
            RawRecord::new(None, Some("missing")),
            RawRecord::new(Some("\t"), None),
        ];

        assert!(validator.transform(records).is_empty());
    }

    #[test]
    fn test_trims_and_preserves_order() {
        let validator = ItemValidator::with_clock(fixed_time);
        let records = vec![
            RawRecord::new(Some(" Widget "), Some(" A thing ")),
            RawRecord::new(Some(" "), Some("blank name")),
            RawRecord::new(Some("Gadget"), Some("")),
        ];

        let items = validator.transform(records);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Widget");
        assert_eq!(items[0].description.as_deref(), Some("A thing"));
        assert_eq!(items[1].name, "Gadget");
        assert_eq!(items[1].description, None);
        assert!(items.iter().all(|i| i.created_at == fixed_time()));
    }

    #[test]
    fn test_duplicates_pass_through() {
        let validator = ItemValidator::new();
        let records = vec![
            RawRecord::new(Some("Widget"), None),
            RawRecord::new(Some("Widget "), Some("again")),
        ];

        let items = validator.transform(records);
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.name == "Widget"));
    }

    #[test]
    fn test_output_never_longer_than_input() {
        let validator = ItemValidator::new();
        let names = ["a", "", " b ", "  ", "c", "\n"];
        for n in 0..=names.len() {
            let records: Vec<RawRecord> = names[..n]
                .iter()
                .map(|name| RawRecord::new(Some(name), None))
                .collect();
            assert!(validator.transform(records.clone()).len() <= records.len());
        }
    }

    #[test]
    fn test_trimmed_name_is_unchanged() {
        let validator = ItemValidator::new();
        let item = validator
            .normalize(&RawRecord::new(Some("Widget"), None))
            .unwrap();
        assert_eq!(item.name, "Widget");
    }
}
