//! History aggregation - grouped publish history across targets
//!
//! Maintains the per-target history cache and recomputes the flattened,
//! grouped view shown for a selection. Aggregation is a pure function of
//! (selection, target list, cache); recomputing with unchanged inputs yields
//! an identical view.

use crate::core::types::{
    HistoryGroup, HistoryView, PublishHistoryRecord, PublishTarget, Selection,
};
use std::collections::HashMap;

/// Per-target publish history cache, newest-first per entry
#[derive(Debug, Default, Clone)]
pub struct HistoryCache {
    entries: HashMap<String, Vec<PublishHistoryRecord>>,
}

impl HistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached sequence for a target
    pub fn insert(&mut self, target_name: impl Into<String>, records: Vec<PublishHistoryRecord>) {
        self.entries.insert(target_name.into(), records);
    }

    /// Cached sequence for a target, if one has been loaded
    pub fn get(&self, target_name: &str) -> Option<&[PublishHistoryRecord]> {
        self.entries.get(target_name).map(|v| v.as_slice())
    }

    pub fn contains(&self, target_name: &str) -> bool {
        self.entries.contains_key(target_name)
    }

    /// Newest cached record for a target
    pub fn newest(&self, target_name: &str) -> Option<&PublishHistoryRecord> {
        self.entries.get(target_name).and_then(|v| v.first())
    }

    /// Fold a freshly fetched status record into a target's sequence
    ///
    /// A record with a known id replaces the stale copy in place; a new id is
    /// prepended, keeping the newest-first ordering.
    pub fn apply_status(&mut self, target_name: &str, record: PublishHistoryRecord) {
        let records = self.entries.entry(target_name.to_string()).or_default();

        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.insert(0, record),
        }
    }

    /// Drop a target's cached history (after the target is deleted)
    pub fn remove(&mut self, target_name: &str) {
        self.entries.remove(target_name);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Build the flattened, grouped history view for a selection
///
/// - `All`: concatenates cached sequences in target-store order, one group
///   per target with cumulative start indices. Targets without a cache entry
///   contribute no records and no group.
/// - `Target(name)`: the cache entry verbatim as a single group, or an empty
///   view while the fetch is still outstanding.
pub fn aggregate(
    selection: &Selection,
    targets: &[PublishTarget],
    cache: &HistoryCache,
) -> HistoryView {
    match selection {
        Selection::All => {
            let mut items = Vec::new();
            let mut groups = Vec::new();
            let mut start_index = 0;

            for target in targets {
                let Some(records) = cache.get(&target.name) else {
                    continue;
                };

                items.extend_from_slice(records);
                groups.push(HistoryGroup {
                    key: target.name.clone(),
                    name: target.name.clone(),
                    start_index,
                    count: records.len(),
                    level: 0,
                });
                start_index += records.len();
            }

            HistoryView { items, groups }
        }
        Selection::Target(name) => match cache.get(name) {
            Some(records) => HistoryView {
                items: records.to_vec(),
                groups: vec![HistoryGroup {
                    key: name.clone(),
                    name: name.clone(),
                    start_index: 0,
                    count: records.len(),
                    level: 0,
                }],
            },
            None => HistoryView::default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{STATUS_PENDING, STATUS_SUCCESS};
    use chrono::Utc;

    fn record(id: &str, status: u16) -> PublishHistoryRecord {
        PublishHistoryRecord {
            id: id.to_string(),
            status,
            message: None,
            log: String::new(),
            comment: None,
            time: Utc::now(),
        }
    }

    fn targets(names: &[&str]) -> Vec<PublishTarget> {
        names
            .iter()
            .map(|n| PublishTarget::new(*n, "azurePublish", "{}"))
            .collect()
    }

    #[test]
    fn test_aggregate_all_concatenates_in_target_order() {
        let targets = targets(&["dev", "prod"]);
        let mut cache = HistoryCache::new();
        cache.insert("dev", vec![record("d1", STATUS_PENDING)]);
        cache.insert(
            "prod",
            vec![record("p1", STATUS_SUCCESS), record("p2", 500)],
        );

        let view = aggregate(&Selection::All, &targets, &cache);

        assert_eq!(view.len(), 3);
        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[0].key, "dev");
        assert_eq!(view.groups[0].start_index, 0);
        assert_eq!(view.groups[0].count, 1);
        assert_eq!(view.groups[1].key, "prod");
        assert_eq!(view.groups[1].start_index, 1);
        assert_eq!(view.groups[1].count, 2);
    }

    #[test]
    fn test_aggregate_all_skips_targets_without_cache_entry() {
        let targets = targets(&["dev", "staging", "prod"]);
        let mut cache = HistoryCache::new();
        cache.insert("dev", vec![record("d1", STATUS_SUCCESS)]);
        cache.insert("prod", vec![record("p1", STATUS_SUCCESS)]);

        let view = aggregate(&Selection::All, &targets, &cache);

        assert_eq!(view.len(), 2);
        assert_eq!(view.groups.len(), 2);
        assert!(view.groups.iter().all(|g| g.key != "staging"));
    }

    #[test]
    fn test_aggregate_all_total_matches_sum_of_contributions() {
        let targets = targets(&["a", "b", "c"]);
        let mut cache = HistoryCache::new();
        cache.insert("a", vec![record("a1", 200), record("a2", 200)]);
        cache.insert("b", vec![]);
        cache.insert("c", vec![record("c1", 202)]);

        let view = aggregate(&Selection::All, &targets, &cache);

        let total: usize = view.groups.iter().map(|g| g.count).sum();
        assert_eq!(view.len(), total);

        // Group start indices are strictly increasing and non-overlapping
        for pair in view.groups.windows(2) {
            assert_eq!(pair[1].start_index, pair[0].start_index + pair[0].count);
        }
    }

    #[test]
    fn test_aggregate_single_target_is_one_group() {
        let targets = targets(&["dev", "prod"]);
        let mut cache = HistoryCache::new();
        cache.insert(
            "prod",
            vec![record("p1", STATUS_SUCCESS), record("p2", 500)],
        );

        let view = aggregate(&Selection::Target("prod".to_string()), &targets, &cache);

        assert_eq!(view.len(), 2);
        assert_eq!(view.groups.len(), 1);
        assert_eq!(view.groups[0].start_index, 0);
        assert_eq!(view.groups[0].count, 2);
    }

    #[test]
    fn test_aggregate_single_target_without_cache_is_empty() {
        let targets = targets(&["dev"]);
        let cache = HistoryCache::new();

        let view = aggregate(&Selection::Target("dev".to_string()), &targets, &cache);

        assert!(view.is_empty());
        assert!(view.groups.is_empty());
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let targets = targets(&["dev", "prod"]);
        let mut cache = HistoryCache::new();
        cache.insert("dev", vec![record("d1", STATUS_PENDING)]);
        cache.insert("prod", vec![record("p1", STATUS_SUCCESS)]);

        let first = aggregate(&Selection::All, &targets, &cache);
        let second = aggregate(&Selection::All, &targets, &cache);

        assert_eq!(first, second);
    }

    #[test]
    fn test_grouping_with_mixed_statuses() {
        // targets [dev, prod], dev: one pending, prod: success then failure
        let targets = targets(&["dev", "prod"]);
        let mut cache = HistoryCache::new();
        cache.insert("dev", vec![record("d1", 202)]);
        cache.insert("prod", vec![record("p1", 200), record("p2", 500)]);

        let view = aggregate(&Selection::All, &targets, &cache);

        assert_eq!(view.len(), 3);
        assert_eq!(
            view.groups,
            vec![
                HistoryGroup {
                    key: "dev".to_string(),
                    name: "dev".to_string(),
                    start_index: 0,
                    count: 1,
                    level: 0,
                },
                HistoryGroup {
                    key: "prod".to_string(),
                    name: "prod".to_string(),
                    start_index: 1,
                    count: 2,
                    level: 0,
                },
            ]
        );
    }

    #[test]
    fn test_apply_status_replaces_known_id() {
        let mut cache = HistoryCache::new();
        cache.insert("dev", vec![record("d1", STATUS_PENDING)]);

        cache.apply_status("dev", record("d1", STATUS_SUCCESS));

        let records = cache.get("dev").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, STATUS_SUCCESS);
    }

    #[test]
    fn test_apply_status_prepends_new_id() {
        let mut cache = HistoryCache::new();
        cache.insert("dev", vec![record("d1", STATUS_SUCCESS)]);

        cache.apply_status("dev", record("d2", STATUS_PENDING));

        let records = cache.get("dev").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "d2");
        assert!(records[0].is_pending());
    }

    #[test]
    fn test_apply_status_creates_entry_for_unknown_target() {
        let mut cache = HistoryCache::new();

        cache.apply_status("dev", record("d1", STATUS_PENDING));

        assert!(cache.contains("dev"));
        assert_eq!(cache.newest("dev").unwrap().id, "d1");
    }

    #[test]
    fn test_remove_drops_entry() {
        let mut cache = HistoryCache::new();
        cache.insert("dev", vec![record("d1", 200)]);

        cache.remove("dev");

        assert!(!cache.contains("dev"));
    }
}
