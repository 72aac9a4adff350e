//! Walk Statistics
//!
//! Per-category reference counts recorded while a walk runs. Categories
//! appear in the order they were visited.

use super::plan::WalkKind;
use crate::roots::RootCategory;
use indexmap::IndexMap;
use serde::Serialize;
use std::time::Duration;

/// Summary of one verification walk
#[derive(Debug, Clone, Serialize)]
pub struct WalkStats {
    pub kind: WalkKind,
    /// References per category, in visit order
    pub counts: IndexMap<RootCategory, usize>,
    pub total: usize,
    pub elapsed: Duration,
}

impl WalkStats {
    pub fn new(kind: WalkKind) -> Self {
        Self {
            kind,
            counts: IndexMap::with_capacity(RootCategory::COUNT),
            total: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Record that `category` was visited and yielded `count` references
    pub fn record(&mut self, category: RootCategory, count: usize) {
        *self.counts.entry(category).or_insert(0) += count;
        self.total += count;
    }

    /// References yielded by `category`, or None if it was not visited
    pub fn count(&self, category: RootCategory) -> Option<usize> {
        self.counts.get(&category).copied()
    }

    pub fn visited(&self, category: RootCategory) -> bool {
        self.counts.contains_key(&category)
    }

    /// Categories in visit order
    pub fn categories(&self) -> impl Iterator<Item = RootCategory> + '_ {
        self.counts.keys().copied()
    }

    /// Elapsed time in microseconds, saturating at `u64::MAX`
    pub fn elapsed_us(&self) -> u64 {
        u64::try_from(self.elapsed.as_micros()).unwrap_or(u64::MAX)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_visit_order() {
        let mut stats = WalkStats::new(WalkKind::Full);
        stats.record(RootCategory::Handles, 2);
        stats.record(RootCategory::Code, 3);
        stats.record(RootCategory::Threads, 0);

        let order: Vec<_> = stats.categories().collect();
        assert_eq!(
            order,
            vec![RootCategory::Handles, RootCategory::Code, RootCategory::Threads]
        );
        assert_eq!(stats.total, 5);
        assert_eq!(stats.count(RootCategory::Threads), Some(0));
        assert_eq!(stats.count(RootCategory::Weak), None);
    }

    #[test]
    fn test_json_output() {
        let mut stats = WalkStats::new(WalkKind::Strong);
        stats.record(RootCategory::Code, 1);
        let json = stats.to_json();
        assert!(json.contains("\"kind\":\"Strong\""));
        assert!(json.contains("\"Code\":1"));
    }

    #[test]
    fn test_elapsed_us_saturates() {
        let mut stats = WalkStats::new(WalkKind::Full);
        stats.elapsed = Duration::from_micros(1_500);
        assert_eq!(stats.elapsed_us(), 1_500);

        stats.elapsed = Duration::MAX;
        assert_eq!(stats.elapsed_us(), u64::MAX);
    }
}
