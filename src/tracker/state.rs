use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

use crate::classifier::Category;

use super::{BucketKey, BucketSummary, ReportFormat};

/// How long buckets stay around before a summary tick prunes them.
pub const RETENTION_HOURS: i64 = 24;

/// Observed categories per hour bucket.
///
/// A missing entry means nothing was observed. Reads never create entries.
#[derive(Debug, Clone)]
pub struct BucketTracker {
    expected: BTreeSet<Category>,
    buckets: BTreeMap<BucketKey, BTreeSet<Category>>,
}

impl BucketTracker {
    pub fn new<I>(expected: I) -> Self
    where
        I: IntoIterator<Item = Category>,
    {
        Self {
            expected: expected.into_iter().collect(),
            buckets: BTreeMap::new(),
        }
    }

    pub fn expected(&self) -> &BTreeSet<Category> {
        &self.expected
    }

    pub fn current_bucket_key(now: DateTime<Utc>) -> BucketKey {
        BucketKey::from_timestamp(now)
    }

    /// Key below which buckets are outside the retention window at `now`.
    pub fn retention_cutoff(now: DateTime<Utc>) -> BucketKey {
        BucketKey::from_timestamp(now - Duration::hours(RETENTION_HOURS))
    }

    /// Record `category` for `key`. Repeats within a bucket change nothing.
    pub fn ingest(&mut self, key: BucketKey, category: Category) {
        if !self.expected.contains(&category) {
            debug!("ignoring unexpected category {category} for bucket {key}");
            return;
        }
        self.buckets.entry(key).or_default().insert(category);
    }

    pub fn snapshot(&self, key: &BucketKey) -> BTreeSet<Category> {
        self.buckets.get(key).cloned().unwrap_or_default()
    }

    pub fn summarize(&self, key: &BucketKey) -> BucketSummary {
        BucketSummary::new(*key, self.snapshot(key), &self.expected)
    }

    pub fn render_summary(&self, key: &BucketKey, now: DateTime<Utc>, format: &ReportFormat) -> String {
        format.render_summary(&self.summarize(key), now)
    }

    /// Drop every bucket strictly older than `before`. Returns how many went.
    pub fn prune(&mut self, before: &BucketKey) -> usize {
        let kept = self.buckets.split_off(before);
        let removed = self.buckets.len();
        self.buckets = kept;
        removed
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
