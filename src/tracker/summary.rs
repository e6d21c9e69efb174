use chrono::{DateTime, FixedOffset, Timelike, Utc};
use std::collections::BTreeSet;

use crate::classifier::Category;

use super::BucketKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStatus {
    Complete,
    Incomplete,
    None,
}

impl SummaryStatus {
    pub fn from_counts(received: usize, expected: usize) -> Self {
        if received == 0 {
            SummaryStatus::None
        } else if received >= expected {
            SummaryStatus::Complete
        } else {
            SummaryStatus::Incomplete
        }
    }

    fn marker(self) -> &'static str {
        match self {
            SummaryStatus::Complete => "🟢",
            SummaryStatus::Incomplete => "🟡",
            SummaryStatus::None => "🔴",
        }
    }

    fn label(self) -> &'static str {
        match self {
            SummaryStatus::Complete => "✅ COMPLETE",
            SummaryStatus::Incomplete => "⚠️ INCOMPLETE",
            SummaryStatus::None => "❌ NO MESSAGES",
        }
    }
}

/// Set arithmetic for one bucket. `received` and `missing` partition the
/// full category set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSummary {
    pub key: BucketKey,
    pub received: BTreeSet<Category>,
    pub missing: BTreeSet<Category>,
    pub status: SummaryStatus,
}

impl BucketSummary {
    pub fn new(key: BucketKey, received: BTreeSet<Category>, expected: &BTreeSet<Category>) -> Self {
        let missing = expected.difference(&received).cloned().collect();
        let status = SummaryStatus::from_counts(received.len(), expected.len());
        Self {
            key,
            received,
            missing,
            status,
        }
    }

    pub fn expected_len(&self) -> usize {
        self.received.len() + self.missing.len()
    }

    pub fn received_labels(&self) -> String {
        join_or(&self.received, "None")
    }

    pub fn missing_labels(&self) -> String {
        join_or(&self.missing, "None")
    }
}

fn join_or(set: &BTreeSet<Category>, empty: &str) -> String {
    if set.is_empty() {
        return empty.to_string();
    }
    set.iter()
        .map(Category::label)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Presentation settings shared by the hourly report and the status reply.
#[derive(Debug, Clone)]
pub struct ReportFormat {
    pub sender: String,
    pub display_offset: FixedOffset,
}

impl ReportFormat {
    /// Hourly report sent on each summary tick.
    pub fn render_summary(&self, summary: &BucketSummary, now: DateTime<Utc>) -> String {
        let local_now = now.with_timezone(&self.display_offset);
        format!(
            "{marker} Hour {range} Summary:\n\
             \n\
             Messages from @{sender}:\n\
             Received: {received} ({count}/{total})\n\
             Missing: {missing}\n\
             \n\
             Status: {status}\n\
             Time: {time}",
            marker = summary.status.marker(),
            range = summary.key.display_range(&self.display_offset),
            sender = self.sender,
            received = summary.received_labels(),
            count = summary.received.len(),
            total = summary.expected_len(),
            missing = summary.missing_labels(),
            status = summary.status.label(),
            time = local_now.format("%H:%M:%S"),
        )
    }

    /// On-demand progress reply for the bucket still in progress.
    pub fn render_status(&self, summary: &BucketSummary, now: DateTime<Utc>) -> String {
        let local_now = now.with_timezone(&self.display_offset);
        let minutes_left = 59 - now.minute();
        let waiting = join_or(&summary.missing, "All complete!");
        format!(
            "Current Hour Status:\n\
             \n\
             Time: {time} ({minutes_left} min left)\n\
             From @{sender}: {count}/{total}\n\
             \n\
             Received: {received}\n\
             Waiting for: {waiting}",
            time = local_now.format("%H:%M:%S"),
            sender = self.sender,
            count = summary.received.len(),
            total = summary.expected_len(),
            received = summary.received_labels(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(labels: &[&str]) -> BTreeSet<Category> {
        labels.iter().map(|l| Category::new(*l)).collect()
    }

    fn format() -> ReportFormat {
        ReportFormat {
            sender: "MyCAEVC_bot".into(),
            display_offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T09:59:15Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn status_follows_counts() {
        assert_eq!(SummaryStatus::from_counts(0, 4), SummaryStatus::None);
        assert_eq!(SummaryStatus::from_counts(1, 4), SummaryStatus::Incomplete);
        assert_eq!(SummaryStatus::from_counts(3, 4), SummaryStatus::Incomplete);
        assert_eq!(SummaryStatus::from_counts(4, 4), SummaryStatus::Complete);
    }

    #[test]
    fn received_and_missing_partition_expected() {
        let expected = set(&["P1", "P2", "P3", "P4"]);
        for received in [set(&[]), set(&["P2"]), set(&["P1", "P4"]), expected.clone()] {
            let summary = BucketSummary::new("2024-01-01-09".parse().unwrap(), received, &expected);
            let union: BTreeSet<_> = summary.received.union(&summary.missing).cloned().collect();
            assert_eq!(union, expected);
            assert!(summary.received.is_disjoint(&summary.missing));
        }
    }

    #[test]
    fn summary_text_lists_sorted_labels() {
        let expected = set(&["P1", "P2", "P3", "P4"]);
        let summary =
            BucketSummary::new("2024-01-01-09".parse().unwrap(), set(&["P3", "P1"]), &expected);
        let text = format().render_summary(&summary, now());

        assert!(text.starts_with("🟡 Hour 09:00-09:59 Summary:"));
        assert!(text.contains("Messages from @MyCAEVC_bot:"));
        assert!(text.contains("Received: P1, P3 (2/4)"));
        assert!(text.contains("Missing: P2, P4"));
        assert!(text.contains("Status: ⚠️ INCOMPLETE"));
        assert!(text.ends_with("Time: 09:59:15"));
    }

    #[test]
    fn empty_bucket_renders_none() {
        let expected = set(&["P1", "P2", "P3", "P4"]);
        let summary = BucketSummary::new("2024-01-01-09".parse().unwrap(), set(&[]), &expected);
        let text = format().render_summary(&summary, now());

        assert!(text.contains("Received: None (0/4)"));
        assert!(text.contains("Missing: P1, P2, P3, P4"));
        assert!(text.contains("Status: ❌ NO MESSAGES"));
    }

    #[test]
    fn status_reply_reports_minutes_left_and_completion() {
        let expected = set(&["P1", "P2"]);
        let summary =
            BucketSummary::new("2024-01-01-09".parse().unwrap(), expected.clone(), &expected);
        let at_quarter = DateTime::parse_from_rfc3339("2024-01-01T09:15:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let text = format().render_status(&summary, at_quarter);

        assert!(text.contains("Time: 09:15:00 (44 min left)"));
        assert!(text.contains("From @MyCAEVC_bot: 2/2"));
        assert!(text.contains("Waiting for: All complete!"));
    }
}
