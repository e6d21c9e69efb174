pub mod bucket;
pub mod controller;
pub mod state;
pub mod summary;

pub use bucket::BucketKey;
pub use controller::{SenderFilter, TrackerController};
pub use state::BucketTracker;
pub use summary::{BucketSummary, ReportFormat, SummaryStatus};
