mod comparator;
mod metrics;
mod report;

pub use comparator::compare;
pub use metrics::{group_duplicates, summarize, DuplicateGroup, RunMetrics};
pub use report::{Advisory, ComparisonReport, RetentionRate, Side, Verdict};
