use thiserror::Error;

/// Rejected comparator settings. Raised before any extraction runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("short_chapter_threshold must be > 0")]
    ZeroShortThreshold,

    #[error("retention_pass_threshold must be within (0, 1], got {0}")]
    RetentionThresholdOutOfRange(f64),

    #[error("min_reasonable_chapters ({min}) must be <= max_reasonable_chapters ({max})")]
    ChapterBoundsInverted { min: usize, max: usize },
}
