// Library exports for use in the CLI and batch binaries

pub mod batch;
pub mod compare;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod render;
pub mod utils;

// Re-export commonly used types
pub use compare::{compare, ComparisonReport, RetentionRate, Verdict};
pub use config::{AuditConfig, ComparatorConfig, DuplicateSimilarity, ExtractionConfig};
pub use error::ConfigError;
pub use extract::{ChapterExtractor, ChapterRecord, ExtractionResult, ExtractorKind};
