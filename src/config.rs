use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

/// How chapter contents are compared when grouping duplicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateSimilarity {
    /// Collapse whitespace runs to one space, trim both ends, then compare exactly.
    #[default]
    NormalizedExact,
    /// Raw content equality.
    Exact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparatorConfig {
    /// Chapters strictly shorter than this many characters are "short".
    pub short_chapter_threshold: usize,
    /// Chapters strictly longer than this many characters are "long" (advisory).
    /// Long flagging is off unless this exceeds `short_chapter_threshold`.
    pub long_chapter_threshold: usize,
    pub duplicate_similarity: DuplicateSimilarity,
    /// Minimum retention rate (B / A) that is not a regression.
    pub retention_pass_threshold: f64,
    pub min_reasonable_chapters: usize,
    pub max_reasonable_chapters: usize,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            short_chapter_threshold: 500,
            long_chapter_threshold: 100_000,
            duplicate_similarity: DuplicateSimilarity::NormalizedExact,
            retention_pass_threshold: 0.90,
            min_reasonable_chapters: 3,
            max_reasonable_chapters: 100,
        }
    }
}

impl ComparatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_chapter_threshold == 0 {
            return Err(ConfigError::ZeroShortThreshold);
        }
        // Written as a negated range check so NaN is rejected too.
        if !(self.retention_pass_threshold > 0.0 && self.retention_pass_threshold <= 1.0) {
            return Err(ConfigError::RetentionThresholdOutOfRange(
                self.retention_pass_threshold,
            ));
        }
        if self.min_reasonable_chapters > self.max_reasonable_chapters {
            return Err(ConfigError::ChapterBoundsInverted {
                min: self.min_reasonable_chapters,
                max: self.max_reasonable_chapters,
            });
        }
        Ok(())
    }

    pub fn chapter_count_is_reasonable(&self, count: usize) -> bool {
        (self.min_reasonable_chapters..=self.max_reasonable_chapters).contains(&count)
    }
}

impl fmt::Display for ComparatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "short<{} long>{} retention>={:.2} chapters=[{}, {}] duplicates={:?}",
            self.short_chapter_threshold,
            self.long_chapter_threshold,
            self.retention_pass_threshold,
            self.min_reasonable_chapters,
            self.max_reasonable_chapters,
            self.duplicate_similarity,
        )
    }
}

/// Knobs for the table-of-contents extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// An anchored slice must carry more text than this to become its own chapter.
    pub min_anchor_section: usize,
    /// Bytes skipped past the anchor before searching for the next heading.
    pub heading_lookahead: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_anchor_section: 500,
            heading_lookahead: 100,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub comparator: ComparatorConfig,
    pub extraction: ExtractionConfig,
}

impl AuditConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: AuditConfig = serde_json::from_str(&config_str)
            .with_context(|| format!("Failed to parse config JSON: {:?}", path))?;

        config.comparator.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ComparatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.short_chapter_threshold, 500);
        assert_eq!(config.retention_pass_threshold, 0.90);
        assert_eq!(config.min_reasonable_chapters, 3);
        assert_eq!(config.max_reasonable_chapters, 100);
    }

    #[test]
    fn test_rejects_zero_short_threshold() {
        let config = ComparatorConfig {
            short_chapter_threshold: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroShortThreshold));
    }

    #[test]
    fn test_rejects_retention_out_of_range() {
        for bad in [0.0, -0.5, 1.01, f64::NAN] {
            let config = ComparatorConfig {
                retention_pass_threshold: bad,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::RetentionThresholdOutOfRange(_))
            ));
        }

        let edge = ComparatorConfig {
            retention_pass_threshold: 1.0,
            ..Default::default()
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn test_rejects_inverted_bounds() {
        let config = ComparatorConfig {
            min_reasonable_chapters: 10,
            max_reasonable_chapters: 5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ChapterBoundsInverted { min: 10, max: 5 })
        );
    }

    #[test]
    fn test_large_short_threshold_is_valid() {
        let config = ComparatorConfig {
            short_chapter_threshold: 100_000,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = ComparatorConfig {
            short_chapter_threshold: 200_000,
            long_chapter_threshold: 1_000,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_chapter_bounds_inclusive() {
        let config = ComparatorConfig::default();
        assert!(!config.chapter_count_is_reasonable(2));
        assert!(config.chapter_count_is_reasonable(3));
        assert!(config.chapter_count_is_reasonable(100));
        assert!(!config.chapter_count_is_reasonable(101));
    }

    #[test]
    fn test_load_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"comparator": {{"short_chapter_threshold": 1000, "duplicate_similarity": "exact"}}}}"#
        )
        .unwrap();

        let config = AuditConfig::load(file.path()).unwrap();
        assert_eq!(config.comparator.short_chapter_threshold, 1000);
        assert_eq!(config.comparator.duplicate_similarity, DuplicateSimilarity::Exact);
        assert_eq!(config.comparator.retention_pass_threshold, 0.90);
        assert_eq!(config.extraction.min_anchor_section, 500);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"comparator": {{"retention_pass_threshold": 1.5}}}}"#).unwrap();

        let err = AuditConfig::load(file.path()).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }
}
