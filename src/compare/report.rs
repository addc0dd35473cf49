use serde::{Deserialize, Serialize};
use std::fmt;

use super::metrics::RunMetrics;

/// `total_length_b / total_length_a`, undefined when run A has no content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum RetentionRate {
    Defined(f64),
    Undefined,
}

impl RetentionRate {
    pub fn between(total_a: usize, total_b: usize) -> Self {
        if total_a == 0 {
            RetentionRate::Undefined
        } else {
            RetentionRate::Defined(total_b as f64 / total_a as f64)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            RetentionRate::Defined(rate) => Some(rate),
            RetentionRate::Undefined => None,
        }
    }
}

impl From<Option<f64>> for RetentionRate {
    fn from(value: Option<f64>) -> Self {
        value.map_or(RetentionRate::Undefined, RetentionRate::Defined)
    }
}

impl From<RetentionRate> for Option<f64> {
    fn from(rate: RetentionRate) -> Self {
        rate.value()
    }
}

impl fmt::Display for RetentionRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetentionRate::Defined(rate) => write!(f, "{:.1}%", rate * 100.0),
            RetentionRate::Undefined => write!(f, "n/a"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Improved,
    Regressed,
    Inconclusive,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Verdict::Improved => "IMPROVED",
            Verdict::Regressed => "REGRESSED",
            Verdict::Inconclusive => "INCONCLUSIVE",
        };
        f.write_str(name)
    }
}

/// Which side of the comparison a note refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// Informational flags. They never decide a verdict on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    ChapterCountOutOfBounds {
        side: Side,
        count: usize,
        min: usize,
        max: usize,
    },
    LongChapters {
        side: Side,
        count: usize,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::ChapterCountOutOfBounds { side, count, min, max } => write!(
                f,
                "run {} has {} chapters, outside the reasonable range [{}, {}]",
                side, count, min, max
            ),
            Advisory::LongChapters { side, count } => {
                write!(f, "run {} has {} unusually long chapters", side, count)
            }
        }
    }
}

/// Outcome of comparing run B against run A. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub total_length_a: usize,
    pub total_length_b: usize,
    pub retention_rate: RetentionRate,
    pub chapter_count_a: usize,
    pub chapter_count_b: usize,
    pub short_chapter_count_a: usize,
    pub short_chapter_count_b: usize,
    pub duplicate_group_count_a: usize,
    pub duplicate_group_count_b: usize,
    pub long_chapter_count_a: usize,
    pub long_chapter_count_b: usize,
    pub advisories: Vec<Advisory>,
    pub verdict: Verdict,
    pub metrics_a: RunMetrics,
    pub metrics_b: RunMetrics,
}
