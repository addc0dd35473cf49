use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;

use crate::config::{ComparatorConfig, DuplicateSimilarity};
use crate::extract::{ChapterRecord, ExtractionResult};
use crate::utils::{normalize_whitespace, truncate_chars};

const SAMPLE_CHARS: usize = 50;

/// Two or more chapters sharing one (normalized) content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Ascending chapter indices, always at least two.
    pub indices: Vec<usize>,
    pub sample: String,
}

/// Per-run figures feeding both the comparison and single-run inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub label: String,
    pub chapter_count: usize,
    pub total_length: usize,
    /// Indices of chapters below the short threshold.
    pub short_chapters: Vec<usize>,
    /// Indices of chapters above the long threshold.
    pub long_chapters: Vec<usize>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub within_reasonable_bounds: bool,
}

impl RunMetrics {
    pub fn short_chapter_count(&self) -> usize {
        self.short_chapters.len()
    }

    pub fn long_chapter_count(&self) -> usize {
        self.long_chapters.len()
    }

    pub fn duplicate_group_count(&self) -> usize {
        self.duplicate_groups.len()
    }
}

fn similarity_key(content: &str, similarity: DuplicateSimilarity) -> Cow<'_, str> {
    match similarity {
        DuplicateSimilarity::NormalizedExact => Cow::Owned(normalize_whitespace(content)),
        DuplicateSimilarity::Exact => Cow::Borrowed(content),
    }
}

/// Group chapters by content. Only groups of two or more are returned,
/// ordered by their first member.
pub fn group_duplicates(
    chapters: &[ChapterRecord],
    similarity: DuplicateSimilarity,
) -> Vec<DuplicateGroup> {
    let mut by_content: HashMap<Cow<'_, str>, Vec<usize>> = HashMap::new();
    for chapter in chapters {
        by_content
            .entry(similarity_key(&chapter.content, similarity))
            .or_default()
            .push(chapter.index);
    }

    let mut groups: Vec<DuplicateGroup> = by_content
        .into_iter()
        .filter(|(_, indices)| indices.len() >= 2)
        .map(|(key, indices)| DuplicateGroup {
            indices,
            sample: truncate_chars(&key, SAMPLE_CHARS).to_string(),
        })
        .collect();
    groups.sort_by_key(|group| group.indices[0]);
    groups
}

/// Compute the metrics of one run in a single pass over its chapters.
pub fn summarize(result: &ExtractionResult, config: &ComparatorConfig) -> RunMetrics {
    let mut total_length = 0;
    let mut short_chapters = Vec::new();
    let mut long_chapters = Vec::new();
    let flag_long = config.long_chapter_threshold > config.short_chapter_threshold;

    for chapter in &result.chapters {
        let len = chapter.char_len();
        total_length += len;

        if len < config.short_chapter_threshold {
            short_chapters.push(chapter.index);
        } else if flag_long && len > config.long_chapter_threshold {
            long_chapters.push(chapter.index);
        }
    }

    let chapter_count = result.chapter_count();
    RunMetrics {
        label: result.label.clone(),
        chapter_count,
        total_length,
        short_chapters,
        long_chapters,
        duplicate_groups: group_duplicates(&result.chapters, config.duplicate_similarity),
        within_reasonable_bounds: config.chapter_count_is_reasonable(chapter_count),
    }
}
