mod epub_parser;
mod toc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::config::ExtractionConfig;
use crate::utils::char_len;

pub use epub_parser::{BookSource, SpineExtractor, SpinePage, TocExtractor, TocNode};
pub use toc::{plan_toc_chapters, split_href, AnchorSlicer, TocEntry};

/// One chapter produced by an extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    /// 0-based position in the run's output.
    pub index: usize,
    pub title: Option<String>,
    /// Source document, `file` or `file#anchor`.
    pub source: Option<String>,
    pub content: String,
}

impl ChapterRecord {
    pub fn char_len(&self) -> usize {
        char_len(&self.content)
    }

    pub fn display_title(&self) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| format!("Chapter {}", self.index + 1))
    }
}

/// Ordered chapters of one run. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub label: String,
    pub chapters: Vec<ChapterRecord>,
}

impl ExtractionResult {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            chapters: Vec::new(),
        }
    }

    /// Build a result from bare contents, indexed in order.
    pub fn from_contents<I, S>(label: impl Into<String>, contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut result = Self::new(label);
        for content in contents {
            result.push(None, None, content.into());
        }
        result
    }

    /// Append a chapter; its index is its position.
    pub fn push(&mut self, title: Option<String>, source: Option<String>, content: String) {
        let index = self.chapters.len();
        self.chapters.push(ChapterRecord {
            index,
            title,
            source,
            content,
        });
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn total_length(&self) -> usize {
        self.chapters.iter().map(ChapterRecord::char_len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}

/// Turns a book on disk into an ordered list of chapters.
/// Shared across batch worker threads.
pub trait ChapterExtractor: Send + Sync {
    /// Short name shown in reports.
    fn label(&self) -> &str;

    fn extract(&self, path: &Path) -> Result<ExtractionResult>;
}

/// Available chapter splitting strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// One chapter per spine document, in reading order
    Spine,
    /// Follow the table of contents, slicing anchored sections
    Toc,
}

impl ExtractorKind {
    pub fn build(self, config: &ExtractionConfig) -> Result<Box<dyn ChapterExtractor>> {
        let extractor: Box<dyn ChapterExtractor> = match self {
            ExtractorKind::Spine => Box::new(SpineExtractor::new()?),
            ExtractorKind::Toc => Box::new(TocExtractor::new(config.clone())?),
        };
        Ok(extractor)
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractorKind::Spine => write!(f, "spine"),
            ExtractorKind::Toc => write!(f, "toc"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_contents_assigns_indices() {
        let result = ExtractionResult::from_contents("a", ["one", "two", "three"]);
        let indices: Vec<usize> = result.chapters.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(result.chapter_count(), 3);
    }

    #[test]
    fn test_total_length_in_characters() {
        let result = ExtractionResult::from_contents("a", ["abc", "", "章节"]);
        assert_eq!(result.total_length(), 5);
    }

    #[test]
    fn test_display_title_fallback() {
        let mut result = ExtractionResult::new("a");
        result.push(None, None, "x".to_string());
        result.push(Some("Prologue".to_string()), None, "y".to_string());
        assert_eq!(result.chapters[0].display_title(), "Chapter 1");
        assert_eq!(result.chapters[1].display_title(), "Prologue");
    }

    #[test]
    fn test_build_extractors() {
        let config = ExtractionConfig::default();
        assert_eq!(ExtractorKind::Spine.build(&config).unwrap().label(), "spine");
        assert_eq!(ExtractorKind::Toc.build(&config).unwrap().label(), "toc");
        assert_eq!(ExtractorKind::Toc.to_string(), "toc");
    }
}
