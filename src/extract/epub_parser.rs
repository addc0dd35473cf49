use anyhow::{Context, Result};
use epub::doc::{EpubDoc, NavPoint};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

use super::toc::{plan_toc_chapters, AnchorSlicer, TocEntry};
use super::{ChapterExtractor, ExtractionResult};
use crate::config::ExtractionConfig;
use crate::utils::{strip_html_tags, TitlePatterns};

type Book = EpubDoc<BufReader<File>>;

fn open_book(path: &Path) -> Result<Book> {
    let doc = EpubDoc::new(path)
        .with_context(|| format!("Failed to open EPUB file: {:?}", path))?;

    let title = doc.mdata("title").unwrap_or_else(|| "Unknown".to_string());
    let author = doc.mdata("creator").unwrap_or_else(|| "Unknown".to_string());
    info!("EPUB: {} by {}", title, author);

    Ok(doc)
}

/// One spine document. `html` is `None` when it could not be read.
#[derive(Debug, Clone)]
pub struct SpinePage {
    pub id: Option<String>,
    pub html: Option<String>,
}

/// A table-of-contents node with its nested children.
#[derive(Debug, Clone)]
pub struct TocNode {
    pub label: String,
    pub href: String,
    pub children: Vec<TocNode>,
}

impl From<&NavPoint> for TocNode {
    fn from(point: &NavPoint) -> Self {
        Self {
            label: point.label.clone(),
            href: point.content.to_string_lossy().into_owned(),
            children: point.children.iter().map(TocNode::from).collect(),
        }
    }
}

/// What the extractors need from an opened book.
pub trait BookSource {
    fn toc(&self) -> Vec<TocNode>;
    fn spine_pages(&mut self) -> Vec<SpinePage>;
    fn resource(&mut self, path: &str) -> Option<String>;
}

impl BookSource for Book {
    fn toc(&self) -> Vec<TocNode> {
        self.toc.iter().map(TocNode::from).collect()
    }

    fn spine_pages(&mut self) -> Vec<SpinePage> {
        (0..self.spine.len())
            .map(|i| {
                self.set_current_page(i);
                SpinePage {
                    id: self.get_current_id(),
                    html: self.get_current_str().map(|(html, _mime)| html),
                }
            })
            .collect()
    }

    fn resource(&mut self, path: &str) -> Option<String> {
        self.get_resource_str_by_path(path)
    }
}

/// Walk the spine (reading order) and emit every page that has text.
fn extract_spine<S: BookSource>(
    book: &mut S,
    label: &str,
    titles: &TitlePatterns,
) -> ExtractionResult {
    let mut result = ExtractionResult::new(label);

    for (i, page) in book.spine_pages().into_iter().enumerate() {
        let Some(html) = page.html else {
            debug!("Spine item {} could not be read", i);
            continue;
        };

        let content = strip_html_tags(&html);
        if content.is_empty() {
            debug!("Spine item {} has no text", i);
            continue;
        }

        let title = titles
            .extract(&html)
            .unwrap_or_else(|| format!("Chapter {}", result.chapter_count() + 1));
        result.push(Some(title), page.id, content);
    }

    result
}

/// Depth-first flattening, each parent ahead of its children.
fn flatten_toc(nodes: &[TocNode], out: &mut Vec<TocEntry>) {
    for node in nodes {
        out.push(TocEntry {
            label: node.label.clone(),
            href: node.href.clone(),
        });
        flatten_toc(&node.children, out);
    }
}

/// Chapter per spine document. This is the baseline ("A") strategy.
pub struct SpineExtractor {
    titles: TitlePatterns,
}

impl SpineExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            titles: TitlePatterns::new()?,
        })
    }

    pub fn extract_from<S: BookSource>(&self, book: &mut S) -> ExtractionResult {
        let result = extract_spine(book, self.label(), &self.titles);
        info!("Extracted {} chapters from spine", result.chapter_count());
        result
    }
}

impl ChapterExtractor for SpineExtractor {
    fn label(&self) -> &str {
        "spine"
    }

    fn extract(&self, path: &Path) -> Result<ExtractionResult> {
        info!("Extracting chapters from spine: {:?}", path);
        let mut doc = open_book(path)?;
        Ok(self.extract_from(&mut doc))
    }
}

/// Chapter per table-of-contents entry, slicing anchored sections.
/// Falls back to the spine when the TOC yields nothing.
pub struct TocExtractor {
    config: ExtractionConfig,
    slicer: AnchorSlicer,
    titles: TitlePatterns,
}

impl TocExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let slicer = AnchorSlicer::new(config.heading_lookahead)?;
        Ok(Self {
            config,
            slicer,
            titles: TitlePatterns::new()?,
        })
    }

    pub fn extract_from<S: BookSource>(&self, book: &mut S) -> Result<ExtractionResult> {
        let mut entries = Vec::new();
        flatten_toc(&book.toc(), &mut entries);
        debug!("TOC has {} entries", entries.len());

        // Several entries usually point into the same file.
        let mut cache: HashMap<String, Option<String>> = HashMap::new();
        let result = plan_toc_chapters(
            self.label(),
            &entries,
            |file| {
                cache
                    .entry(file.to_string())
                    .or_insert_with(|| book.resource(file))
                    .clone()
            },
            &self.slicer,
            &self.config,
        )?;

        if !result.is_empty() {
            info!("Extracted {} chapters from TOC", result.chapter_count());
            return Ok(result);
        }

        info!("TOC produced no chapters, falling back to spine order");
        let result = extract_spine(book, self.label(), &self.titles);
        info!("Extracted {} chapters from spine", result.chapter_count());
        Ok(result)
    }
}

impl ChapterExtractor for TocExtractor {
    fn label(&self) -> &str {
        "toc"
    }

    fn extract(&self, path: &Path) -> Result<ExtractionResult> {
        info!("Extracting chapters from table of contents: {:?}", path);
        let mut doc = open_book(path)?;
        self.extract_from(&mut doc)
    }
}
