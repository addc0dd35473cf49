use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

use super::ExtractionResult;
use crate::config::ExtractionConfig;
use crate::utils::{char_len, strip_html_tags};

/// A navigation entry, flattened from the book's nested table of contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub label: String,
    /// Archive path, optionally followed by `#anchor`.
    pub href: String,
}

/// Split `file#anchor` into its parts. An empty anchor counts as none.
pub fn split_href(href: &str) -> (&str, Option<&str>) {
    match href.split_once('#') {
        Some((file, anchor)) if !anchor.is_empty() => (file, Some(anchor)),
        Some((file, _)) => (file, None),
        None => (href, None),
    }
}

/// Cuts the section that starts at an anchor out of an XHTML document.
#[derive(Debug, Clone)]
pub struct AnchorSlicer {
    next_heading: Regex,
    lookahead: usize,
}

impl AnchorSlicer {
    pub fn new(lookahead: usize) -> Result<Self> {
        Ok(Self {
            next_heading: Regex::new(r"(?i)<h[1-4][^>]*>")
                .context("failed to compile heading regex")?,
            lookahead,
        })
    }

    /// From the element whose `id` or `name` is `anchor` up to the next
    /// `<h1>`-`<h4>` found at least `lookahead` bytes later, else to the end.
    pub fn slice<'a>(&self, html: &'a str, anchor: &str) -> Result<Option<&'a str>> {
        let pattern = format!(
            r#"(?i)<[^>]+\s(?:id|name)\s*=\s*["']?{}["'\s/>]"#,
            regex::escape(anchor)
        );
        let anchor_re = Regex::new(&pattern)
            .with_context(|| format!("failed to compile anchor regex for {:?}", anchor))?;

        let Some(found) = anchor_re.find(html) else {
            return Ok(None);
        };
        let start = found.start();

        let mut search_from = start.saturating_add(self.lookahead).min(html.len());
        while !html.is_char_boundary(search_from) {
            search_from += 1;
        }

        let end = self
            .next_heading
            .find(&html[search_from..])
            .map(|m| search_from + m.start())
            .unwrap_or(html.len());

        Ok(Some(html[start..end].trim()))
    }
}

/// Turn navigation entries into chapters.
///
/// Each file, and each `file#anchor`, contributes at most once. An anchored
/// entry becomes its own chapter only when the slice carries more than
/// `min_anchor_section` characters of text; otherwise the whole file is used
/// if it has not been used yet. Entries whose document cannot be found are
/// skipped.
pub fn plan_toc_chapters<F>(
    label: &str,
    entries: &[TocEntry],
    mut load_document: F,
    slicer: &AnchorSlicer,
    config: &ExtractionConfig,
) -> Result<ExtractionResult>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut result = ExtractionResult::new(label);
    let mut processed: HashSet<String> = HashSet::new();

    for entry in entries {
        let (file, anchor) = split_href(&entry.href);
        let title = if entry.label.trim().is_empty() {
            format!("Chapter {}", result.chapter_count() + 1)
        } else {
            entry.label.trim().to_string()
        };

        let Some(html) = load_document(file) else {
            debug!("Document not found for TOC entry {:?}: {}", title, file);
            continue;
        };

        if let Some(anchor) = anchor {
            let key = format!("{}#{}", file, anchor);
            if processed.contains(&key) {
                debug!("Anchor already processed, skipping: {}", key);
                continue;
            }

            if let Some(section) = slicer.slice(&html, anchor)? {
                let text = strip_html_tags(section);
                if char_len(&text) > config.min_anchor_section {
                    debug!("Anchored chapter {:?} ({} chars)", title, char_len(&text));
                    result.push(Some(title), Some(key.clone()), text);
                    processed.insert(key);
                    continue;
                }
            }
        }

        if processed.contains(file) {
            debug!("File already processed, skipping: {}", file);
            continue;
        }

        let text = strip_html_tags(&html);
        debug!("Whole-file chapter {:?} ({} chars)", title, char_len(&text));
        result.push(Some(title), Some(file.to_string()), text);
        processed.insert(file.to_string());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn entry(label: &str, href: &str) -> TocEntry {
        TocEntry {
            label: label.to_string(),
            href: href.to_string(),
        }
    }

    fn long_paragraph(word: &str) -> String {
        format!("<p>{}</p>", vec![word; 150].join(" "))
    }

    #[test]
    fn test_split_href() {
        assert_eq!(split_href("OEBPS/ch1.xhtml#sec2"), ("OEBPS/ch1.xhtml", Some("sec2")));
        assert_eq!(split_href("OEBPS/ch1.xhtml#"), ("OEBPS/ch1.xhtml", None));
        assert_eq!(split_href("OEBPS/ch1.xhtml"), ("OEBPS/ch1.xhtml", None));
    }

    #[test]
    fn test_slice_to_next_heading() {
        let slicer = AnchorSlicer::new(10).unwrap();
        let html = r#"<h2 id="a">First</h2><p>alpha text here</p><h2 id="b">Second</h2><p>beta</p>"#;
        let section = slicer.slice(html, "a").unwrap().unwrap();
        assert!(section.contains("alpha"));
        assert!(!section.contains("beta"));
    }

    #[test]
    fn test_slice_to_end_when_no_heading_follows() {
        let slicer = AnchorSlicer::new(10).unwrap();
        let html = r#"<p>intro</p><a name="tail"></a><p>the rest of the book</p>"#;
        let section = slicer.slice(html, "tail").unwrap().unwrap();
        assert!(section.ends_with("</p>"));
        assert!(section.contains("the rest of the book"));
        assert!(!section.contains("intro"));
    }

    #[test]
    fn test_slice_requires_exact_anchor() {
        let slicer = AnchorSlicer::new(10).unwrap();
        let html = r#"<h2 id="sec10">Ten</h2>"#;
        assert!(slicer.slice(html, "sec1").unwrap().is_none());
        assert!(slicer.slice(html, "sec10").unwrap().is_some());
    }

    #[test]
    fn test_slice_ignores_prefixed_attributes() {
        let slicer = AnchorSlicer::new(10).unwrap();
        let html = r#"<p data-id="x">wrong start</p><h2 id="x">Right</h2><p>right body</p>"#;
        let section = slicer.slice(html, "x").unwrap().unwrap();
        assert!(section.starts_with(r#"<h2 id="x">"#));
        assert!(!section.contains("wrong start"));

        let html = r#"<span data-name="y">no</span>"#;
        assert!(slicer.slice(html, "y").unwrap().is_none());
    }

    #[test]
    fn test_slice_with_huge_lookahead_runs_to_end() {
        let slicer = AnchorSlicer::new(usize::MAX).unwrap();
        let html = r#"<h2 id="a">First</h2><p>alpha</p><h2 id="b">Second</h2><p>beta</p>"#;
        let section = slicer.slice(html, "a").unwrap().unwrap();
        assert!(section.contains("alpha"));
        assert!(section.contains("beta"));
    }

    #[test]
    fn test_plan_uses_anchored_sections() {
        let html = format!(
            r#"<h1 id="one">One</h1>{}<h1 id="two">Two</h1>{}"#,
            long_paragraph("alpha"),
            long_paragraph("beta")
        );
        let docs: HashMap<&str, String> = HashMap::from([("ch.xhtml", html)]);
        let entries = vec![entry("One", "ch.xhtml#one"), entry("Two", "ch.xhtml#two")];

        let slicer = AnchorSlicer::new(100).unwrap();
        let result = plan_toc_chapters(
            "toc",
            &entries,
            |file| docs.get(file).cloned(),
            &slicer,
            &ExtractionConfig::default(),
        )
        .unwrap();

        assert_eq!(result.chapter_count(), 2);
        assert!(result.chapters[0].content.contains("alpha"));
        assert!(!result.chapters[0].content.contains("beta"));
        assert!(result.chapters[1].content.contains("beta"));
        assert_eq!(result.chapters[1].source.as_deref(), Some("ch.xhtml#two"));
    }

    #[test]
    fn test_plan_falls_back_to_whole_file_once() {
        let html = r#"<h1 id="a">A</h1><p>short</p><h1 id="b">B</h1><p>also short</p>"#.to_string();
        let docs: HashMap<&str, String> = HashMap::from([("ch.xhtml", html)]);
        let entries = vec![
            entry("A", "ch.xhtml#a"),
            entry("B", "ch.xhtml#b"),
            entry("Again", "ch.xhtml"),
        ];

        let slicer = AnchorSlicer::new(5).unwrap();
        let result = plan_toc_chapters(
            "toc",
            &entries,
            |file| docs.get(file).cloned(),
            &slicer,
            &ExtractionConfig::default(),
        )
        .unwrap();

        assert_eq!(result.chapter_count(), 1);
        assert_eq!(result.chapters[0].title.as_deref(), Some("A"));
        assert_eq!(result.chapters[0].source.as_deref(), Some("ch.xhtml"));
        assert!(result.chapters[0].content.contains("also short"));
    }

    #[test]
    fn test_plan_skips_missing_documents_and_names_untitled() {
        let docs: HashMap<&str, String> =
            HashMap::from([("b.xhtml", "<p>body</p>".to_string())]);
        let entries = vec![entry("Missing", "a.xhtml"), entry("  ", "b.xhtml")];

        let slicer = AnchorSlicer::new(100).unwrap();
        let result = plan_toc_chapters(
            "toc",
            &entries,
            |file| docs.get(file).cloned(),
            &slicer,
            &ExtractionConfig::default(),
        )
        .unwrap();

        assert_eq!(result.chapter_count(), 1);
        assert_eq!(result.chapters[0].title.as_deref(), Some("Chapter 1"));
        assert_eq!(result.chapters[0].content, "body");
    }
}
