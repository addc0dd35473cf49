use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::compare::{compare, ComparisonReport, Verdict};
use crate::config::ComparatorConfig;
use crate::extract::ChapterExtractor;

/// All `.epub` files under `dir`, sorted by path.
pub fn discover_epubs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Input is not a directory: {:?}", dir);
    }

    let mut books: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            path.extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("epub"))
                .unwrap_or(false)
        })
        .collect();
    books.sort();

    info!("Found {} EPUB files in {:?}", books.len(), dir);
    Ok(books)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub report: Option<ComparisonReport>,
    /// Set when either extraction failed.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub improved: usize,
    pub regressed: usize,
    pub inconclusive: usize,
    pub failed: usize,
    pub entries: Vec<BatchEntry>,
}

impl BatchSummary {
    fn record(&mut self, entry: BatchEntry) {
        match &entry.report {
            Some(report) => match report.verdict {
                Verdict::Improved => self.improved += 1,
                Verdict::Regressed => self.regressed += 1,
                Verdict::Inconclusive => self.inconclusive += 1,
            },
            None => self.failed += 1,
        }
        self.entries.push(entry);
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }
}

fn compare_one(
    path: &Path,
    extractor_a: &dyn ChapterExtractor,
    extractor_b: &dyn ChapterExtractor,
    config: &ComparatorConfig,
) -> Result<ComparisonReport> {
    let result_a = extractor_a.extract(path)?;
    let result_b = extractor_b.extract(path)?;
    Ok(compare(&result_a, &result_b, config))
}

/// Compare every book independently, in parallel. A book that fails to
/// extract is recorded as failed; it does not stop the batch. Entries keep
/// the order of `books`.
pub fn run_batch(
    books: &[PathBuf],
    extractor_a: &dyn ChapterExtractor,
    extractor_b: &dyn ChapterExtractor,
    config: &ComparatorConfig,
) -> BatchSummary {
    let entries: Vec<BatchEntry> = books
        .par_iter()
        .enumerate()
        .map(|(idx, path)| {
            info!("Comparing {}/{}: {:?}", idx + 1, books.len(), path);

            match compare_one(path, extractor_a, extractor_b, config) {
                Ok(report) => {
                    info!("{:?}: {}", path, report.verdict);
                    BatchEntry {
                        path: path.clone(),
                        report: Some(report),
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("Failed to compare {:?}: {:#}", path, e);
                    BatchEntry {
                        path: path.clone(),
                        report: None,
                        error: Some(format!("{:#}", e)),
                    }
                }
            }
        })
        .collect();

    let mut summary = BatchSummary::default();
    for entry in entries {
        summary.record(entry);
    }
    summary
}
