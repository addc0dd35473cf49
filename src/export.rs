use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::extract::ExtractionResult;
use crate::utils::sanitize_filename;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedChapter {
    pub file: String,
    pub title: String,
    pub character_count: usize,
}

/// Written next to the chapter files as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub label: String,
    pub chapter_count: usize,
    pub total_length: usize,
    pub chapters: Vec<ExportedChapter>,
    pub exported_at: u64,
}

/// `NN_<title>.txt`, numbered from 1.
pub fn chapter_file_name(position: usize, title: &str) -> String {
    format!("{:02}_{}.txt", position, sanitize_filename(title))
}

/// Write every chapter of `result` as a plain text file plus a manifest.
pub fn export_chapters(result: &ExtractionResult, output_dir: &Path) -> Result<ExportManifest> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", output_dir))?;

    info!(
        "Exporting {} chapters ({}) to {:?}",
        result.chapter_count(),
        result.label,
        output_dir
    );

    let mut chapters = Vec::with_capacity(result.chapter_count());
    for chapter in &result.chapters {
        let title = chapter.display_title();
        let file = chapter_file_name(chapter.index + 1, &title);
        let path = output_dir.join(&file);

        fs::write(&path, &chapter.content)
            .with_context(|| format!("Failed to write chapter file: {:?}", path))?;

        chapters.push(ExportedChapter {
            file,
            title,
            character_count: chapter.char_len(),
        });
    }

    let exported_at = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    let manifest = ExportManifest {
        label: result.label.clone(),
        chapter_count: result.chapter_count(),
        total_length: result.total_length(),
        chapters,
        exported_at,
    };

    let manifest_path = output_dir.join(MANIFEST_FILE);
    let manifest_json = serde_json::to_string_pretty(&manifest)
        .with_context(|| "Failed to serialize export manifest")?;
    fs::write(&manifest_path, manifest_json)
        .with_context(|| format!("Failed to write export manifest: {:?}", manifest_path))?;

    info!("Export complete: {:?}", manifest_path);
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load_manifest(output_dir: &Path) -> Result<ExportManifest> {
        let manifest_path = output_dir.join(MANIFEST_FILE);
        let manifest_json = fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read export manifest: {:?}", manifest_path))?;

        serde_json::from_str(&manifest_json)
            .with_context(|| format!("Failed to parse export manifest: {:?}", manifest_path))
    }

    #[test]
    fn test_chapter_file_name() {
        assert_eq!(chapter_file_name(3, "Part: One"), "03_Part_ One.txt");
        assert_eq!(chapter_file_name(120, ""), "120_untitled.txt");
    }

    #[test]
    fn test_export_writes_files_and_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("chapters");

        let mut result = ExtractionResult::new("toc");
        result.push(Some("Intro/Preface".to_string()), None, "第一章 begins".to_string());
        result.push(None, None, String::new());

        let manifest = export_chapters(&result, &out).unwrap();
        assert_eq!(manifest.chapter_count, 2);
        assert_eq!(manifest.total_length, 10);
        assert_eq!(manifest.chapters[0].file, "01_Intro_Preface.txt");
        assert_eq!(manifest.chapters[1].file, "02_Chapter 2.txt");

        let text = fs::read_to_string(out.join("01_Intro_Preface.txt")).unwrap();
        assert_eq!(text, "第一章 begins");
        assert_eq!(fs::read_to_string(out.join("02_Chapter 2.txt")).unwrap(), "");

        let loaded = load_manifest(&out).unwrap();
        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_load_manifest_missing() {
        let temp_dir = TempDir::new().unwrap();
        assert!(load_manifest(temp_dir.path()).is_err());
    }
}
