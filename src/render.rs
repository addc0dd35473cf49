//! Plain-text renderings of comparison and inspection results.

use crate::compare::{ComparisonReport, DuplicateGroup, RunMetrics};
use crate::extract::{ChapterRecord, ExtractionResult};
use crate::utils::truncate_chars;

const TITLE_WIDTH: usize = 40;

fn field(lines: &mut Vec<String>, key: &str, value: impl std::fmt::Display) {
    lines.push(format!("{:<24}{}", format!("{}:", key), value));
}

/// Key/value report: totals, counts, retention rate and verdict.
pub fn render_summary(report: &ComparisonReport) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Comparison: {} (A) -> {} (B)",
        report.metrics_a.label, report.metrics_b.label
    ));
    field(&mut lines, "Total length A", report.total_length_a);
    field(&mut lines, "Total length B", report.total_length_b);
    field(&mut lines, "Chapter count A", report.chapter_count_a);
    field(&mut lines, "Chapter count B", report.chapter_count_b);
    field(&mut lines, "Short chapters A", report.short_chapter_count_a);
    field(&mut lines, "Short chapters B", report.short_chapter_count_b);
    field(&mut lines, "Duplicate groups A", report.duplicate_group_count_a);
    field(&mut lines, "Duplicate groups B", report.duplicate_group_count_b);
    field(&mut lines, "Retention rate", report.retention_rate);
    field(&mut lines, "Verdict", report.verdict);
    lines.join("\n") + "\n"
}

fn chapter_row(index: usize, side: &str, chapter: Option<&ChapterRecord>) -> String {
    match chapter {
        Some(chapter) => format!(
            "{:<5} {:<4} {:<40} {:>10}",
            index + 1,
            side,
            truncate_chars(&chapter.display_title(), TITLE_WIDTH),
            chapter.char_len()
        ),
        None => format!("{:<5} {:<4} {:<40} {:>10}", index + 1, side, "(none)", 0),
    }
}

fn duplicate_lines(lines: &mut Vec<String>, side: &str, groups: &[DuplicateGroup]) {
    if groups.is_empty() {
        lines.push(format!("  {}: no duplicate content", side));
        return;
    }
    lines.push(format!("  {}: {} duplicate groups", side, groups.len()));
    for (n, group) in groups.iter().enumerate() {
        let members: Vec<String> = group.indices.iter().map(|i| (i + 1).to_string()).collect();
        lines.push(format!(
            "    group {}: chapters {} - {}...",
            n + 1,
            members.join(", "),
            group.sample
        ));
    }
}

fn flagged_lines(lines: &mut Vec<String>, side: &str, indices: &[usize], result: &ExtractionResult) {
    lines.push(format!("    {}: {}", side, indices.len()));
    for &index in indices {
        if let Some(chapter) = result.chapters.get(index) {
            lines.push(format!(
                "      {}. {} ({} chars)",
                index + 1,
                truncate_chars(&chapter.display_title(), 30),
                chapter.char_len()
            ));
        }
    }
}

fn percent_of(part: usize, whole: usize) -> f64 {
    part as f64 / whole as f64 * 100.0
}

fn change_summary(report: &ComparisonReport) -> Vec<String> {
    let mut lines = Vec::new();
    let (a, b) = (report.total_length_a, report.total_length_b);

    if a > 0 && b > a {
        lines.push(format!("  + B has more content, up {:.1}%", percent_of(b - a, a)));
    } else if a > 0 && b < a {
        lines.push(format!("  - B has less content, down {:.1}%", percent_of(a - b, a)));
    } else if a == b {
        lines.push("  = Both runs extracted the same amount of content".to_string());
    } else {
        lines.push("  ? Run A extracted no content; retention is undefined".to_string());
    }

    let (short_a, short_b) = (report.short_chapter_count_a, report.short_chapter_count_b);
    if short_b < short_a {
        lines.push(format!("  + B has {} fewer short chapters", short_a - short_b));
    } else if short_b > short_a {
        lines.push(format!("  - B has {} more short chapters", short_b - short_a));
    }

    let (dup_a, dup_b) = (report.duplicate_group_count_a, report.duplicate_group_count_b);
    if dup_b < dup_a {
        lines.push(format!("  + B has {} fewer duplicate groups", dup_a - dup_b));
    } else if dup_b > dup_a {
        lines.push(format!("  - B has {} more duplicate groups", dup_b - dup_a));
    }

    lines
}

/// Summary plus side-by-side chapter table, duplicates, flagged chapters,
/// advisories and a change summary.
pub fn render_detailed(
    report: &ComparisonReport,
    result_a: &ExtractionResult,
    result_b: &ExtractionResult,
) -> String {
    let mut lines = vec![render_summary(report)];

    lines.push("Chapters:".to_string());
    lines.push(format!("{:<5} {:<4} {:<40} {:>10}", "#", "run", "title", "chars"));
    let rows = result_a.chapter_count().max(result_b.chapter_count());
    for i in 0..rows {
        let a = result_a.chapters.get(i);
        let b = result_b.chapters.get(i);
        lines.push(chapter_row(i, "A", a));
        lines.push(chapter_row(i, "B", b));
        if let (Some(a), Some(b)) = (a, b) {
            let diff = b.char_len() as i64 - a.char_len() as i64;
            if diff != 0 {
                lines.push(format!("{:<5} {:<4} {:<40} {:>+10}", "", "diff", "", diff));
            }
        }
    }

    lines.push(String::new());
    lines.push("Duplicate content:".to_string());
    duplicate_lines(&mut lines, "A", &report.metrics_a.duplicate_groups);
    duplicate_lines(&mut lines, "B", &report.metrics_b.duplicate_groups);

    lines.push(String::new());
    lines.push("Short chapters:".to_string());
    flagged_lines(&mut lines, "A", &report.metrics_a.short_chapters, result_a);
    flagged_lines(&mut lines, "B", &report.metrics_b.short_chapters, result_b);
    lines.push("Long chapters:".to_string());
    flagged_lines(&mut lines, "A", &report.metrics_a.long_chapters, result_a);
    flagged_lines(&mut lines, "B", &report.metrics_b.long_chapters, result_b);

    if !report.advisories.is_empty() {
        lines.push(String::new());
        lines.push("Advisories:".to_string());
        for advisory in &report.advisories {
            lines.push(format!("  ! {}", advisory));
        }
    }

    lines.push(String::new());
    lines.push("Changes:".to_string());
    lines.extend(change_summary(report));

    lines.join("\n") + "\n"
}

/// Single-run report: per-chapter lengths, flagged chapters and duplicates.
pub fn render_inspection(metrics: &RunMetrics, result: &ExtractionResult) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Run: {}", metrics.label));
    field(&mut lines, "Chapter count", metrics.chapter_count);
    field(&mut lines, "Total length", metrics.total_length);

    lines.push("Chapters:".to_string());
    for chapter in &result.chapters {
        lines.push(format!(
            "  {:>3}. {:<50} | {:>8} chars",
            chapter.index + 1,
            truncate_chars(&chapter.display_title(), 50),
            chapter.char_len()
        ));
    }

    lines.push("Short chapters:".to_string());
    flagged_lines(&mut lines, metrics.label.as_str(), &metrics.short_chapters, result);
    lines.push("Long chapters:".to_string());
    flagged_lines(&mut lines, metrics.label.as_str(), &metrics.long_chapters, result);

    lines.push("Duplicate content:".to_string());
    duplicate_lines(&mut lines, metrics.label.as_str(), &metrics.duplicate_groups);

    if !metrics.within_reasonable_bounds {
        lines.push(format!(
            "  ! chapter count {} is outside the reasonable range",
            metrics.chapter_count
        ));
    }

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{compare, summarize};
    use crate::config::ComparatorConfig;

    fn sample_runs() -> (ExtractionResult, ExtractionResult) {
        let a = ExtractionResult::from_contents(
            "spine",
            ["x".repeat(1000), "y".repeat(1000), "z".repeat(1000)],
        );
        let mut b = ExtractionResult::new("toc");
        b.push(Some("Opening".to_string()), None, "x".repeat(1000));
        b.push(Some("Middle".to_string()), None, "y".repeat(700));
        b.push(Some("Repeat".to_string()), None, "y".repeat(700));
        (a, b)
    }

    #[test]
    fn test_summary_lists_every_field() {
        let (a, b) = sample_runs();
        let report = compare(&a, &b, &ComparatorConfig::default());
        let text = render_summary(&report);

        assert!(text.starts_with("Comparison: spine (A) -> toc (B)"));
        assert!(text.contains("Total length A:         3000"));
        assert!(text.contains("Total length B:         2400"));
        assert!(text.contains("Duplicate groups B:     1"));
        assert!(text.contains("Retention rate:         80.0%"));
        assert!(text.contains("Verdict:                REGRESSED"));
    }

    #[test]
    fn test_summary_undefined_retention() {
        let a = ExtractionResult::new("spine");
        let report = compare(&a, &a, &ComparatorConfig::default());
        assert!(render_summary(&report).contains("Retention rate:         n/a"));
    }

    #[test]
    fn test_detailed_report_sections() {
        let (a, b) = sample_runs();
        let report = compare(&a, &b, &ComparatorConfig::default());
        let text = render_detailed(&report, &a, &b);

        assert!(text.contains("Opening"));
        assert!(text.contains("-300"));
        assert!(text.contains("group 1: chapters 2, 3"));
        assert!(text.contains("- B has less content, down 20.0%"));
        assert!(text.contains("- B has 1 more duplicate groups"));
    }

    #[test]
    fn test_inspection_flags_short_chapters() {
        let result = ExtractionResult::from_contents("toc", ["tiny", "x".repeat(900).as_str()]);
        let metrics = summarize(&result, &ComparatorConfig::default());
        let text = render_inspection(&metrics, &result);

        assert!(text.contains("Chapter count:          2"));
        assert!(text.contains("1. Chapter 1 (4 chars)"));
        assert!(text.contains("outside the reasonable range"));
    }
}
