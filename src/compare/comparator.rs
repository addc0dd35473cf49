use super::metrics::{summarize, RunMetrics};
use super::report::{Advisory, ComparisonReport, RetentionRate, Side, Verdict};
use crate::config::ComparatorConfig;
use crate::extract::ExtractionResult;

/// Compare run B against run A.
///
/// Pure and deterministic: no I/O, no shared state, and identical inputs
/// always yield an identical report. `config` is expected to have passed
/// [`ComparatorConfig::validate`]; empty runs degrade to zero counts and an
/// undefined retention rate rather than failing.
pub fn compare(
    result_a: &ExtractionResult,
    result_b: &ExtractionResult,
    config: &ComparatorConfig,
) -> ComparisonReport {
    let metrics_a = summarize(result_a, config);
    let metrics_b = summarize(result_b, config);
    let retention_rate = RetentionRate::between(metrics_a.total_length, metrics_b.total_length);

    let verdict = decide_verdict(&metrics_a, &metrics_b, retention_rate, config);
    let advisories = collect_advisories(&metrics_a, &metrics_b, config);

    ComparisonReport {
        total_length_a: metrics_a.total_length,
        total_length_b: metrics_b.total_length,
        retention_rate,
        chapter_count_a: metrics_a.chapter_count,
        chapter_count_b: metrics_b.chapter_count,
        short_chapter_count_a: metrics_a.short_chapter_count(),
        short_chapter_count_b: metrics_b.short_chapter_count(),
        duplicate_group_count_a: metrics_a.duplicate_group_count(),
        duplicate_group_count_b: metrics_b.duplicate_group_count(),
        long_chapter_count_a: metrics_a.long_chapter_count(),
        long_chapter_count_b: metrics_b.long_chapter_count(),
        advisories,
        verdict,
        metrics_a,
        metrics_b,
    }
}

fn decide_verdict(
    a: &RunMetrics,
    b: &RunMetrics,
    retention: RetentionRate,
    config: &ComparatorConfig,
) -> Verdict {
    let rate = retention.value();

    let lost_content = rate.is_some_and(|r| r < config.retention_pass_threshold);
    let more_duplicates = b.duplicate_group_count() > a.duplicate_group_count();
    let left_bounds = a.within_reasonable_bounds && !b.within_reasonable_bounds;
    if lost_content || more_duplicates || left_bounds {
        return Verdict::Regressed;
    }

    let kept_everything = rate.is_some_and(|r| r >= 1.0);
    let fewer_short = b.short_chapter_count() < a.short_chapter_count();
    let no_new_duplicates = b.duplicate_group_count() <= a.duplicate_group_count();
    if kept_everything && fewer_short && no_new_duplicates {
        return Verdict::Improved;
    }

    Verdict::Inconclusive
}

fn collect_advisories(a: &RunMetrics, b: &RunMetrics, config: &ComparatorConfig) -> Vec<Advisory> {
    let mut advisories = Vec::new();

    for (side, metrics) in [(Side::A, a), (Side::B, b)] {
        if !metrics.within_reasonable_bounds {
            advisories.push(Advisory::ChapterCountOutOfBounds {
                side,
                count: metrics.chapter_count,
                min: config.min_reasonable_chapters,
                max: config.max_reasonable_chapters,
            });
        }
        if metrics.long_chapter_count() > 0 {
            advisories.push(Advisory::LongChapters {
                side,
                count: metrics.long_chapter_count(),
            });
        }
    }

    advisories
}
