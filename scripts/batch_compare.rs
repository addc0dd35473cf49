use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use chapter_audit::batch::{discover_epubs, run_batch};
use chapter_audit::{AuditConfig, ExtractorKind};

#[derive(Debug, Parser)]
#[command(author, version, about = "Compare two extraction strategies over a directory of EPUB files")]
struct Args {
    /// Input directory containing EPUB files
    #[arg(short, long)]
    input: PathBuf,

    /// Path to configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Baseline extraction strategy
    #[arg(long, value_enum, default_value_t = ExtractorKind::Spine)]
    a: ExtractorKind,

    /// Candidate extraction strategy
    #[arg(long, value_enum, default_value_t = ExtractorKind::Toc)]
    b: ExtractorKind,

    /// Where to write the JSON batch report
    #[arg(short, long)]
    report: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = AuditConfig::load_or_default(args.config.as_deref())?;

    info!("Starting batch comparison: {} vs {}", args.a, args.b);
    info!("Input directory: {:?}", args.input);

    let books = discover_epubs(&args.input)?;
    if books.is_empty() {
        anyhow::bail!("No EPUB files found in {:?}", args.input);
    }

    let extractor_a = args.a.build(&config.extraction)?;
    let extractor_b = args.b.build(&config.extraction)?;
    let summary = run_batch(&books, extractor_a.as_ref(), extractor_b.as_ref(), &config.comparator);

    for entry in &summary.entries {
        match (&entry.report, &entry.error) {
            (Some(report), _) => println!(
                "{:<12} {:>8} {}",
                report.verdict.to_string(),
                report.retention_rate.to_string(),
                entry.path.display()
            ),
            (None, error) => println!(
                "{:<12} {:>8} {} ({})",
                "FAILED",
                "-",
                entry.path.display(),
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    println!();
    println!("Books:        {}", summary.total());
    println!("Improved:     {}", summary.improved);
    println!("Regressed:    {}", summary.regressed);
    println!("Inconclusive: {}", summary.inconclusive);
    println!("Failed:       {}", summary.failed);

    if let Some(report_path) = &args.report {
        let report_json = serde_json::to_string_pretty(&summary)
            .with_context(|| "Failed to serialize batch report")?;
        fs::write(report_path, report_json)
            .with_context(|| format!("Failed to write batch report: {:?}", report_path))?;
        info!("Batch report saved to: {:?}", report_path);
    }

    Ok(())
}
