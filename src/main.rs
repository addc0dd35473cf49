use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chapter_audit::compare::summarize;
use chapter_audit::export::export_chapters;
use chapter_audit::render::{render_detailed, render_inspection, render_summary};
use chapter_audit::{compare, AuditConfig, ExtractionResult, ExtractorKind, Verdict};

#[derive(Debug, Parser)]
#[command(author, version, about = "Compare EPUB chapter extraction runs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract a book with two strategies and compare the runs
    Compare(CompareArgs),
    /// Extract a book once and report chapter statistics
    Inspect(InspectArgs),
    /// Extract a book and write each chapter to a text file
    Export(ExportArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
struct CompareArgs {
    /// Path to the EPUB file
    epub: PathBuf,
    /// Path to configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Baseline extraction strategy
    #[arg(long, value_enum, default_value_t = ExtractorKind::Spine)]
    a: ExtractorKind,
    /// Candidate extraction strategy
    #[arg(long, value_enum, default_value_t = ExtractorKind::Toc)]
    b: ExtractorKind,
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
    /// Include the per-chapter table and change summary
    #[arg(long)]
    detailed: bool,
    /// Also export both runs and the JSON report here
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Exit with an error when the verdict is REGRESSED
    #[arg(long)]
    fail_on_regression: bool,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Path to the EPUB file
    epub: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ExtractorKind::Toc)]
    extractor: ExtractorKind,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// Path to the EPUB file
    epub: PathBuf,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = ExtractorKind::Toc)]
    extractor: ExtractorKind,
    /// Output directory
    #[arg(short, long, default_value = "./output")]
    output: PathBuf,
}

fn main() -> Result<()> {
    // Reports go to stdout, logs to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare(args) => compare_command(args),
        Commands::Inspect(args) => inspect_command(args),
        Commands::Export(args) => export_command(args),
    }
}

fn ensure_book_exists(path: &Path) -> Result<()> {
    if !path.is_file() {
        anyhow::bail!("EPUB file does not exist: {:?}", path);
    }
    Ok(())
}

fn extract_with(kind: ExtractorKind, config: &AuditConfig, path: &Path) -> Result<ExtractionResult> {
    let extractor = kind.build(&config.extraction)?;
    extractor
        .extract(path)
        .with_context(|| format!("{} extraction failed for {:?}", kind, path))
}

fn compare_command(args: CompareArgs) -> Result<()> {
    let config = AuditConfig::load_or_default(args.config.as_deref())?;
    info!("Comparator settings: {}", config.comparator);
    ensure_book_exists(&args.epub)?;

    let result_a = extract_with(args.a, &config, &args.epub)?;
    let result_b = extract_with(args.b, &config, &args.epub)?;

    let report = compare(&result_a, &result_b, &config.comparator);
    info!("Verdict: {}", report.verdict);

    let rendered = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)
            .with_context(|| "Failed to serialize comparison report")?,
        OutputFormat::Text if args.detailed => render_detailed(&report, &result_a, &result_b),
        OutputFormat::Text => render_summary(&report),
    };
    println!("{}", rendered.trim_end());

    if let Some(output_dir) = &args.output_dir {
        export_chapters(&result_a, &output_dir.join("a"))?;
        export_chapters(&result_b, &output_dir.join("b"))?;

        let report_path = output_dir.join("report.json");
        let report_json = serde_json::to_string_pretty(&report)
            .with_context(|| "Failed to serialize comparison report")?;
        fs::write(&report_path, report_json)
            .with_context(|| format!("Failed to write report: {:?}", report_path))?;
        info!("Report saved to: {:?}", report_path);
    }

    if args.fail_on_regression && report.verdict == Verdict::Regressed {
        anyhow::bail!("{} regressed against {}", args.b, args.a);
    }

    Ok(())
}

fn inspect_command(args: InspectArgs) -> Result<()> {
    let config = AuditConfig::load_or_default(args.config.as_deref())?;
    ensure_book_exists(&args.epub)?;

    let result = extract_with(args.extractor, &config, &args.epub)?;
    let metrics = summarize(&result, &config.comparator);
    println!("{}", render_inspection(&metrics, &result).trim_end());
    Ok(())
}

fn export_command(args: ExportArgs) -> Result<()> {
    let config = AuditConfig::load_or_default(args.config.as_deref())?;
    ensure_book_exists(&args.epub)?;

    let result = extract_with(args.extractor, &config, &args.epub)?;
    if result.is_empty() {
        anyhow::bail!("No chapters found in {:?}", args.epub);
    }

    let manifest = export_chapters(&result, &args.output)?;
    info!(
        "Exported {} chapters ({} characters) to {:?}",
        manifest.chapter_count, manifest.total_length, args.output
    );
    Ok(())
}
