//! CLI entry point for the sales analytics pipeline.

use anyhow::{Result, anyhow};
use chrono::Local;
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use sales_analytics::config::{DEFAULT_BOTTOM_K, DEFAULT_DATE_FORMAT, DEFAULT_TOP_K};
use sales_analytics::{
    AnalysisReport, CohortStats, Dimension, Pipeline, PipelineConfig, PipelineOutput,
    export_tables,
};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI-compatible dimension enum for the split monthly series
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDimension {
    /// Split by sales region
    Region,
    /// Split by customer segment
    Segment,
    /// Split by product category
    Category,
    /// Do not build a split series
    None,
}

impl From<CliDimension> for Option<Dimension> {
    fn from(cli: CliDimension) -> Self {
        match cli {
            CliDimension::Region => Some(Dimension::Region),
            CliDimension::Segment => Some(Dimension::Segment),
            CliDimension::Category => Some(Dimension::Category),
            CliDimension::None => None,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Descriptive sales analytics over order line items",
    long_about = "Loads a sales CSV, cleans and enriches it, and summarises customers, \
                  products and monthly trends, with top and bottom cohorts.\n\n\
                  EXAMPLES:\n  \
                  # Human-readable summary\n  \
                  sales-analytics -i superstore.csv\n\n  \
                  # Looser cohorts over profit margin, tables written to results/\n  \
                  sales-analytics -i superstore.csv --top-k 1 --bottom-k 1 \
                  --cohort-field profit_margin --export -o results/\n\n  \
                  # Machine-readable report\n  \
                  sales-analytics -i superstore.csv --json | jq .margins"
)]
struct Args {
    /// Path to the sales CSV file
    #[arg(short, long)]
    input: String,

    /// Output directory for exported tables and reports
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// chrono format of the order and ship date columns
    #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
    date_format: String,

    /// Multiplier k for top cohorts (value > mean + k * stddev)
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: f64,

    /// Multiplier k for bottom cohorts (value < mean - k * stddev)
    #[arg(long, default_value_t = DEFAULT_BOTTOM_K)]
    bottom_k: f64,

    /// Summary field compared for cohort selection
    #[arg(long, default_value = "total_profit")]
    cohort_field: String,

    /// Dimension for the split monthly series
    #[arg(long, value_enum, default_value = "region")]
    dimension: CliDimension,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write every table as CSV to the output directory
    #[arg(long)]
    export: bool,

    /// Write a JSON report to the output directory
    ///
    /// The report will be saved as <input_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    let config = PipelineConfig::builder()
        .date_format(&args.date_format)
        .top_k(args.top_k)
        .bottom_k(args.bottom_k)
        .cohort_field(&args.cohort_field)
        .time_dimension(args.dimension.into())
        .build()?;

    let pipeline = build_pipeline(&args, config)?;
    run_pipeline(&pipeline, &args)
}

fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    Ok(builder.build()?)
}

/// Run pipeline and print results
fn run_pipeline(pipeline: &Pipeline, args: &Args) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting sales analytics pipeline...");
    info!("{}", "=".repeat(80));

    let output = match pipeline.run_path(&args.input) {
        Ok(output) => output,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            return Err(anyhow!("Pipeline failed [{}]: {}", e.error_code(), e));
        }
    };

    handle_pipeline_output(&output, pipeline.config(), args)
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
/// - `--export`: Write every table as CSV
/// - `--emit-report`: Write JSON report to file
fn handle_pipeline_output(
    output: &PipelineOutput,
    config: &PipelineConfig,
    args: &Args,
) -> Result<()> {
    let report = AnalysisReport::from_output(
        output,
        &config.customer_cohort.field,
        &config.product_cohort.field,
    )
    .with_input(&args.input)
    .with_timestamp(Local::now().format("%Y-%m-%d %H:%M:%S").to_string());

    let output_dir = PathBuf::from(&args.output);

    if args.export {
        let written = export_tables(output, &output_dir)?;
        info!("Wrote {} tables to {}", written.len(), output_dir.display());
    }

    if args.emit_report {
        let report_path = report.write_to_dir(&output_dir, &extract_file_stem(&args.input))?;
        info!("Report written to: {}", report_path.display());
    }

    if args.json {
        println!("{}", report.to_json()?);
        return Ok(());
    }

    print_human_readable_summary(output, &report, args);
    Ok(())
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output")
        .to_string()
}

/// Truncate a string to max characters with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` intentionally: this is the primary CLI output and must be
/// visible regardless of log level.
fn print_human_readable_summary(output: &PipelineOutput, report: &AnalysisReport, args: &Args) {
    let summary = &output.summary;
    let margins = &output.margins;

    println!();
    println!("{}", "=".repeat(80));
    println!("ANALYSIS COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input: {} ({} rows x {} columns)",
        args.input, summary.rows_loaded, summary.columns_loaded
    );
    println!();

    println!("Cleaning:");
    println!(
        "  Duplicates removed: {} ({:.1}%)",
        summary.duplicates_removed,
        summary.duplicate_percentage()
    );
    println!("  Columns dropped: {}", summary.columns_dropped.join(", "));
    println!("  Text values repaired: {}", summary.values_repaired);
    println!(
        "  Records: {} enriched, {} excluded",
        summary.records_enriched, summary.records_excluded
    );
    println!();

    println!("Totals:");
    println!("  Sales:  {:>14.2}", margins.total_sale);
    println!("  Profit: {:>14.2}", margins.total_profit);
    println!("  Overall margin:          {:>6.1}%", margins.overall_margin * 100.0);
    println!(
        "  Mean customer margin:    {:>6.1}%",
        margins.mean_customer_margin * 100.0
    );
    println!(
        "  Mean product margin:     {:>6.1}%",
        margins.mean_product_margin * 100.0
    );
    println!(
        "  {} customers, {} products, {} months",
        summary.customers, summary.products, report.months
    );
    println!();

    println!("Most profitable customers:");
    println!(
        "  {:<12} {:<12} {:>8} {:>12} {:>12} {:>8}",
        "Customer", "Segment", "Orders", "Spend", "Profit", "Margin"
    );
    println!("  {}", "-".repeat(70));
    for c in output.customers.iter().take(5) {
        println!(
            "  {:<12} {:<12} {:>8} {:>12.2} {:>12.2} {:>7.1}%",
            c.customer_id,
            truncate_str(&c.segment, 12),
            c.num_orders,
            c.total_spend,
            c.total_profit,
            c.profit_margin * 100.0
        );
    }
    println!();

    println!("Most profitable products:");
    for p in output.products.iter().take(5) {
        println!(
            "  {:<40} {:>8} sold {:>12.2}",
            truncate_str(&p.product_name, 40),
            p.total_sold,
            p.total_profit
        );
    }
    println!();

    let field = &report.thresholds.customer_field;
    println!("Cohorts by {}:", field);
    print_cohort_line(
        "Top customers",
        &report.cohorts.top_customers,
        report.thresholds.top_customers.bound,
    );
    print_cohort_line(
        "Bottom customers",
        &report.cohorts.bottom_customers,
        report.thresholds.bottom_customers.bound,
    );
    print_cohort_line(
        "Top products",
        &report.cohorts.top_products,
        report.thresholds.top_products.bound,
    );
    print_cohort_line(
        "Bottom products",
        &report.cohorts.bottom_products,
        report.thresholds.bottom_products.bound,
    );
    println!();

    if !summary.warnings.is_empty() {
        println!("Warnings:");
        for warning in &summary.warnings {
            println!("  - {}", warning);
        }
        println!();
    }

    println!("{}", "=".repeat(80));
    if !args.export {
        println!("Add --export to write every table as CSV to {}", args.output);
    }
}

fn print_cohort_line(label: &str, stats: &CohortStats, bound: f64) {
    if stats.degenerate {
        println!("  {:<18} empty (no variance)", label);
        return;
    }
    println!(
        "  {:<18} {:>5} rows  bound {:>10.2}  profit {:>12.2}  avg discount {:>5.1}%  avg margin {:>6.1}%",
        label,
        stats.count,
        bound,
        stats.total_profit,
        stats.mean_avg_discount * 100.0,
        stats.mean_profit_margin * 100.0
    );
}
