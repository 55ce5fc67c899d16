// Entry point and high-level CLI flow.
//
// - `inspect` loads and normalizes the extract, printing diagnostics.
// - `report` runs the standard report set, writes one CSV per table plus a
//   JSON summary, and prints markdown previews of each table.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shift_report::error::ConfigError;
use shift_report::fields::MetricField;
use shift_report::loader::{self, LoadReport};
use shift_report::logging::{init_logging, LogConfig, LogFormat};
use shift_report::output::{self, preview_table};
use shift_report::period::Period;
use shift_report::query::{self, QueryConfig, DEFAULT_TOP_N};
use shift_report::reports::ReportBundle;
use shift_report::types::ShiftOffer;
use shift_report::util::format_int;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "shift-report", version, about = "Shift-offer analytics reports")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load and normalize an extract, then print load diagnostics.
    Inspect {
        input: PathBuf,
    },
    /// Generate every report table from an extract.
    Report {
        input: PathBuf,

        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,

        /// Period buckets to rank by; repeat for several. Defaults to all.
        #[arg(long, value_parser = parse_period)]
        period: Vec<Period>,

        #[arg(long, default_value_t = DEFAULT_TOP_N, value_parser = parse_top_n)]
        top_n: usize,

        /// Numeric field to sum for rankings and the monthly trend.
        #[arg(long, default_value = "TOTAL_CHARGE_RATE", value_parser = parse_metric)]
        metric: MetricField,

        /// Group rankings by period only, not by workplace.
        #[arg(long)]
        no_entity: bool,

        /// Rows shown per table preview.
        #[arg(long, default_value_t = 3)]
        preview_rows: usize,
    },
}

fn parse_period(s: &str) -> Result<Period, ConfigError> {
    s.parse()
}

fn parse_top_n(s: &str) -> Result<usize, ConfigError> {
    query::parse_top_n(s)
}

fn parse_metric(s: &str) -> Result<MetricField, ConfigError> {
    s.parse()
}

fn load(input: &Path) -> Result<(Vec<ShiftOffer>, LoadReport)> {
    loader::load_path(input).with_context(|| format!("failed to load {}", input.display()))
}

fn print_load_report(report: &LoadReport) {
    println!(
        "Processing dataset... ({} rows read, {} skipped as unreadable)",
        format_int(report.total_rows),
        format_int(report.skipped_rows)
    );
    println!(
        "Note: {} rows have no usable shift start and are left out of time-bucketed reports.",
        format_int(report.missing_start)
    );
    if report.unparsed_timestamps + report.unparsed_numbers > 0 {
        println!(
            "Info: {} timestamp and {} numeric cells could not be read and were set to null.",
            format_int(report.unparsed_timestamps),
            format_int(report.unparsed_numbers)
        );
    }
    if report.undecodable_cells > 0 {
        println!(
            "Info: {} cells were not valid UTF-8 and were set to null.",
            format_int(report.undecodable_cells)
        );
    }
    println!();
}

fn handle_inspect(input: &Path) -> Result<()> {
    let (offers, report) = load(input)?;
    print_load_report(&report);
    preview_table("Summary", &[query::summarize(&offers)], 1);
    Ok(())
}

fn handle_report(
    input: &Path,
    out_dir: &Path,
    periods: &[Period],
    config: &QueryConfig,
    preview_rows: usize,
) -> Result<()> {
    let (offers, report) = load(input)?;
    print_load_report(&report);

    let bundle = ReportBundle::build(&offers, config, periods)?;
    let written = output::write_bundle(out_dir, &bundle)
        .with_context(|| format!("failed to write reports to {}", out_dir.display()))?;
    info!(files = written.len(), dir = %out_dir.display(), "reports written");

    println!("Generating reports...");
    println!("Outputs saved to {}\n", out_dir.display());

    println!("1. WORKPLACES WITH HIGHEST {}\n", bundle.metric);
    for p in &bundle.by_period {
        preview_table(&format!("Top workplaces ({})", p.period), &p.top_by_metric, preview_rows);
    }
    preview_table("Monthly trend", &bundle.monthly_trend, preview_rows);

    println!("2. MOST COMMON VALUES FOR VIEWED OFFERS\n");
    for (field, rows) in &bundle.viewed_values {
        preview_table(&format!("Top {}", field), rows, preview_rows);
    }
    preview_table("Pay rate by slot", &bundle.pay_rate_by_slot, preview_rows);

    println!("3. VERIFIED SHIFTS AND NO-CALL NO-SHOWS\n");
    for p in &bundle.by_period {
        preview_table(&format!("Verified ({})", p.period), &p.verified, preview_rows);
        preview_table(&format!("NCNS ({})", p.period), &p.ncns, preview_rows);
    }
    preview_table("Verified split", &bundle.verified_split, 2);
    preview_table("NCNS split", &bundle.ncns_split, 2);

    preview_table("Summary Stats (summary.json)", &[bundle.summary], 1);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose).with_format(cli.log_format));

    match cli.command {
        Command::Inspect { input } => handle_inspect(&input),
        Command::Report {
            input,
            out_dir,
            period,
            top_n,
            metric,
            no_entity,
            preview_rows,
        } => {
            let periods = if period.is_empty() {
                Period::ALL.to_vec()
            } else {
                period
            };
            let config = QueryConfig::default()
                .with_top_n(top_n)
                .with_metric(metric)
                .with_group_by_entity(!no_entity);
            handle_report(&input, &out_dir, &periods, &config, preview_rows)
        }
    }
}
