use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::Parser;
use log::{info, warn};
use thiserror::Error;

use salespipe::{ingest, LoadSummary, Report, Store};

/// Ingest the customer feed and the daily sales feeds for a date range, then
/// print the aggregate report tables as CSV.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// First day of the range (YYYY-MM-DD)
    start: NaiveDate,
    /// Last day of the range, inclusive (YYYY-MM-DD)
    end: NaiveDate,
    /// Customer feed file
    #[arg(long, default_value = "CustomerData.csv")]
    customers: PathBuf,
    /// Directory holding the daily sales files
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,
    /// SQLite database, created on first run and appended to on every run
    #[arg(long, default_value = "sales.db")]
    db: PathBuf,
}

/// Any kind of error in the pipeline ingestion -> join -> report output.
#[derive(Debug, Error)]
enum Error {
    #[error(transparent)]
    Pipeline(#[from] salespipe::Error),
    #[error("error writing report: {0}")]
    Csv(#[from] csv::Error),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    if args.start > args.end {
        warn!("empty date range: {} is after {}", args.start, args.end);
    }

    match run(&args) {
        Ok(summary) => {
            info!(
                "done: {} rows loaded, {} rows skipped, {} files missing",
                summary.rows_loaded, summary.rows_skipped, summary.files_missing
            );
            if summary.clean() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<LoadSummary, Error> {
    let store = Store::open(&args.db)?;
    let mut summary = ingest::load_customers(&store, &args.customers)?;
    summary += ingest::load_sales(&store, &args.data_dir, args.start, args.end)?;

    let report = Report::build(&store.join_all()?);
    store.close()?;

    section("Top 5 customers by spend", |w| {
        report.dump_top_customers_csv(w)
    })?;
    section("Products by sales count", |w| {
        report.dump_product_counts_csv(w)
    })?;
    section("Daily trend of sales per product", |w| {
        report.daily_trend.dump_csv(w)
    })?;
    section("Average daily sales per product", |w| {
        report.dump_average_per_product_csv(w)
    })?;
    section("Average daily sales per amount band", |w| {
        report.dump_average_per_band_csv(w)
    })?;
    section("Average daily spend per customer", |w| {
        report.dump_average_spend_csv(w)
    })?;

    Ok(summary)
}

fn section<F>(title: &str, dump: F) -> csv::Result<()>
where
    F: FnOnce(&mut csv::Writer<std::io::Stdout>) -> csv::Result<()>,
{
    println!("\n# {title}");
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    dump(&mut writer)?;
    writer.flush()?;
    Ok(())
}
