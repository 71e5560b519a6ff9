mod config;
mod error;
mod features;
mod fetch;
mod loader;
mod models;
mod pipeline;
mod prospectus;
mod storage;
mod transform;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::AppConfig;
use crate::pipeline::{Pipeline, StageStats};

#[derive(Parser)]
#[command(name = "ipo-etl", about = "SEC IPO prospectus ETL", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Download prospectus filings listed in the index (skips ones on disk)
    Fetch,

    /// Pull finance tables out of each filing into per-company CSVs
    Extract,

    /// Reconcile combined tables into one summary row per company
    Transform,

    /// Merge like terms and drop sparse columns from all_financial.csv
    Reduce,

    /// extract → transform → reduce
    Run,

    /// Flatten inline XBRL facts and pivot them per company
    Xbrl,

    /// Keyword and underwriter counts per filing
    Keywords,

    /// Financial ratios from the XBRL pivot
    Features,

    /// Join reduced financials with the keyword dataset
    Merge,

    /// Show what is on disk
    Stats,
}

fn report(stage: &str, stats: &StageStats) {
    info!("Done {}: {}", stage, stats);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "ipo_prospectus_etl=info,warn",
        1 => "ipo_prospectus_etl=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::new(filter))
        .init();

    let config = AppConfig::load()?;
    let pipeline = Pipeline::new(config)?;

    match cli.command {
        Command::Fetch => {
            let stats = pipeline.fetch().await?;
            info!(
                "Done: {} fetched, {} already present, {} failed",
                stats.fetched, stats.skipped, stats.failed
            );
        }

        Command::Extract => report("extract", &pipeline.extract()?),
        Command::Transform => report("transform", &pipeline.transform()?),
        Command::Reduce => report("reduce", &pipeline.reduce()?),
        Command::Xbrl => report("xbrl", &pipeline.xbrl()?),
        Command::Keywords => report("keywords", &pipeline.keywords()?),
        Command::Features => report("features", &pipeline.features()?),
        Command::Merge => report("merge", &pipeline.merge()?),

        Command::Run => {
            for (stage, stats) in pipeline.run()? {
                report(stage, &stats);
            }
        }

        Command::Stats => {
            let stats = pipeline.stats()?;
            println!("─────────────────────────────────────────");
            println!("  IPO ETL — Workspace Stats");
            println!("─────────────────────────────────────────");
            println!("  Listings        : {}", utils::fmt_number(stats.listings));
            println!("  Filings on disk : {}", utils::fmt_number(stats.filings));
            println!("  Finance tables  : {}", utils::fmt_number(stats.finance_tables));
            for (name, n) in &stats.per_company {
                println!("  {:<24}: {}", name, utils::fmt_number(*n));
            }
            println!("─────────────────────────────────────────");
            for (name, rows) in &stats.aggregates {
                let rows = rows.map(utils::fmt_number).unwrap_or_else(|| "—".into());
                println!("  {:<28}: {}", name, rows);
            }
            println!("─────────────────────────────────────────");
        }
    }

    Ok(())
}
