use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use supply_chain_normalizer::config::NormalizerConfig;
use supply_chain_normalizer::{logging, pipeline};

#[derive(Parser)]
#[command(name = "supply-normalizer")]
#[command(about = "Normalize a flat supply-chain order export into relational tables")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the eight tables plus a manifest
    Run {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// TOML config file; flags given here override its values
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
        /// First valid calendar day, YYYY-MM-DD
        #[arg(long)]
        date_start: Option<NaiveDate>,
        /// Last valid calendar day, YYYY-MM-DD
        #[arg(long)]
        date_end: Option<NaiveDate>,
        #[arg(long)]
        delimiter: Option<char>,
    },
    /// Report row count, header problems and anomaly counts without writing anything
    Inspect {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Reload an export directory and re-check keys and checksums
    Verify {
        #[arg(long)]
        output_dir: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<NormalizerConfig> {
    match path {
        Some(p) => NormalizerConfig::from_file(p)
            .with_context(|| format!("loading config from {}", p.display())),
        None => Ok(NormalizerConfig::default()),
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            input,
            output_dir,
            config,
            seed,
            date_start,
            date_end,
            delimiter,
        } => {
            let mut cfg = load_config(config.as_ref())?;
            if let Some(v) = input {
                cfg.input = v;
            }
            if let Some(v) = output_dir {
                cfg.output_dir = v;
            }
            if let Some(v) = seed {
                cfg.seed = v;
            }
            if let Some(v) = date_start {
                cfg.dates.start = v;
            }
            if let Some(v) = date_end {
                cfg.dates.end = v;
            }
            if let Some(v) = delimiter {
                cfg.delimiter = v;
            }

            pipeline::run(&cfg).map(|report| {
                println!("\n📊 Normalization results:");
                println!("   Input rows: {}", report.input_rows);
                for table in &report.tables {
                    println!("   {:<18} {:>8} rows  {}", table.table, table.rows, table.file);
                }
                println!(
                    "   Repairs: {} countries, {} states, {} cities ({} left unresolved)",
                    report.repairs.countries_fixed,
                    report.repairs.states_fixed,
                    report.repairs.cities_fixed,
                    report.repairs.unresolved.len()
                );
                println!(
                    "   Dates: {} order, {} shipping synthesized, {} shipping reordered",
                    report.dates.order_dates_synthesized,
                    report.dates.shipping_dates_synthesized,
                    report.dates.shipping_dates_reordered
                );
                println!("   Output: {}", report.output_dir.display());
            })
        }
        Commands::Inspect { input, config } => {
            let cfg = load_config(config.as_ref())?;
            let delimiter = cfg.delimiter_byte()?;
            pipeline::inspect(&input, delimiter, &cfg.dates).map(|report| {
                println!("\n🔎 {}", input.display());
                println!("   Rows: {}  Columns: {}", report.rows, report.columns);
                match &report.schema_problem {
                    Some(problem) => println!("   Header: ❌ {problem}"),
                    None => println!("   Header: ✅ matches the expected layout"),
                }
                println!("   Unusable order dates: {}", report.unusable_order_dates);
                println!("   Unusable shipping dates: {}", report.unusable_shipping_dates);
                println!("   ZIP codes in state field: {}", report.zip_like_states);
                println!("   Malformed countries: {}", report.malformed_countries);
            })
        }
        Commands::Verify { output_dir } => pipeline::verify(&output_dir).map(|report| {
            println!("\n✅ {} verified", output_dir.display());
            for (table, rows) in &report.tables {
                println!("   {table:<18} {rows:>8} rows");
            }
            if !report.checksums_verified {
                println!("   ⚠️  No manifest found, checksums not compared");
            }
        }),
    };

    match outcome {
        Ok(()) => {
            info!("Command finished");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            Err(e.into())
        }
    }
}
