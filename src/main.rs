use clap::{Parser, Subcommand};
use dash_ledger::aggregate::{self, Dashboard};
use dash_ledger::config::Config;
use dash_ledger::delivery_db::{DeliveryStore, SqliteDeliveryStore};
use dash_ledger::ocr;
use dash_ledger::pipeline::{self, DeliveryOutcome, RecordStatus};
use std::fs;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dash_ledger")]
#[command(about = "Track delivery pay and timing from app screenshots", long_about = None)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = ".config/dash_ledger.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// OCR a before/after screenshot pair and record the delivery
    Ingest {
        /// Screenshot taken before accepting the offer
        #[arg(long)]
        before: PathBuf,
        /// Screenshot taken after completing the delivery
        #[arg(long)]
        after: PathBuf,
    },
    /// Parse already-recognized text dumps instead of images
    Parse {
        #[arg(long)]
        before: PathBuf,
        #[arg(long)]
        after: PathBuf,
        /// Append the resulting record to the store
        #[arg(long, default_value_t = false)]
        save: bool,
    },
    /// Summarize the full delivery history
    Stats {
        /// Print the dashboard as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List stored deliveries
    History,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load_or_default(&cli.config)?;

    match cli.command {
        Commands::Ingest { before, after } => {
            let store = SqliteDeliveryStore::new(&cfg.db_path)?;
            let engine = ocr::engine_from_config(&cfg.ocr);
            let before_image = fs::read(&before)?;
            let after_image = fs::read(&after)?;
            info!(before = %before.display(), after = %after.display(), "Ingesting screenshots");

            let outcome = pipeline::process_screenshots(
                engine.as_ref(),
                Some(&store),
                &before_image,
                &after_image,
                &cfg.ocr.language,
                &cfg.parse,
                OffsetDateTime::now_utc(),
            )
            .await?;
            print_outcome(&outcome);
        }
        Commands::Parse {
            before,
            after,
            save,
        } => {
            let before_text = fs::read_to_string(&before)?;
            let after_text = fs::read_to_string(&after)?;
            let store = if save {
                Some(SqliteDeliveryStore::new(&cfg.db_path)?)
            } else {
                None
            };

            let outcome = pipeline::process_texts(
                store.as_ref().map(|s| s as &dyn DeliveryStore),
                &before_text,
                &after_text,
                &cfg.parse,
                OffsetDateTime::now_utc(),
            );
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Stats { json } => {
            let store = SqliteDeliveryStore::new(&cfg.db_path)?;
            let history = store.read_all()?;
            info!(records = history.len(), "Loaded delivery history");

            let dashboard = aggregate::dashboard(&history, &cfg.aggregate);
            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print_dashboard(&dashboard, cfg.aggregate.cost_per_mile);
            }
        }
        Commands::History => {
            let store = SqliteDeliveryStore::new(&cfg.db_path)?;
            for (i, r) in store.read_all()?.iter().enumerate() {
                println!(
                    "{:>4}  {}  ${:>7.2}  {:>6.2} mi  expected {:>2} min  actual {:>2} min",
                    i + 1,
                    r.created_at.date(),
                    r.money,
                    r.miles,
                    r.expected_minutes,
                    r.actual_minutes
                );
            }
        }
    }

    Ok(())
}

fn print_outcome(outcome: &DeliveryOutcome) {
    match &outcome.status {
        RecordStatus::InsufficientData { missing } => {
            let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
            println!(
                "Could not read required fields ({}), please retry with clearer screenshots.",
                names.join(", ")
            );
            return;
        }
        RecordStatus::SaveFailed { error, .. } => {
            println!("Warning: delivery could not be saved: {error}");
        }
        RecordStatus::Saved { id, .. } => println!("Saved delivery #{id}"),
        RecordStatus::Unsaved { .. } => {}
    }

    if let Some(r) = outcome.status.record() {
        println!("Money Earned:            ${:.2}", r.money);
        println!("Expected Delivery Time:  {} minutes", r.expected_minutes);
        println!("Actual Delivery Time:    {} minutes", r.actual_minutes);
        println!("Miles:                   {:.1} mi", r.miles);
    }
}

fn print_dashboard(dashboard: &Dashboard, cost_per_mile: f64) {
    let s = &dashboard.summary;
    println!("Deliveries:                 {}", s.count);
    println!("Dollars per Hour:           ${:.2}", s.dollars_per_hour);
    println!("Total Miles:                {:.2} mi", s.total_miles);
    println!(
        "Total Profit (after ${cost_per_mile}/mi): ${:.2}",
        s.total_profit
    );
    println!("Avg Time Difference:        {:.2} mins", s.avg_time_difference);

    println!();
    println!("   #   expected  actual   $/min");
    for p in &dashboard.points {
        let efficiency = p
            .efficiency
            .map_or_else(|| "undefined".to_string(), |e| format!("{e:.2}"));
        println!(
            "{:>4}   {:>6}   {:>6}   {efficiency}",
            p.index, p.expected_minutes, p.actual_minutes
        );
    }

    if !dashboard.rolling.is_empty() {
        println!();
        println!("Rolling $/hour (last {}):", dashboard.rolling_window);
        for p in &dashboard.rolling {
            println!("{:>4}   ${:.2}", p.index, p.dollars_per_hour);
        }
    }
}
