use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sheet_invest::api::{SheetSource, SheetsClient};
use sheet_invest::calculator::Calculator;
use sheet_invest::models::{split_list, Allocation, Config};
use sheet_invest::snapshot::SnapshotBuilder;

/// Pull investment tracking columns from a spreadsheet and work out how much to buy
#[derive(Parser)]
#[command(name = "sheet-invest")]
#[command(version = "0.1.0")]
#[command(about = "Calculate amount to invest based on what you are willing to invest")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the configured columns and overwrite the local snapshot
    Snapshot {
        /// Sheet tab to read from (defaults to SHEET_TAB)
        #[arg(long, short = 't')]
        tab: Option<String>,

        /// Column letters to fetch in addition to A, B and C, e.g. "D,E,F"
        #[arg(long, short = 'c')]
        columns: Option<String>,
    },

    /// Compute the amount to buy for a date from the local snapshot
    Calc {
        /// Amount that you are willing to invest
        #[arg(long, short = 'a')]
        amount: Option<i64>,

        /// Date you would like to use, MM/DD/YYYY (Default = Today's Date)
        #[arg(long, short = 'd')]
        date: Option<String>,
    },

    /// Print the raw rows of an A1 range, e.g. "P1:P12"
    Range {
        range: String,
    },
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sheet_invest=info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()
        .context("Make sure you have a .env file with SPREADSHEET_ID set")?;

    match cli.command {
        Command::Snapshot { tab, columns } => {
            let tab = tab.unwrap_or_else(|| config.sheet_tab.clone());
            let columns = columns
                .map(|raw| split_list(&raw))
                .unwrap_or_else(|| config.snapshot_columns.clone());

            let client = SheetsClient::from_config(&config)?;
            let builder = SnapshotBuilder::new(client);
            let table = builder
                .build_and_save(&columns, &tab, &config.snapshot_path)
                .await?;

            println!(
                "✅ Saved {} rows x {} fields to {}",
                table.len(),
                table.headers().len(),
                config.snapshot_path.display()
            );
        }
        Command::Calc { amount, date } => {
            let calculator = Calculator::new(&config);
            let allocation = calculator.compute(date.as_deref())?;
            print_allocation(&allocation, amount);
        }
        Command::Range { range } => {
            let client = SheetsClient::from_config(&config)?;
            let rows = client.fetch(&range).await?;
            if rows.is_empty() {
                println!("No data found.");
            } else {
                info!("Fetched {} rows from {}", rows.len(), range);
                for row in rows {
                    println!("{}", row.join("\t"));
                }
            }
        }
    }

    Ok(())
}

fn print_allocation(allocation: &Allocation, amount: Option<i64>) {
    println!("📅 Date:           {}", allocation.date);
    println!("Potential_Inv:     ${:.2}", allocation.potential_inv);
    println!("AcumEarned:        ${:.2}", allocation.acum_earned);
    println!("AvgRcrds:          {:.1}%", allocation.avg_records * 100.0);
    println!("Playing:           ${:.2}", allocation.playing);
    println!("Great total:       ${:.2}", allocation.great_total);
    println!("To play:           ${:.2}", allocation.to_play);
    if let Some(amount) = amount {
        println!("Willing to invest: ${}", amount);
    }
    println!("💰 To buy:         ${:.2}", allocation.to_buy);
}
