use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use property_series_loader::config::Config;
use property_series_loader::importers::{Record, SheetLayout, XlsImporter};
use property_series_loader::services::{UploadMode, UploadService};
use property_series_loader::store::TableClient;

#[derive(Parser)]
#[command(name = "property-series-loader")]
#[command(about = "Load historical private domestic price/rent series from the legacy workbook into the table store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract records and print the first few as JSON lines
    Preview {
        /// Path to the legacy .xls workbook
        #[arg(long, env = "SOURCE_FILE", default_value = "./data/His Data.xls")]
        file: PathBuf,

        /// Number of records to print
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Extract records and upload them
    Load {
        /// Target table
        #[arg(long, value_enum)]
        table: TargetTable,

        /// Path to the legacy .xls workbook (overrides SOURCE_FILE)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Rows per insert call (overrides UPLOAD_BATCH_SIZE)
        #[arg(long, conflicts_with = "test_rows")]
        batch_size: Option<usize>,

        /// Upload only this many rows in a single call (overrides UPLOAD_TEST_ROWS)
        #[arg(long)]
        test_rows: Option<usize>,

        /// Delete all existing rows from the table before uploading
        #[arg(long)]
        clear_first: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Delete every row from a table
    Clear {
        /// Target table
        #[arg(long, value_enum)]
        table: TargetTable,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetTable {
    Prices,
    Rents,
}

impl TargetTable {
    fn name(self, config: &Config) -> &str {
        match self {
            TargetTable::Prices => &config.prices_table,
            TargetTable::Rents => &config.rents_table,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if it exists (ignore errors if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,property_series_loader=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Preview { file, limit } => {
            let records = extract_records(file).await?;
            preview(&records, limit)?;
        }
        Command::Load {
            table,
            file,
            batch_size,
            test_rows,
            clear_first,
            yes,
        } => {
            let mut config = Config::from_env()?;
            if let Some(file) = file {
                config.source_file = file;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
                config.test_rows = 0;
            }
            if let Some(test_rows) = test_rows {
                config.test_rows = test_rows;
            }
            load(&config, table, clear_first, yes).await?;
        }
        Command::Clear { table, yes } => {
            let config = Config::from_env()?;
            let service = UploadService::new(table_client(&config));
            let table_name = table.name(&config);

            if !yes && !confirm(&format!("This will delete ALL rows from '{table_name}'."))? {
                println!("Clear cancelled.");
                return Ok(());
            }
            let deleted = service.clear_table(table_name).await?;
            println!("✓ {deleted} rows deleted from '{table_name}'");
        }
    }

    info!("Done");
    Ok(())
}

fn table_client(config: &Config) -> TableClient {
    TableClient::new(&config.supabase_url, &config.supabase_key)
}

async fn extract_records(file: PathBuf) -> Result<Vec<Record>, Box<dyn std::error::Error>> {
    if !file.exists() {
        error!("File not found: {file:?}");
        return Err(format!("File not found: {file:?}").into());
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Parsing {}...", file.display()));

    // calamine is synchronous
    let records = tokio::task::spawn_blocking(move || {
        XlsImporter::new(file).parse(&SheetLayout::HISTORICAL)
    })
    .await??;

    pb.finish_with_message(format!("✓ Extracted {} records", records.len()));
    Ok(records)
}

fn preview(records: &[Record], limit: usize) -> Result<(), Box<dyn std::error::Error>> {
    for record in records.iter().take(limit) {
        println!("{}", serde_json::to_string(record)?);
    }

    let missing = records.iter().filter(|r| r.value.is_none()).count();
    let small_trade = records.iter().filter(|r| r.small_trade).count();
    let first = records.first().map(|r| format!("{}-{:02}", r.year, r.month));
    let last = records.last().map(|r| format!("{}-{:02}", r.year, r.month));

    println!("\n{}", "=".repeat(60));
    println!("Records:            {}", records.len());
    println!("Small-trade values: {small_trade}");
    println!("Missing values:     {missing}");
    println!(
        "Periods:            {} to {}",
        first.unwrap_or_else(|| "-".to_string()),
        last.unwrap_or_else(|| "-".to_string())
    );
    println!("{}", "=".repeat(60));
    Ok(())
}

async fn load(
    config: &Config,
    table: TargetTable,
    clear_first: bool,
    skip_confirmation: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start_time = Instant::now();
    let table_name = table.name(config);
    let mode = config.upload_mode();
    info!("Loading {:?} into '{}' ({:?})", config.source_file, table_name, mode);

    if !skip_confirmation {
        let mut prompt = format!(
            "This will upload records from {:?} into '{table_name}'.",
            config.source_file
        );
        if clear_first {
            prompt.push_str(" Existing rows will be DELETED first.");
        }
        if !confirm(&prompt)? {
            println!("Load cancelled.");
            return Ok(());
        }
    }

    let records = extract_records(config.source_file.clone()).await?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );
    let service = UploadService::new(table_client(config)).with_progress(pb);

    if clear_first {
        let deleted = service.clear_table(table_name).await?;
        println!("✓ {deleted} rows deleted from '{table_name}'");
    }

    let summary = service.upload_records(table_name, &records, mode).await?;

    println!("\n{}", "=".repeat(60));
    println!("Load Summary");
    println!("{}", "=".repeat(60));
    println!("Table:              {table_name}");
    println!("Rows uploaded:      {}", summary.rows_uploaded);
    println!("Insert calls:       {}", summary.batches);
    if let UploadMode::TestRows(_) = mode {
        println!("Mode:               test rows only");
    }
    println!("Total time:         {:.2}s", start_time.elapsed().as_secs_f64());
    println!("{}", "=".repeat(60));
    Ok(())
}

fn confirm(message: &str) -> std::io::Result<bool> {
    println!("\n⚠️  {message}");
    println!("\nContinue? [y/N]: ");

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
