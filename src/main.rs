//! Salescrub CLI - Clean sales exports and report KPIs
//!
//! ```bash
//! salescrub --input sales.txt --report report.json
//! ```
//!
//! Reads a pipe-delimited sales export, prints a three-line cleaning summary
//! to stdout, and writes the full JSON report to the given path. Progress
//! messages go to stderr.
//!
//! Set `PRODUCT_CATALOG_URL` to point product lookups at a different catalog
//! endpoint, and `RUST_LOG` to raise log verbosity.

use clap::Parser;
use salescrub::{print_summary, process_file, write_json_report, HttpProductCatalog};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "salescrub")]
#[command(about = "Clean pipe-delimited sales exports and report KPIs", long_about = None)]
struct Cli {
    /// Input sales file (pipe-delimited, one transaction per line)
    #[arg(long)]
    input: PathBuf,

    /// Output path for the JSON report
    #[arg(long)]
    report: PathBuf,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    // Logging goes to stderr; stdout carries only the summary lines
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli).await {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", cli.input.display());

    let catalog = HttpProductCatalog::from_env();
    let report = process_file(&cli.input, &catalog).await?;

    print_summary(&report.validation);

    write_json_report(&report, &cli.report)?;
    eprintln!("💾 Report written to: {}", cli.report.display());

    Ok(())
}
