//! cxone-export - Main entry point
//!
//! One-shot batch run: authenticate, traverse projects → scans → results,
//! export the flattened rows to xlsx and csv in the working directory.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cxone_export::cli::Cli;
use cxone_export::{collect_all_vulnerabilities, export_report, AstApiClient, Config, ExportError};

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: failed to load .env file: {}", e);
        }
    }

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    std::process::exit(match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!(error = %e, "export run failed");
            1
        }
    });
}

async fn run(cli: Cli) -> Result<(), ExportError> {
    let mut config = Config::load()?;
    cli.apply_to(&mut config);
    config.validate()?;

    let client = AstApiClient::new(&config)?;
    let rows = collect_all_vulnerabilities(&client).await?;

    match export_report(&rows, &config.output)? {
        Some(files) => {
            tracing::info!(excel = %files.excel.display(), csv = %files.csv.display(), "export complete");
            println!("Excel written: {}", files.excel.display());
            println!("CSV written:   {}", files.csv.display());
        }
        None => {
            println!("No vulnerabilities found.");
        }
    }

    Ok(())
}

/// Initialize tracing/logging for the CLI
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,cxone_export=debug"
    } else {
        "warn,cxone_export=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
