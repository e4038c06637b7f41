use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use s3_explorer::app::App;
use s3_explorer::aws::{S3Service, Storage};
use s3_explorer::cli::Cli;
use s3_explorer::config::Config;
use s3_explorer::error::{EXIT_FAILED, EXIT_FAILED_BUCKET_LISTING, EXIT_FAILED_NO_TERMINAL};
use s3_explorer::{logging, tui};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(EXIT_FAILED)
        }
    }
}

async fn run() -> Result<u8> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    logging::init(&config.log_path(), &cli.log_level)?;
    info!(?config, "starting");

    let s3 = S3Service::new(&config).await?;

    let mut terminal = match tui::init() {
        Ok(terminal) => terminal,
        Err(err) => {
            error!("failed to acquire terminal: {err:#}");
            println!("Error: {err:#}");
            return Ok(EXIT_FAILED_NO_TERMINAL);
        }
    };

    let buckets = match s3.list_buckets().await {
        Ok(buckets) => buckets,
        Err(err) => {
            tui::restore(&mut terminal)?;
            error!("initial bucket listing failed: {err:#}");
            println!("Error: {err:#}");
            return Ok(EXIT_FAILED_BUCKET_LISTING);
        }
    };

    let mut app = App::new(buckets, config.error_display());
    let result = tui::run(&mut terminal, &mut app, &s3, &config).await;
    tui::restore(&mut terminal)?;
    result?;
    info!("exiting");
    Ok(0)
}
