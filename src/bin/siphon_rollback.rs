//! siphon-rollback: Delete the records a migration run created
//!
//! Reads each table's `<table>-new-ids.txt` ledger and deletes exactly
//! those record ids from the source application, with the downstream
//! caches frozen for the duration.
//!
//! Usage:
//!   siphon-rollback
//!   siphon-rollback --config siphon.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::Parser;
use siphon::{pipeline, Config, HttpClient};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "siphon-rollback")]
#[command(about = "Delete the records listed in the migration ledgers", long_about = None)]
struct Args {
    /// JSON config file (defaults apply if omitted)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the working directory holding ledger files
    #[arg(long)]
    work_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = args.work_dir {
        config.work_dir = dir;
    }

    let client = HttpClient::new(&config);
    pipeline::run_rollback(&config, &client, &client)?;
    Ok(())
}
