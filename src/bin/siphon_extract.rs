//! siphon-extract: Build per-table keyset files from the source application
//!
//! Fetches every configured table, classifies the localizable strings in
//! each record, and writes one `<table>.json` keyset file per table into
//! the working directory.
//!
//! Usage:
//!   # Defaults (local source application, ./files working directory)
//!   siphon-extract
//!
//!   # With a config file
//!   siphon-extract --config siphon.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::Parser;
use siphon::{pipeline, Config, HttpClient};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "siphon-extract")]
#[command(about = "Extract localizable text into per-table keyset files", long_about = None)]
struct Args {
    /// JSON config file (defaults apply if omitted)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the working directory for keyset files
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
    pipeline::run_extract(&config, &client)?;
    Ok(())
}
