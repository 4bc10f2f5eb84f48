//! siphon-push: Submit keyset files to the third-party translation system
//!
//! Reads every `.json` keyset file in the working directory and posts its
//! key/text pairs in bounded chunks, prefixing the keyset name so runs
//! stay distinguishable on the third-party side.
//!
//! Usage:
//!   siphon-push
//!   siphon-push --config siphon.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::Parser;
use siphon::{pipeline, Config, HttpClient};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "siphon-push")]
#[command(about = "Push keyset files to the translation system in chunks", long_about = None)]
struct Args {
    /// JSON config file (defaults apply if omitted)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the working directory holding keyset files
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
    pipeline::run_push(&config, &client)?;
    Ok(())
}
