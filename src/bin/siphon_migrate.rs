//! siphon-migrate: Rewrite and re-upload every record with synthetic keys
//!
//! Disables the downstream caches, fetches each configured table, rewrites
//! each record so its localizable text fields carry translation lookup
//! keys, re-uploads the rewritten records, and writes the ids the
//! application assigned to a per-table ledger file. The caches are
//! re-enabled on every exit path.
//!
//! Usage:
//!   siphon-migrate
//!   siphon-migrate --config siphon.json

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::Parser;
use siphon::{pipeline, Config, HttpClient};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "siphon-migrate")]
#[command(about = "Re-upload records with text replaced by translation keys", long_about = None)]
struct Args {
    /// JSON config file (defaults apply if omitted)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Override the working directory for ledger files
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
    pipeline::run_migrate(&config, &client, &client)?;
    Ok(())
}
