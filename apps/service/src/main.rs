mod config;
mod database;
mod monitoring;
mod orchestrator;
mod pool;
#[cfg(test)]
mod testutil;
mod validation;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use crate::orchestrator::Orchestrator;

#[derive(Parser)]
#[command(name = "vigil-service", version, about = "Service uptime monitoring daemon")]
struct Args {
    /// Path to the TOML config file (default: ~/.config/vigil/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the database path from the config file
    #[arg(long)]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logger::tracing::init();

    let args = Args::parse();
    let mut config = config::Config::from_config(args.config.as_ref())?;
    if let Some(path) = args.database {
        config.database.path = path.to_string_lossy().into_owned();
    }
    debug!("{config}");

    let db = libsql::Builder::new_local(&config.database.path).build().await?;
    let pool = deadpool::managed::Pool::builder(pool::LibsqlManager::new(db)).build()?;

    Orchestrator::start(config, pool).await
}
