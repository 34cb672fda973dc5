//! Serves the tournament api, or runs one pipeline operation against a
//! database from the command line.

use std::{path::PathBuf, process::ExitCode};

use clap::{ArgAction, Parser, Subcommand};
use kegler::{
    config::{Config, ConfigError, create_app},
    state::{make_pool, run_migrations},
    store::StoreError,
    tournaments::save::{SaveError, delete_all_data_for_tmnt},
};
use thiserror::Error;
use tokio::{net::TcpListener, task::spawn_blocking};
use tracing::Level;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// TOML file to read settings from.
    #[arg(long, short)]
    config: Option<PathBuf>,
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
    /// Log more (repeat for more still).
    #[arg(long, short, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the JSON api.
    Serve {
        #[arg(long, env = "KEGLER_ADDR")]
        addr: Option<String>,
    },
    /// Delete a tournament and everything saved under it.
    DeleteTmnt { tmnt_id: String },
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("worker thread failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "exiting");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    let pool = make_pool(&config.database_url)?;
    let migrate = pool.clone();
    spawn_blocking(move || run_migrations(&migrate)).await??;

    match cli.command {
        Command::Serve { addr } => {
            let addr = addr.unwrap_or(config.addr);
            let listener = TcpListener::bind(&addr).await?;
            tracing::info!(%addr, "listening");
            axum::serve(listener, create_app(pool)).await?;
        }
        Command::DeleteTmnt { tmnt_id } => {
            let counts = spawn_blocking(move || -> Result<_, CliError> {
                let mut conn = pool.get().map_err(StoreError::from)?;
                Ok(delete_all_data_for_tmnt(&mut *conn, &tmnt_id)?)
            })
            .await??;
            println!("{}", serde_json::to_string_pretty(&counts)?);
        }
    }
    Ok(())
}
