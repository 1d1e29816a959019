//! `tankobon` command-line front-end.

mod cli;
mod commands;
mod error;

use std::process::ExitCode;

use clap::Parser;
use exn::ResultExt;
use tankobon_archive::CancellationToken;
use tankobon_config::Config;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::Runner;
use crate::error::{ErrorKind, Result};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            eprintln!("{err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if let Some(root) = cli.root {
        config.root = root;
    }
    config.dry_run |= cli.dry_run;
    init_logging(&config.log, cli.verbose);

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, abandoning changes");
            interrupt.cancel();
        }
    });

    let runner = Runner::new(config, cancel.clone())?;
    let result = runner.run(cli.command).await;
    if cancel.is_cancelled() {
        return result.or_raise(|| ErrorKind::Interrupted);
    }
    result
}

/// `RUST_LOG` wins; otherwise `-v` raises the configured level.
fn init_logging(default: &str, verbose: u8) {
    let directive = match verbose {
        0 => default,
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
