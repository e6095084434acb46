use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reddit_daily::app::{AppContext, RunOptions};
use reddit_daily::cli::{commands, Cli, Commands};
use reddit_daily::config::Config;
use reddit_daily::daemon::{Daemon, DaemonConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let mut options = RunOptions {
        workers: cli.workers,
        ..Default::default()
    };

    match cli.command {
        Commands::Run {
            run_id,
            dry_run,
            forums,
        } => {
            options.dry_run = dry_run;
            options.forums = forums;
            let ctx = AppContext::new(config, &options)?;
            let outcome = commands::run_once(&ctx, run_id).await?;
            if outcome.has_failures() {
                return Err(anyhow!("run {} finished with failures", outcome.run_id));
            }
        }
        Commands::List => {
            let ctx = AppContext::new(config, &options)?;
            commands::list_forums(&ctx).await?;
        }
        Commands::Preview { forum, output } => {
            let ctx = AppContext::new(config, &options)?;
            commands::preview(&ctx, &forum, output.as_deref()).await?;
        }
        Commands::Daemon {
            interval,
            no_initial_run,
            dry_run,
        } => {
            options.dry_run = dry_run;
            let interval_secs = DaemonConfig::parse_interval(&interval).map_err(|e| anyhow!(e))?;
            let ctx = Arc::new(AppContext::new(config, &options)?);
            let daemon = Daemon::new(
                ctx,
                DaemonConfig {
                    interval_secs,
                    run_on_start: !no_initial_run,
                },
            );
            daemon.run().await?;
        }
    }

    Ok(())
}
