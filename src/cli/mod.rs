pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reddit-daily")]
#[command(about = "Email the top posts of the day from your subscribed subreddits", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/reddit-daily/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of forums processed concurrently
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline once and exit
    Run {
        /// Identifier used in the failure notification
        #[arg(long)]
        run_id: Option<String>,

        /// Render everything but don't send email
        #[arg(long)]
        dry_run: bool,

        /// Process these forums instead of the account's subscriptions
        #[arg(short, long = "forum")]
        forums: Vec<String>,
    },
    /// List the forums the account follows
    List,
    /// Render one forum's email without sending it
    Preview {
        /// Forum display name, e.g. `rust`
        forum: String,

        /// Write the HTML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Repeat runs on a fixed interval until interrupted
    Daemon {
        /// Interval between runs (e.g., "1d", "12h", "30m")
        #[arg(short, long, default_value = "1d")]
        interval: String,

        /// Skip the run on start
        #[arg(long)]
        no_initial_run: bool,

        /// Render everything but don't send email
        #[arg(long)]
        dry_run: bool,
    },
}
