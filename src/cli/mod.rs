// src/cli/mod.rs — CLI definition (clap derive)

pub mod check;
pub mod run;
pub mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "hotloop",
    about = "Re-run a script against a one-time setup, and hot-reload script units",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log level when HOTLOOP_LOG / RUST_LOG are unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a script in the exploratory loop
    Run {
        /// Script to evaluate on every iteration
        script: PathBuf,
        /// JSON object to use as the environment instead of the script's setup
        #[arg(long)]
        env: Option<PathBuf>,
        /// Run this many iterations without prompting, then exit
        #[arg(long)]
        runs: Option<u64>,
    },
    /// Poll a unit, reloading it when its source changes, and call a method on it
    Watch {
        /// Resource id, resolved against the search roots
        resource: String,
        /// Method to call on every poll (default from config: "run")
        #[arg(short, long)]
        method: Option<String>,
        /// Poll interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Search root (repeatable; replaces the configured roots)
        #[arg(long = "root")]
        roots: Vec<PathBuf>,
        /// Stop after this many polls
        #[arg(long)]
        times: Option<u64>,
    },
    /// Compile scripts without running them
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}
