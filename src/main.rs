// src/main.rs — hotloop entry point

use clap::Parser;

use hotloop::cli::watch::WatchOptions;
use hotloop::cli::{Cli, Commands};
use hotloop::infra::config::Config;
use hotloop::infra::logger;

// The loop session and the code cache are single-threaded (Rc-based), so
// the runtime is too.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging (respects HOTLOOP_LOG / RUST_LOG)
    logger::init_logging(&cli.log_level);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    match cli.command {
        Commands::Run { script, env, runs } => {
            hotloop::cli::run::run_script(&script, env.as_deref(), runs, &config)
        }
        Commands::Watch {
            resource,
            method,
            interval_ms,
            roots,
            times,
        } => {
            let opts = WatchOptions::resolve(resource, method, interval_ms, roots, times, &config);
            hotloop::cli::watch::run_watch(opts, &config).await
        }
        Commands::Check { files } => hotloop::cli::check::run_check(&files, &config),
    }
}
