//! Signer agent - gates wallet access and brokers session connect requests.

mod app;
mod clipboard;
mod console;
mod loopback;

use std::path::PathBuf;

use agent_config_and_utils::{init_logging, Config, Paths};
use clap::{Parser, Subcommand};

/// Signer agent command-line interface.
#[derive(Parser)]
#[command(name = "signer-agent")]
#[command(about = "Desktop signing agent: unlock, approvals and session connects")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (config, secrets, logs). Defaults to ~/.signer-agent
    #[arg(long, global = true, env = "SIGNER_AGENT_BASE_DIR")]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent with a console presentation surface
    Run {
        /// Deliver this link as an inbound link right after start
        #[arg(long)]
        link: Option<String>,

        /// Use an in-process clipboard instead of the system clipboard
        #[arg(long)]
        memory_clipboard: bool,
    },
    /// Show whether an app password is set
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);

    match cli.command {
        Some(Commands::Run {
            link,
            memory_clipboard,
        }) => {
            init_logging(level, &paths)?;
            app::run_agent(config, paths, link, memory_clipboard).await?;
        }
        None => {
            init_logging(level, &paths)?;
            app::run_agent(config, paths, None, false).await?;
        }
        Some(Commands::Status) => {
            app::check_status(&config, &paths)?;
        }
    }

    Ok(())
}
