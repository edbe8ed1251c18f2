//! tessera: command-line front end for tessera crypto contexts.
//!
//! Contexts are declared in a TOML file (see [`config`]) and addressed by
//! identity:
//!
//! ```text
//! tessera --config tessera.toml encrypt --context server --in msg.txt --out msg.json
//! tessera --config tessera.toml verify  --context server --in msg.txt --signature msg.sig
//! tessera inspect --in msg.json
//! ```

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use crate::commands::Command;
use crate::config::CliConfig;

#[derive(Debug, Parser)]
#[command(name = "tessera", version, about = "Encrypt, sign and inspect tessera envelopes")]
struct Cli {
    /// Configuration file. Missing files fall back to defaults.
    #[arg(long, short, default_value = "tessera.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let config = CliConfig::load(&cli.config)?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tessera={}", config.logging.level).parse()?),
        )
        .init();

    debug!(
        config = %cli.config.display(),
        contexts = config.contexts.len(),
        "Configuration loaded"
    );

    if commands::run(cli.command, &config).await? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
