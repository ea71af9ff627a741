use std::path::PathBuf;

use clap::Parser;

/// Looking-glass daemon: runs whitelisted network diagnostics and streams their output.
#[derive(Debug, Parser)]
#[command(name = "glassd", version, about)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "config.yaml")]
    pub config: PathBuf,

    /// Override `listen.log_level` from the configuration.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Validate the configuration and exit.
    #[arg(long)]
    pub check: bool,
}
