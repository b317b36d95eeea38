use std::path::PathBuf;

use clap::Parser;

use ds_core::services::config_loader::DEFAULT_CONFIG_FILENAME;

/// Keep the desired state store in line with the application registry.
#[derive(Debug, Parser)]
#[command(name = "ds-sync")]
#[command(version, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "DS_SYNC_CONFIG", default_value = DEFAULT_CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Run a single pass, print its report, and exit
    #[arg(long)]
    pub once: bool,

    /// Print the single-pass report as JSON instead of text
    #[arg(long, requires = "once")]
    pub json: bool,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, env = "DS_SYNC_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "debug"
        } else {
            "info"
        }
    }
}
