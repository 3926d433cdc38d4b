use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface of the `recall` binary.
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(version)]
#[command(about = "Periodic screen capture with searchable OCR descriptions and rolling retention")]
pub struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding snapshots and settings, overrides `data_dir`
    #[arg(long, global = true, env = "RECALL_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Port of the web interface, overrides `web.port`
    #[arg(long, global = true)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Serve the web interface and host the capture loop
    Serve {
        /// Start capturing as soon as the server is up
        #[arg(long)]
        autostart: bool,
    },
    /// Capture in the foreground until stopped or interrupted
    Run,
    /// Ask the running capture loop to stop
    Stop,
    /// Print the run flag, capacity and artifact count
    Status,
    /// List captured artifacts, oldest first
    List,
    /// Print the artifacts whose description contains a query
    Search {
        query: String,
        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,
    },
    /// Print the description of one artifact
    Describe { id: String },
    /// Change how many artifacts are retained
    SetCapacity { capacity: usize },
    /// Remove description records whose artifact is gone
    Reconcile,
}
