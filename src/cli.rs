//! Shared CLI helpers and small reusable Clap fragments

use clap::Parser;
use std::path::PathBuf;

/// Daemon options for fileboxd
#[derive(Clone, Debug, Parser)]
pub struct DaemonOpts {
    /// Bind address (host:port)
    #[arg(long, default_value = "0.0.0.0:7777")]
    pub bind: String,

    /// Storage directory served to clients (created if absent)
    #[arg(long, default_value = "files")]
    pub root: PathBuf,

    /// Write server events to this log file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Connection target for the interactive client
#[derive(Clone, Debug, Parser)]
pub struct ClientOpts {
    /// Server host
    #[arg(default_value = "127.0.0.1")]
    pub host: String,

    /// Server port
    #[arg(default_value_t = crate::protocol::DEFAULT_PORT)]
    pub port: u16,
}
