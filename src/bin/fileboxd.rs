use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

use filebox::cli::DaemonOpts;
use filebox::logger::{Logger, StderrLogger, TextLogger};
use filebox::router::Router;
use filebox::server::Dispatcher;
use filebox::storage::Storage;

fn main() -> Result<()> {
    let opts = DaemonOpts::parse();

    let storage = Storage::open(&opts.root)
        .with_context(|| format!("failed to open storage root: {}", opts.root.display()))?;

    println!("Starting filebox daemon:");
    println!("  Root: {}", storage.root().display());
    println!("  Bind: {}", opts.bind);

    if opts.bind.starts_with("0.0.0.0") {
        eprintln!("WARNING: binding to 0.0.0.0 exposes the daemon to all interfaces");
        eprintln!("         this protocol is unencrypted and unauthenticated");
        eprintln!("         only use on trusted networks (LAN)");
    }

    let logger: Arc<dyn Logger> = match &opts.log_file {
        Some(path) => Arc::new(
            TextLogger::new(path)
                .with_context(|| format!("failed to open log file: {}", path.display()))?,
        ),
        None => Arc::new(StderrLogger),
    };

    let shutdown_logger = Arc::clone(&logger);
    ctrlc::set_handler(move || {
        shutdown_logger.shutdown();
        std::process::exit(0);
    })
    .context("failed to install signal handler")?;

    let router = Arc::new(Router::new(Arc::new(storage)));
    Dispatcher::new(router, logger).serve(&opts.bind)
}
