//! CLI argument types shared by the harness binaries.
//!
//! Arguments stay deliberately thin: everything beyond file paths and the
//! run-folder selector lives in the layered configuration (`config`).

use clap::Parser;
use std::path::PathBuf;

/// Arguments for the batch-inference binary.
#[derive(Debug, Parser)]
#[command(
    name = "sentibench",
    about = "Run batch sentiment inference over the test set and persist the run"
)]
pub struct PredictArgs {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "sentibench.toml")]
    pub config_path: PathBuf,
}

/// Arguments for the run-reporting binary.
#[derive(Debug, Parser)]
#[command(
    name = "sentibench-report",
    about = "Compute metrics for a persisted run and log them to the tracker"
)]
pub struct ReportArgs {
    /// Run directory beneath the runs root, e.g. "zero-shot" or
    /// "zero-shot/20250801-101500".
    #[arg(long)]
    pub model_name_folder: String,

    /// Path to the TOML configuration file.
    #[arg(long, default_value = "sentibench.toml")]
    pub config_path: PathBuf,
}

/// Arguments for the HTTP front end.
#[derive(Debug, Parser)]
#[command(name = "sentibench-serve", about = "Serve the sentiment prediction endpoint")]
pub struct ServeArgs {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "sentibench.toml")]
    pub config_path: PathBuf,

    /// Listen address override, e.g. "0.0.0.0:8000".
    #[arg(long)]
    pub listen_addr: Option<String>,
}

/// Initialise the fmt subscriber, honouring `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
