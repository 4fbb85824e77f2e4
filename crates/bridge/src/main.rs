//! ttybridge
//!
//! Runs a command inside a pseudo-terminal and bridges it to a framed
//! control protocol on stdin, with raw terminal output on stdout.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use bridge::config::Config;
use bridge::pty::PtyChild;

/// Run a command inside a pty, driven by a framed control stream.
///
/// Standard input carries binary control frames (write/signal/resize);
/// standard output is the child's raw terminal byte stream. Diagnostics
/// go to standard error.
#[derive(Parser, Debug)]
#[command(name = "ttybridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Initial terminal height in rows
    #[arg(long)]
    pub rows: Option<u16>,

    /// Initial terminal width in columns
    #[arg(long)]
    pub cols: Option<u16>,

    /// Command to run inside the pty, followed by its arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };
    config.apply_env_overrides();
    config.validate()?;

    // stdout belongs to the child's terminal stream; diagnostics must go
    // to stderr.
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.log_level.0.clone()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let rows = cli.rows.unwrap_or(config.terminal.rows);
    let cols = cli.cols.unwrap_or(config.terminal.cols);

    let (program, args) = cli
        .command
        .split_first()
        .context("no command to run")?;

    tracing::info!(program = %program, rows = rows, cols = cols, "starting bridge");

    let child = PtyChild::spawn(program, args, rows, cols)?;
    let events = child.start_output_task()?;

    let code = bridge::bridge::run(
        child,
        events,
        tokio::io::stdin(),
        tokio::io::stdout(),
        config.control.max_buffer_bytes,
    )
    .await?;

    std::process::exit(code);
}
