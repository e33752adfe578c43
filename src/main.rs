//! fsx CLI - Virtual file system lưu trữ qua webhook
//!
//! Cây thư mục được lưu trong một drive file (snapshot) ở local,
//! nội dung file được chia thành chunks và đẩy lên webhook.

mod cli;
mod crypto;
mod error;
mod storage;
mod transport;

use clap::Parser;
use cli::session::{self, SessionConfig};
use cli::{Cli, Commands};
use colored::Colorize;
use std::process;

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), err);
        process::exit(err.exit_code());
    }
}

/// Logging ra stderr để stdout chỉ chứa bảng hoặc bytes được download
fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("fsx={}", log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> error::Result<()> {
    // Completions không đọc drive nên không cần --drive/--webhook
    if let Commands::Completions { shell } = cli.command {
        cli::commands::completions(shell, &mut std::io::stdout().lock());
        return Ok(());
    }

    let config = SessionConfig::resolve(&cli.drive)?;
    let session = session::open(&config)?;

    cli::commands::run(cli.command, session)?;
    Ok(())
}
