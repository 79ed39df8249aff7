//! mcp-sync: synchronize component, command and pattern metadata from
//! source files into the TypeScript data modules read by the MCP server.
//!
//! - `mcp-sync` regenerates every module under the project root
//! - `mcp-sync --dry-run` previews without writing
//! - `mcp-sync --verbose` logs per-file progress to stderr

use anyhow::{Context, Result};
use clap::Parser;
use mcp_sync::cli::{self, Cli};
use mcp_sync::config::{self, SyncConfig};
use mcp_sync::pipeline::{self, SyncOptions};
use mcp_sync::report::SyncReport;
use std::env;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = env::args_os().map(|a| a.to_string_lossy().into_owned());
    let (known, unknown) = cli::partition_args(args);

    let cli = match Cli::try_parse_from(known) {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    match cli::catch_panic(|| sync(&cli, unknown)) {
        Ok(Ok(report)) => {
            print!("{}", report.render());
            if report.has_errors() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Ok(Err(err)) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
        Err(message) => {
            eprintln!("error: unexpected failure: {message}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "mcp_sync=debug,warn" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn sync(cli: &Cli, unknown_args: Vec<String>) -> Result<SyncReport> {
    let cwd = env::current_dir().context("failed to read the working directory")?;
    let root = config::find_project_root(&cwd).with_context(|| {
        format!(
            "no project root found from {} (looked for {} or pnpm-workspace.yaml)",
            cwd.display(),
            config::CONFIG_FILE
        )
    })?;
    debug!("project root: {}", root.display());
    let config = SyncConfig::load(&root)?;

    let options = SyncOptions {
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        unknown_args,
    };
    Ok(pipeline::run(&root, &config, &options))
}
