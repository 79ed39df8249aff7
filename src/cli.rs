//! Command-line surface.
//!
//! Only the flags below reach clap. Anything else is set aside so the run
//! can warn about it and carry on.

use clap::Parser;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

const AFTER_HELP: &str = "\
Output files (relative to the project root, see mcp-sync.toml):
  libs/aegisx-mcp/src/data/components.ts     UI component metadata
  libs/aegisx-mcp/src/data/crud-commands.ts  CLI command metadata
  libs/aegisx-mcp/src/data/patterns.ts       Code pattern metadata

Examples:
  mcp-sync                   Regenerate every data module
  mcp-sync --dry-run         Preview what would be generated
  mcp-sync -d -v             Preview with per-file progress and diffs

Set RUST_LOG to override the log filter.";

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "mcp-sync",
    version,
    about = "Synchronize component, command and pattern metadata into the MCP data modules",
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Preview changes without writing files
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Show detailed progress and debug information
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

const KNOWN_LONG: &[&str] = &["--dry-run", "--verbose", "--help", "--version"];
const KNOWN_SHORT: &[char] = &['d', 'v', 'h', 'V'];

/// Split `args` (program name first) into what clap understands and the
/// rest.
pub fn partition_args<I>(args: I) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut known: Vec<String> = args.next().into_iter().collect();
    let mut unknown = Vec::new();
    for arg in args {
        if is_known(&arg) {
            known.push(arg);
        } else {
            unknown.push(arg);
        }
    }
    (known, unknown)
}

fn is_known(arg: &str) -> bool {
    if KNOWN_LONG.contains(&arg) {
        return true;
    }
    match arg.strip_prefix('-') {
        Some(cluster) if !cluster.is_empty() && !cluster.starts_with('-') => {
            cluster.chars().all(|c| KNOWN_SHORT.contains(&c))
        }
        _ => false,
    }
}

/// Run `f`, turning a panic into its message.
pub fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
