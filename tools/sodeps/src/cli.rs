//! Command-line interface definitions for sodeps.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Safe preload-order resolver for ELF32 shared objects.
#[derive(Parser)]
#[command(name = "sodeps", version, about)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Suppress progress output; show only the result and errors.
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output with per-object progress and timing.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Command {
    /// Resolve one object and print its dependencies in preload order.
    List(ListArgs),
    /// Resolve every object in a directory and print the merged order.
    Scan(ScanArgs),
    /// Print the decoded header, segments, and dynamic table of an object.
    Dump(DumpArgs),
}

/// Arguments for the `list` subcommand.
#[derive(Parser)]
pub struct ListArgs {
    /// Path to the ELF object to resolve.
    pub object: PathBuf,

    /// Directory NEEDED names are resolved against (default: the object's
    /// parent directory).
    #[arg(long)]
    pub search_dir: Option<PathBuf>,

    /// Extra library name treated as a known system library (repeatable).
    #[arg(long = "system-lib", value_name = "NAME")]
    pub system_lib: Vec<String>,
}

/// Arguments for the `scan` subcommand.
#[derive(Parser)]
pub struct ScanArgs {
    /// Directory whose direct children are resolved as independent roots;
    /// also used as the search directory.
    pub dir: PathBuf,

    /// Extra library name treated as a known system library (repeatable).
    #[arg(long = "system-lib", value_name = "NAME")]
    pub system_lib: Vec<String>,
}

/// Arguments for the `dump` subcommand.
#[derive(Parser)]
pub struct DumpArgs {
    /// Path to the ELF object to dump.
    pub object: PathBuf,
}
