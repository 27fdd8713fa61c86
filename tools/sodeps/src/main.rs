//! sodeps: preload-order dependency resolver for ELF32 shared objects.
//!
//! Decodes the dynamic tables of shared objects and prints the order in
//! which they (and everything they transitively require) must be loaded
//! so that no object is loaded before its dependencies.

mod cli;
mod dump;
mod resolver;
mod verbose;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use sodeps_elf::ElfFile;

use cli::{Cli, Command, DumpArgs, ListArgs, ScanArgs};
use resolver::Resolver;
use verbose::Timer;

fn main() -> Result<()> {
    let cli = Cli::parse();
    verbose::init(cli.quiet, cli.verbose);

    match cli.command {
        Command::List(args) => cmd_list(args),
        Command::Scan(args) => cmd_scan(args),
        Command::Dump(args) => cmd_dump(&args),
    }
}

/// Resolve one object and print its preload order, one name per line.
fn cmd_list(args: ListArgs) -> Result<()> {
    let search_dir = args.search_dir.unwrap_or_else(|| parent_dir(&args.object));
    let resolver = Resolver::new(search_dir).with_system_libs(args.system_lib);

    let deps = {
        let _t = Timer::start("resolution");
        resolver.resolve(&args.object)?
    };
    for dep in deps {
        println!("{dep}");
    }
    Ok(())
}

/// Resolve every object in a directory and print the merged preload order.
fn cmd_scan(args: ScanArgs) -> Result<()> {
    let resolver = Resolver::new(&args.dir).with_system_libs(args.system_lib);

    let deps = {
        let _t = Timer::start("scan");
        resolver.resolve_dir(&args.dir)?
    };
    for dep in deps {
        println!("{dep}");
    }
    Ok(())
}

/// Decode one object and print everything the decoder saw.
fn cmd_dump(args: &DumpArgs) -> Result<()> {
    let data = fs::read(&args.object)
        .with_context(|| format!("could not read {}", args.object.display()))?;
    let elf = ElfFile::parse(&data)
        .with_context(|| format!("could not decode {}", args.object.display()))?;
    dump::dump_object(&args.object, &elf);
    Ok(())
}

/// The directory an object lives in, falling back to the current one for
/// bare file names.
fn parent_dir(object: &Path) -> PathBuf {
    match object.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
