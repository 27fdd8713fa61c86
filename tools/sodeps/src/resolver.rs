//! Recursive NEEDED-dependency resolution in safe preload order.
//!
//! Decodes one object, resolves each NEEDED name against the search
//! directory, recurses depth-first, and accumulates a deduplicated,
//! dependency-first list terminated by the object's own name. Cycles are
//! detected against the chain of objects currently being resolved; names
//! with no file in the search directory are classified as system
//! libraries and skipped.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use sodeps_elf::ElfFile;
use walkdir::WalkDir;

use crate::verbose::{dprintln, vprintln};

/// Library names assumed to be provided by the platform; their absence
/// from the search directory is expected and not worth a notice.
const DEFAULT_SYSTEM_LIBS: [&str; 5] = ["libc.so", "libm.so", "libdl.so", "liblog.so", "libz.so"];

/// Resolves NEEDED dependencies of ELF objects against one search directory.
///
/// Holds no state across calls; every resolution decodes each object from
/// scratch and nothing is cached between top-level invocations.
pub struct Resolver {
    search_dir: PathBuf,
    system_libs: BTreeSet<String>,
}

impl Resolver {
    /// Creates a resolver over the given search directory with the
    /// built-in system library allow-list.
    pub fn new(search_dir: impl Into<PathBuf>) -> Self {
        Self {
            search_dir: search_dir.into(),
            system_libs: DEFAULT_SYSTEM_LIBS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Extends the set of known system library names.
    #[must_use]
    pub fn with_system_libs(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.system_libs.extend(names);
        self
    }

    /// Resolves one object, returning its dependencies in safe preload
    /// order — each library after everything it itself requires — with
    /// duplicates removed and the object's own file name last.
    ///
    /// # Errors
    ///
    /// Fails if the object is missing, not a regular file, unreadable or
    /// malformed, or if the dependency chain is cyclic. Nothing partial
    /// is returned on failure.
    pub fn resolve(&self, object: &Path) -> Result<Vec<String>> {
        let root = checked_object_path(object)?;
        let name = object
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", object.display()))?;

        let mut stack = Vec::new();
        let mut deps = Vec::new();
        self.resolve_into(&root, &name, &mut stack, &mut deps)?;
        Ok(deps)
    }

    /// Resolves every direct child of `dir` as an independent root and
    /// merges the per-root lists, first occurrence winning.
    ///
    /// Children are visited in file-name order; entries that are not
    /// regular files are skipped. Cycle detection stays per-root: each
    /// child gets its own ancestor chain.
    ///
    /// # Errors
    ///
    /// Fails if the directory cannot be listed or any child fails to
    /// resolve.
    pub fn resolve_dir(&self, dir: &Path) -> Result<Vec<String>> {
        let mut merged: Vec<String> = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.with_context(|| format!("could not list {}", dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            vprintln!("scanning {}", entry.path().display());
            let deps = self.resolve(entry.path())?;
            for dep in deps {
                if !merged.contains(&dep) {
                    merged.push(dep);
                }
            }
        }
        Ok(merged)
    }

    /// Decodes `path`, walks its NEEDED entries with `path` on the active
    /// chain, then records `name` itself.
    fn resolve_into(
        &self,
        path: &Path,
        name: &str,
        stack: &mut Vec<PathBuf>,
        deps: &mut Vec<String>,
    ) -> Result<()> {
        let data = fs::read(path).with_context(|| format!("could not read {}", path.display()))?;
        let elf =
            ElfFile::parse(&data).with_context(|| format!("could not decode {}", path.display()))?;
        let needed: Vec<String> = elf
            .needed_libraries()
            .iter()
            .map(ToString::to_string)
            .collect();

        // The object joins the chain before its entries are walked, so a
        // NEEDED name resolving back to it is reported as a cycle.
        stack.push(path.to_path_buf());
        let walked = self.walk_needed(&needed, stack, deps);
        stack.pop();
        walked?;

        if !deps.iter().any(|dep| dep == name) {
            deps.push(name.to_string());
        }
        Ok(())
    }

    /// Processes the NEEDED names of one object in dynamic-table order.
    fn walk_needed(
        &self,
        needed: &[String],
        stack: &mut Vec<PathBuf>,
        deps: &mut Vec<String>,
    ) -> Result<()> {
        for name in needed {
            if deps.iter().any(|dep| dep == name) {
                continue; // already satisfied
            }
            let candidate = self.search_dir.join(name);
            if candidate.exists() {
                let resolved = fs::canonicalize(&candidate)
                    .with_context(|| format!("could not canonicalize {}", candidate.display()))?;
                if let Some(ancestor) = stack.iter().find(|p| **p == resolved) {
                    bail!(
                        "cyclic dependency on {name}: {} is already being resolved",
                        ancestor.display()
                    );
                }
                vprintln!("  descending into {}", resolved.display());
                self.resolve_into(&resolved, name, stack, deps)?;
            } else if !self.system_libs.contains(name) {
                dprintln!("Assume system library: {name}");
            }
        }
        Ok(())
    }
}

/// Validates the root object before any decoding happens.
fn checked_object_path(object: &Path) -> Result<PathBuf> {
    let meta = fs::metadata(object)
        .with_context(|| format!("ELF object {} is not available", object.display()))?;
    if !meta.is_file() {
        bail!("ELF object {} is not a regular file", object.display());
    }
    fs::canonicalize(object).with_context(|| format!("could not canonicalize {}", object.display()))
}
