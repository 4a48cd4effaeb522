//! Convert module sources into named AMD loader calls.
//!
//! Each file below `<component>/amd/src/` is named after its owning
//! component, rewritten into a `define("<component>/<file>", ...)` call
//! and written to the mirrored `amd/build/` location.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod bundler;
pub mod cli;
pub mod error;
pub mod module;
pub mod naming;
pub mod swc_utils;

pub use bundler::{BatchReport, BuildOptions};
pub use error::Error;
pub use module::{TransformOptions, TransformResult};
pub use naming::{ComponentMap, ModuleIdentifier, Resolver};

/// Build the selected module sources and print a summary.
pub fn build(options: BuildOptions) -> Result<BatchReport> {
    let report = bundler::build(&options)?;
    for failure in report.failed.iter() {
        eprintln!("{}: {:#}", failure.source.display(), failure.error);
    }
    println!("{}", report.summary());
    Ok(report)
}

/// Print the identifier for a module source.
pub fn identify(root: PathBuf, file: PathBuf) -> Result<()> {
    let identifier = resolve_identifier(&root, &file)?;
    println!("{}", identifier);
    Ok(())
}

/// Print the transformed loader call for a module source.
pub fn transform(
    root: PathBuf,
    file: PathBuf,
    options: TransformOptions,
) -> Result<()> {
    let identifier = resolve_identifier(&root, &file)?;
    let source = std::fs::read_to_string(&file)
        .with_context(|| format!("Unable to read {}", file.display()))?;
    let result = module::transform(&source, &identifier, &options)?;
    println!("{}", result.code);
    Ok(())
}

fn resolve_identifier(root: &Path, file: &Path) -> Result<ModuleIdentifier> {
    let components = ComponentMap::load(root)?;
    Ok(naming::resolve(file, root, &components)?)
}
