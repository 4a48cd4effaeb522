//! Build every module source below a host root.
//!
//! Files are processed in fixed-size batches; the files of a batch run in
//! parallel and batches run one after another. A failing file is recorded
//! and the batch carries on, only a registry that cannot be loaded stops
//! the run before any file is touched.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::module::TransformOptions;
use crate::naming::components::COMPONENTS_FILE;
use crate::naming::{build_path, ComponentCache, ModuleIdentifier, Resolver};

pub mod discover;
pub mod pipeline;

pub use discover::{
    absolute, compile_ignore, discover, find_root, DEFAULT_IGNORE,
};
pub use pipeline::{AmdHook, Pipeline, RenderHook, SwcPipeline};

/// Options for a build run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Host installation root.
    pub root: PathBuf,
    /// Files or directories to build, everything below the root if empty.
    pub inputs: Vec<PathBuf>,
    /// Number of files processed at once.
    pub concurrency: usize,
    /// Globs matched against root-relative paths to skip.
    pub ignore: Vec<String>,
    /// Minify the emitted modules.
    pub minify: bool,
    /// Component configuration file, `lib/components.json` when unset.
    pub components: Option<PathBuf>,
    /// Formatting of emitted modules.
    pub transform: TransformOptions,
}

impl BuildOptions {
    /// Default options for a root.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            inputs: Vec::new(),
            concurrency: num_cpus::get(),
            ignore: DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect(),
            minify: true,
            components: None,
            transform: Default::default(),
        }
    }

    /// The component configuration file for this run.
    pub fn components_file(&self) -> PathBuf {
        self.components
            .clone()
            .unwrap_or_else(|| self.root.join(COMPONENTS_FILE))
    }
}

/// A module written to the build directory.
#[derive(Debug, Clone)]
pub struct BuiltModule {
    pub source: PathBuf,
    pub output: PathBuf,
    pub identifier: ModuleIdentifier,
}

/// A module that could not be built.
#[derive(Debug)]
pub struct FileFailure {
    pub source: PathBuf,
    pub error: anyhow::Error,
}

/// Outcome of a build run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Number of files attempted.
    pub processed: usize,
    pub succeeded: Vec<BuiltModule>,
    pub failed: Vec<FileFailure>,
}

impl BatchReport {
    /// Determine if every file was built.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// One line summary of the run.
    pub fn summary(&self) -> String {
        format!(
            "Processed {} file(s): {} built, {} failed",
            self.processed,
            self.succeeded.len(),
            self.failed.len()
        )
    }
}

/// Builds a single module source through a pipeline.
pub struct ModuleBuilder<P: Pipeline, H: RenderHook> {
    resolver: Resolver,
    pipeline: P,
    hook: H,
}

impl<P: Pipeline, H: RenderHook> ModuleBuilder<P, H> {
    /// Create a builder.
    pub fn new(resolver: Resolver, pipeline: P, hook: H) -> Self {
        Self {
            resolver,
            pipeline,
            hook,
        }
    }

    /// Name, transform and write one module source.
    pub fn build_file(&self, file: &Path) -> Result<BuiltModule> {
        let identifier = self.resolver.resolve(file)?;
        let source = fs::read_to_string(file)
            .with_context(|| format!("Unable to read {}", file.display()))?;
        let code = self
            .pipeline
            .build(&source, &identifier, &self.hook)
            .with_context(|| format!("Failed to build {}", identifier))?;

        let output = build_path(file)?;
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Unable to create {}", parent.display())
            })?;
        }
        fs::write(&output, code)
            .with_context(|| format!("Unable to write {}", output.display()))?;

        log::debug!("{} -> {}", identifier, output.display());
        Ok(BuiltModule {
            source: file.to_path_buf(),
            output,
            identifier,
        })
    }
}

/// Build all module sources selected by `options`.
pub fn build(options: &BuildOptions) -> Result<BatchReport> {
    build_with_cache(options, &ComponentCache::new())
}

/// Build using a registry cache shared with other runs.
pub fn build_with_cache(
    options: &BuildOptions,
    cache: &ComponentCache,
) -> Result<BatchReport> {
    // Identifiers are taken from paths below an absolute root.
    let cwd = std::env::current_dir()
        .context("Unable to determine the current directory")?;
    let root = absolute(&cwd, &options.root);
    let inputs: Vec<PathBuf> =
        options.inputs.iter().map(|p| absolute(&cwd, p)).collect();

    let components = cache
        .get_or_load(absolute(&cwd, &options.components_file()))
        .context("Unable to load the component registry")?;
    let ignore = compile_ignore(&options.ignore)?;
    let files = discover(&root, &inputs, &ignore)?;

    let builder = ModuleBuilder::new(
        Resolver::new(&root, Arc::clone(&components)),
        SwcPipeline::new(options.minify),
        AmdHook::new(options.transform.clone()),
    );

    let report =
        run_batches(&files, options.concurrency, |file| builder.build_file(file))?;
    log::info!("{}", report.summary());
    Ok(report)
}

/// Run `process` over `files` in batches of `concurrency` files.
pub fn run_batches<F>(
    files: &[PathBuf],
    concurrency: usize,
    process: F,
) -> Result<BatchReport>
where
    F: Fn(&Path) -> Result<BuiltModule> + Sync,
{
    let width = concurrency.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(width)
        .build()
        .context("Unable to start worker threads")?;

    let mut report: BatchReport = Default::default();
    for (index, batch) in files.chunks(width).enumerate() {
        log::debug!("Batch {} with {} file(s)", index + 1, batch.len());
        let outcomes: Vec<(&PathBuf, Result<BuiltModule>)> = pool.install(|| {
            batch
                .par_iter()
                .map(|file| (file, process(file.as_path())))
                .collect()
        });

        for (file, outcome) in outcomes {
            report.processed += 1;
            match outcome {
                Ok(module) => report.succeeded.push(module),
                Err(error) => {
                    log::error!("{}: {:#}", file.display(), error);
                    report.failed.push(FileFailure {
                        source: file.clone(),
                        error,
                    });
                }
            }
        }
    }
    Ok(report)
}
