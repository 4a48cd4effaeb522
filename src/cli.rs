//! Command line parsing exposed via the library.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use structopt::StructOpt;

use super::bundler::{absolute, find_root, DEFAULT_IGNORE};
use super::{build, identify, transform, BuildOptions, TransformOptions};

#[derive(StructOpt)]
#[structopt(about = "Convert module sources into named AMD modules")]
enum AmdCommands {
    /// Build module sources into the amd/build directories
    Build {
        /// Host installation root, detected when omitted
        #[structopt(short, long, parse(from_os_str))]
        root: Option<PathBuf>,

        /// Number of files processed at once
        #[structopt(short = "j", long)]
        concurrency: Option<usize>,

        /// Glob of root-relative paths to skip
        #[structopt(short, long, number_of_values = 1)]
        ignore: Vec<String>,

        /// Write the transformed modules without minifying
        #[structopt(long)]
        no_minify: bool,

        /// Component configuration file
        #[structopt(short, long, parse(from_os_str))]
        components: Option<PathBuf>,

        #[structopt(flatten)]
        format: FormatArgs,

        /// Files or directories to build
        #[structopt(parse(from_os_str))]
        inputs: Vec<PathBuf>,
    },

    /// Print the transformed loader call for a module
    Transform {
        /// Host installation root, detected when omitted
        #[structopt(short, long, parse(from_os_str))]
        root: Option<PathBuf>,

        #[structopt(flatten)]
        format: FormatArgs,

        /// Module source file
        #[structopt(parse(from_os_str))]
        module: PathBuf,
    },

    /// Print the module identifier for a file
    Id {
        /// Host installation root, detected when omitted
        #[structopt(short, long, parse(from_os_str))]
        root: Option<PathBuf>,

        /// Module source file
        #[structopt(parse(from_os_str))]
        module: PathBuf,
    },
}

#[derive(StructOpt)]
struct FormatArgs {
    /// Spaces of indentation for converted ES modules
    #[structopt(long, default_value = "4")]
    indent: usize,

    /// Mark bodies converted from ES modules with a comment
    #[structopt(long)]
    mark_es_modules: bool,
}

impl From<FormatArgs> for TransformOptions {
    fn from(args: FormatArgs) -> Self {
        TransformOptions {
            indent: args.indent,
            mark_es_modules: args.mark_es_modules,
        }
    }
}

/// Parse the given arguments list or `std::env::os_args` and run the program.
pub fn run<T>(argv: Option<Vec<T>>) -> Result<()>
where
    T: Into<OsString> + Clone,
{
    if std::env::var("RUST_LOG").ok().is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = pretty_env_logger::try_init();

    let app = AmdCommands::clap();
    let matches = if let Some(argv) = argv {
        app.get_matches_from(argv)
    } else {
        app.get_matches()
    };
    let args = AmdCommands::from_clap(&matches);
    let cwd = std::env::current_dir()
        .context("Unable to determine the current directory")?;

    match args {
        AmdCommands::Build {
            root,
            concurrency,
            ignore,
            no_minify,
            components,
            format,
            inputs,
        } => {
            let root = host_root(&cwd, root);
            let mut options = BuildOptions::new(&root);
            options.inputs =
                inputs.iter().map(|p| absolute(&cwd, p)).collect();
            if let Some(concurrency) = concurrency {
                options.concurrency = concurrency;
            }
            if !ignore.is_empty() {
                options.ignore = DEFAULT_IGNORE
                    .iter()
                    .map(|s| s.to_string())
                    .chain(ignore)
                    .collect();
            }
            options.minify = !no_minify;
            options.components = components.map(|p| absolute(&cwd, &p));
            options.transform = format.into();

            let report = build(options)?;
            if !report.is_success() {
                bail!("{} module(s) failed to build", report.failed.len());
            }
        }
        AmdCommands::Transform {
            root,
            format,
            module,
        } => {
            let root = host_root(&cwd, root);
            transform(root, absolute(&cwd, &module), format.into())?;
        }
        AmdCommands::Id { root, module } => {
            let root = host_root(&cwd, root);
            identify(root, absolute(&cwd, &module))?;
        }
    }
    Ok(())
}

fn host_root(cwd: &Path, root: Option<PathBuf>) -> PathBuf {
    match root {
        Some(root) => absolute(cwd, &root),
        None => find_root(cwd).unwrap_or_else(|| {
            log::warn!(
                "No host root found above {}, using it as the root",
                cwd.display()
            );
            cwd.to_path_buf()
        }),
    }
}
