use std::path::PathBuf;

use anyhow::{bail, Result};

use amdbuild::bundler::{
    self, discover, find_root, run_batches, AmdHook, BuildOptions, BuiltModule,
    Pipeline, RenderHook, SwcPipeline, DEFAULT_IGNORE,
};
use amdbuild::{Error, ModuleIdentifier};

use testing::HostTree;

const COMPONENTS: &str =
    r#"{"subsystems": {"access": "lib/access"}, "plugintypes": {"mod": "mod"}}"#;

const LOADER: &str = "define(['core/str'], function(Str) { return Str; });\n";
const ES_MODULE: &str = "export default 1;\n";

fn host() -> Result<HostTree> {
    let tree = HostTree::with_components(COMPONENTS)?;
    tree.write("mod/forum/amd/src/a.js", LOADER)?;
    tree.write("lib/amd/src/b.js", ES_MODULE)?;
    Ok(tree)
}

fn options(tree: &HostTree) -> BuildOptions {
    let mut options = BuildOptions::new(tree.root());
    options.minify = false;
    options.concurrency = 2;
    options
}

#[test]
fn build_writes_named_modules() -> Result<()> {
    let tree = host()?;
    let report = bundler::build(&options(&tree))?;
    assert!(report.is_success());
    assert_eq!(2, report.processed);
    assert_eq!(
        "Processed 2 file(s): 2 built, 0 failed",
        report.summary()
    );

    assert_eq!(
        r#"define("mod_forum/a", ["core/str"], function(Str) { return Str; });"#,
        tree.read("mod/forum/amd/build/a.min.js")?
    );
    assert_eq!(
        r#"define("core/b", [], function() {
    var _exports = {};
    _exports.default = 1;
    return _exports.default;
});"#,
        tree.read("lib/amd/build/b.min.js")?
    );
    // Sources are left alone.
    assert_eq!(LOADER, tree.read("mod/forum/amd/src/a.js")?);
    Ok(())
}

#[test]
fn build_minified() -> Result<()> {
    let tree = host()?;
    let mut options = options(&tree);
    options.minify = true;
    let report = bundler::build(&options)?;
    assert!(report.is_success());

    let code = tree.read("mod/forum/amd/build/a.min.js")?;
    assert!(code.starts_with("define("));
    assert!(code.contains("mod_forum/a"));
    assert!(code.contains("core/str"));
    assert!(!code.contains("\n    "));
    Ok(())
}

#[test]
fn build_reports_malformed_inputs() -> Result<()> {
    let tree = host()?;
    let bad_dir = tree.write("mod/forum/amd/x.js", LOADER)?;
    let bad_ext = tree.write("mod/forum/amd/src/c.ts", LOADER)?;

    let mut options = options(&tree);
    options.inputs = vec![
        tree.path("mod/forum/amd/src/a.js"),
        tree.path("lib/amd/src/b.js"),
        bad_dir.clone(),
        bad_ext.clone(),
    ];
    let report = bundler::build(&options)?;
    assert!(!report.is_success());
    assert_eq!(4, report.processed);
    assert_eq!(2, report.succeeded.len());
    assert_eq!(2, report.failed.len());

    let mut failed: Vec<PathBuf> =
        report.failed.iter().map(|f| f.source.clone()).collect();
    failed.sort();
    let mut expected = vec![bad_dir, bad_ext];
    expected.sort();
    assert_eq!(expected, failed);
    for failure in report.failed.iter() {
        assert!(matches!(
            failure.error.downcast_ref::<Error>(),
            Some(Error::PathFormat { .. })
        ));
    }
    Ok(())
}

#[test]
fn build_unparseable_output_fails_file() -> Result<()> {
    let tree = host()?;
    tree.write("mod/forum/amd/src/broken.js", "var x = ;\n")?;
    let mut options = options(&tree);
    options.minify = true;
    let report = bundler::build(&options)?;
    assert_eq!(3, report.processed);
    assert_eq!(2, report.succeeded.len());
    assert_eq!(1, report.failed.len());

    let failure = &report.failed[0];
    assert_eq!(tree.path("mod/forum/amd/src/broken.js"), failure.source);
    assert!(matches!(
        failure.error.downcast_ref::<Error>(),
        Some(Error::Minify { .. })
    ));
    assert!(!tree.path("mod/forum/amd/build/broken.min.js").exists());
    Ok(())
}

#[test]
fn build_invalid_registry_is_fatal() -> Result<()> {
    let tree = HostTree::with_components("{\"plugintypes\": [")?;
    tree.write("mod/forum/amd/src/a.js", LOADER)?;
    assert!(bundler::build(&options(&tree)).is_err());
    assert!(!tree.path("mod/forum/amd/build/a.min.js").exists());
    Ok(())
}

#[test]
fn build_relative_root() -> Result<()> {
    let tree = HostTree::new_in(".")?;
    assert!(tree.root().is_relative());
    tree.write("lib/components.json", COMPONENTS)?;
    tree.write("mod/forum/amd/src/a.js", LOADER)?;

    let report = bundler::build(&options(&tree))?;
    assert!(report.is_success());
    assert_eq!(1, report.processed);
    assert_eq!("mod_forum/a", report.succeeded[0].identifier.to_string());
    assert!(tree.path("mod/forum/amd/build/a.min.js").exists());

    let mut options = options(&tree);
    options.inputs = vec![tree.path("mod/forum/amd/src/a.js")];
    let report = bundler::build(&options)?;
    assert_eq!("mod_forum/a", report.succeeded[0].identifier.to_string());
    Ok(())
}

#[test]
fn build_explicit_components_file() -> Result<()> {
    let tree = HostTree::new()?;
    let components = tree.write("config/components.json", COMPONENTS)?;
    tree.write("mod/forum/amd/src/a.js", LOADER)?;
    let mut options = options(&tree);
    options.components = Some(components);
    let report = bundler::build(&options)?;
    assert!(report.is_success());
    assert_eq!("mod_forum/a", report.succeeded[0].identifier.to_string());
    Ok(())
}

#[test]
fn discover_skips_hidden_ignored_and_foreign_files() -> Result<()> {
    let tree = host()?;
    tree.write(".hidden/amd/src/x.js", LOADER)?;
    tree.write("node_modules/pkg/amd/src/y.js", LOADER)?;
    tree.write("mod/forum/amd/build/a.min.js", LOADER)?;
    tree.write("mod/forum/styles.css", "")?;
    tree.write("mod/quiz/amd/src/q.js", LOADER)?;

    let ignore = bundler::compile_ignore(DEFAULT_IGNORE)?;
    let files = discover(tree.root(), &[], &ignore)?;
    assert_eq!(
        vec![
            tree.path("lib/amd/src/b.js"),
            tree.path("mod/forum/amd/src/a.js"),
            tree.path("mod/quiz/amd/src/q.js"),
        ],
        files
    );

    let ignore = bundler::compile_ignore(&["mod/forum/**"])?;
    let files = discover(tree.root(), &[tree.path("mod")], &ignore)?;
    assert_eq!(vec![tree.path("mod/quiz/amd/src/q.js")], files);
    Ok(())
}

#[test]
fn discover_dedupes_inputs() -> Result<()> {
    let tree = host()?;
    let file = tree.path("mod/forum/amd/src/a.js");
    let files = discover(
        tree.root(),
        &[file.clone(), tree.path("mod/forum"), file.clone()],
        &[],
    )?;
    assert_eq!(vec![file], files);
    Ok(())
}

#[test]
fn find_root_walks_ancestors() -> Result<()> {
    let tree = host()?;
    assert_eq!(
        Some(tree.root().to_path_buf()),
        find_root(tree.path("mod/forum/amd/src"))
    );
    Ok(())
}

#[test]
fn batches_record_failures_and_continue() -> Result<()> {
    let files: Vec<PathBuf> =
        (0..5).map(|i| PathBuf::from(format!("f{}.js", i))).collect();
    for concurrency in [0, 1, 2, 8].iter() {
        let report = run_batches(&files, *concurrency, |file| {
            let name = file.to_string_lossy().to_string();
            if name == "f1.js" || name == "f3.js" {
                bail!("cannot build {}", name);
            }
            Ok(BuiltModule {
                source: file.to_path_buf(),
                output: file.with_extension("min.js"),
                identifier: ModuleIdentifier::new("core", name)?,
            })
        })?;
        assert_eq!(5, report.processed);
        assert_eq!(3, report.succeeded.len());
        assert_eq!(2, report.failed.len());
    }
    Ok(())
}

#[test]
fn batches_empty() -> Result<()> {
    let report = run_batches(&[], 4, |_| bail!("unreachable"))?;
    assert_eq!(0, report.processed);
    assert!(report.is_success());
    Ok(())
}

#[test]
fn hook_leaves_canonical_output() -> Result<()> {
    let identifier = ModuleIdentifier::new("core", "x")?;
    let hook: AmdHook = Default::default();
    let canonical = r#"define("core/x", [], function() { return 1; });"#;
    assert_eq!(None, hook.render_chunk(canonical, &identifier)?);
    assert!(hook
        .render_chunk("define(function() { return 1; });", &identifier)?
        .is_some());
    Ok(())
}

#[test]
fn pipeline_without_minify() -> Result<()> {
    let identifier = ModuleIdentifier::new("core", "x")?;
    let code = SwcPipeline::new(false).build(
        ES_MODULE,
        &identifier,
        &AmdHook::default(),
    )?;
    assert!(code.starts_with(r#"define("core/x", [], function() {"#));
    assert!(code.ends_with("});"));
    Ok(())
}
