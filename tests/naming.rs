use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use amdbuild::naming::components::{fallback_component, is_frankenstyle};
use amdbuild::naming::path::relative_to_root;
use amdbuild::naming::{
    build_path, classify, resolve, ComponentCache, ComponentMap,
    ModuleIdentifier, Resolver,
};
use amdbuild::Error;

use testing::HostTree;

fn access_and_mod_map() -> ComponentMap {
    ComponentMap::new(vec![("access", "lib/access")], vec![("mod", "mod")])
}

#[test]
fn classify_component_and_file() -> Result<()> {
    let classified = classify("mod/forum/amd/src/local/grades/x.js")?;
    assert_eq!(2, classified.marker);
    assert_eq!("mod/forum", classified.component_path());
    assert_eq!("local/grades/x", classified.file_path());
    Ok(())
}

#[test]
fn classify_normalizes_backslashes() -> Result<()> {
    let classified = classify(r"mod\forum\amd\src\x.js")?;
    assert_eq!(
        vec!["mod", "forum", "amd", "src", "x.js"],
        classified.segments
    );
    Ok(())
}

#[test]
fn classify_rejects_malformed() {
    let malformed = [
        "mod/forum/src/x.js",
        "mod/forum/amd/x.js",
        "mod/forum/amd/build/x.js",
        "mod/forum/amd/src/",
        "mod/forum/amd/src",
        "mod/forum/amd/src/x.ts",
        "mod/forum/amd/src//x.js",
        "mod/forum/amd/src/.js",
    ];
    for path in malformed.iter() {
        match classify(path) {
            Err(Error::PathFormat { path: reported, .. }) => {
                assert_eq!(*path, reported)
            }
            other => panic!("{} classified as {:?}", path, other),
        }
    }
}

#[test]
fn classify_build_path() -> Result<()> {
    assert_eq!(
        PathBuf::from("/www/mod/forum/amd/build/local/x.min.js"),
        build_path(Path::new("/www/mod/forum/amd/src/local/x.js"))?
    );
    Ok(())
}

#[test]
fn relative_paths() -> Result<()> {
    let root = Path::new("/www");
    assert_eq!(
        "mod/forum/amd/src/x.js",
        relative_to_root(Path::new("/www/mod/forum/amd/src/x.js"), root)?
    );
    assert_eq!(
        "lib/amd/src/x.js",
        relative_to_root(Path::new("./lib/amd/src/x.js"), root)?
    );
    assert!(relative_to_root(Path::new("/www2/lib/amd/src/x.js"), root)
        .is_err());
    Ok(())
}

#[test]
fn components_subsystem_plugin_and_core() -> Result<()> {
    let map = access_and_mod_map();
    assert_eq!("mod_forum", map.resolve("mod/forum")?);
    assert_eq!("core_access", map.resolve("lib/access")?);
    assert_eq!("core", map.resolve("lib")?);
    assert_eq!("core", map.resolve("public/lib")?);
    Ok(())
}

#[test]
fn components_nested_plugin_types() -> Result<()> {
    let map = ComponentMap::new(
        Vec::<(&str, &str)>::new(),
        vec![
            ("mod", "mod"),
            ("assignsubmission", "mod/assign/submission"),
        ],
    );
    assert_eq!("assignsubmission_file", map.resolve("mod/assign/submission/file")?);
    assert_eq!("mod_assign", map.resolve("mod/assign")?);
    Ok(())
}

#[test]
fn components_invalid_plugin_path() {
    let map = access_and_mod_map();
    for path in ["mod/", "mod/forum/extra"].iter() {
        assert!(matches!(
            map.resolve(path),
            Err(Error::InvalidPluginPath { .. })
        ));
    }
}

#[test]
fn components_fallback() -> Result<()> {
    let map: ComponentMap = Default::default();
    assert!(map.is_empty());
    assert_eq!("local_custom", map.resolve("local/custom")?);
    assert_eq!("core", map.resolve("")?);
    assert_eq!("core", map.resolve("lib")?);
    assert_eq!("admin", fallback_component("/admin/")?);
    assert!(is_frankenstyle("core"));
    assert!(is_frankenstyle("mod_forum"));
    assert!(!is_frankenstyle("Mod_Forum"));
    Ok(())
}

#[test]
fn components_case_sensitive() -> Result<()> {
    let map = access_and_mod_map();
    assert_eq!("Lib_access", map.resolve("Lib/access")?);
    Ok(())
}

#[test]
fn components_load_file() -> Result<()> {
    let tree = HostTree::with_components(
        r#"{
            "subsystems": {"access": "lib/access", "ajax": null, "admin": "admin/"},
            "plugintypes": {"mod": "mod", "block": "blocks"}
        }"#,
    )?;
    let map = ComponentMap::load(tree.root())?;
    assert!(!map.is_empty());
    assert_eq!("core_access", map.resolve("lib/access")?);
    assert_eq!("core_admin", map.resolve("admin")?);
    assert_eq!("block_timeline", map.resolve("blocks/timeline")?);
    assert_eq!("lib_ajax", map.resolve("lib/ajax")?);
    Ok(())
}

#[test]
fn components_missing_file_is_empty() -> Result<()> {
    let tree = HostTree::new()?;
    let map = ComponentMap::load(tree.root())?;
    assert!(map.is_empty());
    Ok(())
}

#[test]
fn components_invalid_json() -> Result<()> {
    let tree = HostTree::with_components("{\"subsystems\": ")?;
    let err = ComponentMap::load(tree.root()).unwrap_err();
    assert!(matches!(err, Error::RegistryLoad { .. }));
    assert!(err.is_fatal());
    Ok(())
}

#[test]
fn components_cache() -> Result<()> {
    let tree = HostTree::with_components(r#"{"plugintypes": {"mod": "mod"}}"#)?;
    let file = tree.path("lib/components.json");
    let cache = ComponentCache::new();
    assert!(!cache.is_loaded());
    let first = cache.get_or_load(&file)?;
    let second = cache.get_or_load(&file)?;
    assert!(Arc::ptr_eq(&first, &second));
    cache.clear();
    assert!(!cache.is_loaded());
    let third = cache.get_or_load(&file)?;
    assert!(!Arc::ptr_eq(&first, &third));
    Ok(())
}

#[test]
fn identifier_examples() -> Result<()> {
    let map = access_and_mod_map();
    let root = Path::new("/www");
    let cases = [
        ("/www/mod/forum/amd/src/x.js", "mod_forum/x"),
        ("/www/lib/access/amd/src/y.js", "core_access/y"),
        ("/www/lib/amd/src/z.js", "core/z"),
        ("lib/amd/src/local/nested/z.js", "core/local/nested/z"),
        ("/www/local/custom/amd/src/a.js", "local_custom/a"),
    ];
    for (file, expected) in cases.iter() {
        let identifier = resolve(Path::new(file), root, &map)?;
        assert_eq!(*expected, identifier.to_string());
    }
    Ok(())
}

#[test]
fn identifier_deterministic() -> Result<()> {
    let tree = HostTree::with_components(
        r#"{"subsystems": {"access": "lib/access"}, "plugintypes": {"mod": "mod"}}"#,
    )?;
    let file = tree.write("mod/forum/amd/src/x.js", "")?;
    let resolver =
        Resolver::new(tree.root(), Arc::new(ComponentMap::load(tree.root())?));

    let first = resolver.resolve(&file)?;
    let second = resolver.resolve(&file)?;
    assert_eq!(first, second);

    tree.write("mod/quiz/amd/src/x.js", "")?;
    tree.write("mod/forum/amd/build/x.min.js", "")?;
    tree.write("mod/forum/lang/en/forum.php", "")?;
    assert_eq!(first, resolver.resolve(&file)?);
    assert_eq!("mod_forum", first.component());
    assert_eq!("x", first.file());
    Ok(())
}

#[test]
fn identifier_failures() {
    let map = access_and_mod_map();
    let root = Path::new("/www");
    assert!(matches!(
        resolve(Path::new("/elsewhere/lib/amd/src/x.js"), root, &map),
        Err(Error::PathFormat { .. })
    ));
    assert!(matches!(
        resolve(Path::new("/www/mod/forum/amd/x.js"), root, &map),
        Err(Error::PathFormat { .. })
    ));
    assert!(matches!(
        resolve(Path::new("/www/mod/forum/sub/amd/src/x.js"), root, &map),
        Err(Error::InvalidPluginPath { .. })
    ));
    assert!(ModuleIdentifier::new("", "x").is_err());
    assert!(ModuleIdentifier::new("core", "").is_err());
    assert!(ModuleIdentifier::new("core/x", "y").is_err());
}
