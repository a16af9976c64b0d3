use super::helpers::*;
use crate::*;
use anyhow::Result;
use endian::ByteOrder;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_container(path: &Path, refs: &[&str]) -> Result<()> {
    let mut c = Container::new(9, ByteOrder::Little, SIGNATURE)?;
    for r in refs {
        c.add_external(ExternalReference::new(r));
    }
    c.save(path)?;
    Ok(())
}

#[test]
fn cyclic_references_load_each_container_once() -> Result<()> {
    let dir = tempdir()?;
    write_container(&dir.path().join("a.assets"), &["b.assets"])?;
    write_container(&dir.path().join("b.assets"), &["a.assets", "b.assets"])?;

    let graph = ReferenceGraph::load(dir.path().join("a.assets"), &repo())?;
    assert_eq!(graph.len(), 2);

    let a = fs::canonicalize(dir.path().join("a.assets"))?;
    let b = fs::canonicalize(dir.path().join("b.assets"))?;
    let paths: Vec<&Path> = graph.iter().map(|(p, _)| p).collect();
    assert_eq!(paths, vec![a.as_path(), b.as_path()]);

    let root = graph.root();
    assert_eq!(root.externals()[0].resolved.as_deref(), Some(b.as_path()));
    let target = graph.get(&b).unwrap();
    assert_eq!(target.externals()[0].resolved.as_deref(), Some(a.as_path()));
    assert_eq!(target.externals()[1].resolved.as_deref(), Some(b.as_path()));
    Ok(())
}

#[test]
fn library_paths_resolve_to_resources() -> Result<()> {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("resources"))?;
    write_container(&dir.path().join("resources/shared.assets"), &[])?;
    write_container(&dir.path().join("level0.assets"), &["library/shared.assets"])?;

    let graph = ReferenceGraph::load(dir.path().join("level0.assets"), &repo())?;
    assert_eq!(graph.len(), 2);
    let reference = &graph.root().externals()[0];
    let shared = graph.resolve(reference).unwrap();
    assert!(shared.externals().is_empty());
    Ok(())
}

#[test]
fn missing_and_empty_references_are_skipped() -> Result<()> {
    let dir = tempdir()?;
    write_container(&dir.path().join("level0.assets"), &["", "missing.assets"])?;

    let graph = ReferenceGraph::load(dir.path().join("level0.assets"), &repo())?;
    assert_eq!(graph.len(), 1);
    assert!(!graph.is_empty());
    assert!(graph.root().externals().iter().all(|r| r.resolved.is_none()));
    Ok(())
}

#[test]
fn diamond_loads_shared_target_once() -> Result<()> {
    let dir = tempdir()?;
    write_container(&dir.path().join("root.assets"), &["left.assets", "right.assets"])?;
    write_container(&dir.path().join("left.assets"), &["shared.assets"])?;
    write_container(&dir.path().join("right.assets"), &["shared.assets"])?;
    write_container(&dir.path().join("shared.assets"), &[])?;

    let graph = ReferenceGraph::load(dir.path().join("root.assets"), &repo())?;
    assert_eq!(graph.len(), 4);
    let names: Vec<String> = graph
        .iter()
        .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        names,
        vec!["root.assets", "left.assets", "shared.assets", "right.assets"]
    );
    Ok(())
}

#[test]
fn broken_reference_target_fails_the_load() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("junk.assets"), b"not a container")?;
    write_container(&dir.path().join("level0.assets"), &["junk.assets"])?;

    assert!(ReferenceGraph::load(dir.path().join("level0.assets"), &repo()).is_err());
    Ok(())
}
