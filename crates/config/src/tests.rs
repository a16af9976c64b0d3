use crate::*;
use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use tempfile::tempdir;

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

// -------------------- ToolConfig --------------------

#[test]
fn defaults_when_nothing_is_set() {
    let cfg = ToolConfig::from_lookup(lookup(&[]));
    assert_eq!(cfg, ToolConfig::default());
    assert_eq!(cfg.log_filter, "warn");
    assert!(!cfg.resolve_refs);
}

#[test]
fn reads_every_setting() {
    let cfg = ToolConfig::from_lookup(lookup(&[
        ("ASSETKIT_SCHEMA_BUNDLE", "/data/types.dat"),
        ("ASSETKIT_CLASS_TABLE", "classes.txt"),
        ("ASSETKIT_RESOLVE_REFS", "true"),
        ("ASSETKIT_LOG", "container=debug"),
    ]));
    assert_eq!(cfg.schema_bundle, Some("/data/types.dat".into()));
    assert_eq!(cfg.class_table, Some("classes.txt".into()));
    assert!(cfg.resolve_refs);
    assert_eq!(cfg.log_filter, "container=debug");
}

#[test]
fn empty_and_bad_values_fall_back() {
    let cfg = ToolConfig::from_lookup(lookup(&[
        ("ASSETKIT_SCHEMA_BUNDLE", "  "),
        ("ASSETKIT_RESOLVE_REFS", "sometimes"),
    ]));
    assert_eq!(cfg.schema_bundle, None);
    assert!(!cfg.resolve_refs);
}

// -------------------- ClassNames --------------------

#[test]
fn parses_pairs_comments_and_blank_lines() -> Result<()> {
    let names = ClassNames::parse("# engine classes\n1 GameObject\n\n4\tTransform\n114   MonoBehaviour\n")?;
    assert_eq!(names.len(), 3);
    assert_eq!(names.get(1), Some("GameObject"));
    assert_eq!(names.get(4), Some("Transform"));
    assert_eq!(names.get(114), Some("MonoBehaviour"));
    assert_eq!(names.name_or_id(999), "Class999");
    Ok(())
}

#[test]
fn bad_lines_report_line_numbers() {
    let err = ClassNames::parse("1 GameObject\nTransform\n").unwrap_err();
    assert!(err.to_string().contains("line 2"), "{err}");

    let err = ClassNames::parse("1 GameObject\n\nx Transform\n").unwrap_err();
    assert!(err.to_string().contains("line 3"), "{err}");
}

#[test]
fn load_reads_file() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("classes.txt");
    fs::write(&path, "28 Texture2D\n")?;
    let names = ClassNames::load(&path)?;
    assert_eq!(names.get(28), Some("Texture2D"));

    assert!(ClassNames::load(dir.path().join("missing.txt")).is_err());
    Ok(())
}
