//! # Config - shell settings and lookup tables
//!
//! Settings come from environment variables:
//!
//! ```text
//! ASSETKIT_SCHEMA_BUNDLE  schema bundle path            (default: unset, empty repository)
//! ASSETKIT_CLASS_TABLE    class id -> name table path   (default: unset)
//! ASSETKIT_RESOLVE_REFS   load external references      (default: "false")
//! ASSETKIT_LOG            tracing filter directive      (default: "warn")
//! ```

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads a configuration value from the environment, falling back to `default`.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Settings for the interactive shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    pub schema_bundle: Option<PathBuf>,
    pub class_table: Option<PathBuf>,
    pub resolve_refs: bool,
    pub log_filter: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            schema_bundle: None,
            class_table: None,
            resolve_refs: false,
            log_filter: "warn".to_string(),
        }
    }
}

impl ToolConfig {
    /// Reads every setting from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Empty values count as unset and
    /// unparsable flags fall back to their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            schema_bundle: get("ASSETKIT_SCHEMA_BUNDLE").map(PathBuf::from),
            class_table: get("ASSETKIT_CLASS_TABLE").map(PathBuf::from),
            resolve_refs: get("ASSETKIT_RESOLVE_REFS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.resolve_refs),
            log_filter: get("ASSETKIT_LOG").unwrap_or(defaults.log_filter),
        }
    }
}

/// Display names for class identifiers, read from a text table with one
/// `id name` pair per line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassNames {
    names: BTreeMap<i32, String>,
}

impl ClassNames {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading class table {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing class table {}", path.display()))
    }

    /// Parses `id name` lines. Blank lines and lines starting with `#` are
    /// skipped; the name is everything after the first run of whitespace.
    pub fn parse(text: &str) -> Result<Self> {
        let mut names = BTreeMap::new();
        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((id, name)) = line.split_once(char::is_whitespace) else {
                bail!("line {line_no}: expected 'id name', found '{line}'");
            };
            let id: i32 = id
                .parse()
                .with_context(|| format!("line {line_no}: invalid class id '{id}'"))?;
            names.insert(id, name.trim().to_string());
        }
        Ok(Self { names })
    }

    #[must_use]
    pub fn get(&self, class_id: i32) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    /// The display name, or `Class<id>` when unknown.
    #[must_use]
    pub fn name_or_id(&self, class_id: i32) -> String {
        self.get(class_id)
            .map_or_else(|| format!("Class{class_id}"), str::to_string)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests;
