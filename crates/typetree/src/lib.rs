//! # TypeTree - runtime schemas and the schema repository
//!
//! A serialized object carries no field names or types of its own; its layout
//! is described by a tree of [`TypeNode`]s. Containers may embed those trees
//! inline, but most do not, so the layout has to be looked up externally in a
//! schema bundle keyed by class identifier and engine-version label.
//!
//! ## Bundle layout (all big-endian)
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ format_version (i32)                                      │
//! ├──────────────────────────────────────────────────────────┤
//! │ node_count (i32) | TypeNode × node_count                  │
//! ├──────────────────────────────────────────────────────────┤
//! │ label_count (i32) | version label (cstring) × label_count │
//! ├──────────────────────────────────────────────────────────┤
//! │ binding_count (i32)                                       │
//! │ (node_index i32 | class_id i32 | version_index i32) × n   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## TypeNode layout
//!
//! ```text
//! type (cstring) | name (cstring) | byte_size (i32) | index (i32)
//! is_array (i32) | version (i32) | meta_flag (i32)
//! child_count (i32) | TypeNode × child_count
//! ```
//!
//! ## Version ordering
//!
//! Engine-version labels are ordered by [`compare_versions`], which compares
//! labels character by character. Digits are compared one character at a
//! time, so `"9"` orders above `"10"`. Existing bundles depend on this.

mod node;
mod repository;
mod version;

use endian::CursorError;
use thiserror::Error;

pub use node::{TypeNode, MAX_TREE_DEPTH};
pub use repository::{Binding, SchemaRepository, SchemaRepositoryBuilder};
pub use version::{compare_versions, newest_label};

/// Errors produced while reading schemas or querying the repository.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No binding matched the query.
    #[error("no schema bound for class {class_id} (version {})", .version.as_deref().unwrap_or("any"))]
    NotFound {
        class_id: i32,
        version: Option<String>,
    },

    /// Structurally invalid schema data.
    #[error("malformed schema data: {0}")]
    Format(String),

    #[error(transparent)]
    Cursor(#[from] CursorError),
}

impl From<std::io::Error> for SchemaError {
    fn from(e: std::io::Error) -> Self {
        SchemaError::Cursor(CursorError::Io(e))
    }
}

#[cfg(test)]
mod tests;
