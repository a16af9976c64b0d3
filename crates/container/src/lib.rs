//! # Container - asset container load and save
//!
//! Reads a serialized asset container into memory, binds every object to a
//! schema, and writes it back with freshly computed offsets.
//!
//! ## File layout (format 9 and later)
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ HEADER (big-endian)                                       │
//! │ metadata_size u32 | file_size u32 | format i32            │
//! │ data_offset u32 | endianness u8 | reserved [u8; 3]        │
//! ├──────────────────────────────────────────────────────────┤
//! │ SCHEMA TABLE (body byte order from here on)               │
//! │ signature cstr | attributes u32 | count i32               │
//! │ (class_id i32, TypeNode) × count | padding [u8; 4]        │
//! ├──────────────────────────────────────────────────────────┤
//! │ PRELOAD TABLE (format > 13 only)                          │
//! │ align 4 | count i32 | (i32, i32, i32) × count             │
//! ├──────────────────────────────────────────────────────────┤
//! │ OBJECT INDEX                                              │
//! │ count i32 | ObjectInfo × count                            │
//! ├──────────────────────────────────────────────────────────┤
//! │ EXTERNAL REFERENCES                                       │
//! │ count i32 | ExternalReference × count                     │
//! ├──────────────────────────────────────────────────────────┤
//! │ zero padding to at least 4096, then to a multiple of 16   │
//! ├──────────────────────────────────────────────────────────┤
//! │ OBJECT DATA (each object aligned to 8)                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Formats below 9 put the object data directly after a 16-byte header, then
//! the body endianness flag, the metadata and a single zero byte. The flag sits
//! at `file_size - metadata_size`.
//!
//! ## Object index entry
//!
//! | Format | Layout                                                                 |
//! |--------|------------------------------------------------------------------------|
//! | ≤ 13   | id i32, start u32, size u32, type i32, class i16, destroyed i16        |
//! | > 13   | align 4, id i64, start u32, size u32, type i32, class i16, destroyed i16, script i16, stripped u8 |

mod container;
mod extents;
mod header;
mod metadata;
mod references;

use std::io;
use std::ops::RangeInclusive;

use codec::CodecError;
use endian::CursorError;
use thiserror::Error;
use typetree::SchemaError;

pub use container::{Container, Object};
pub use extents::{BlockExtents, Extent};
pub use header::{Header, MODERN_LAYOUT_VERSION};
pub use metadata::{
    ExternalReference, ObjectInfo, PreloadEntry, SchemaTable, ASSET_PATH_VERSION,
    WIDE_INDEX_VERSION,
};
pub use references::ReferenceGraph;

/// Format versions this crate can load and save.
pub const SUPPORTED_FORMAT_VERSIONS: RangeInclusive<i32> = 5..=17;

/// Class whose objects are expected to carry no schema.
pub const MONO_BEHAVIOUR_CLASS_ID: i32 = 114;

/// Modern layouts pad the metadata to at least this offset before the
/// object data.
pub const METADATA_PADDING: u64 = 4096;

/// Errors produced while loading, editing or saving a container.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("unsupported container format version {0}")]
    UnsupportedVersion(i32),

    #[error("malformed container: {0}")]
    Format(String),

    /// Two logical blocks overlap. Always an internal bug.
    #[error("block '{first}' overlaps block '{second}': {detail}")]
    InvariantViolation {
        first: &'static str,
        second: &'static str,
        detail: String,
    },

    #[error("no object with id {0}")]
    ObjectNotFound(i64),

    #[error("object {object_id} (class {class_id}) has no schema")]
    NoSchema { object_id: i64, class_id: i32 },

    #[error(transparent)]
    Cursor(#[from] CursorError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests;
