//! # Endian - position-tracked binary cursor
//!
//! Sequential reader and writer used by every other crate in the workspace to
//! touch container bytes. Both sides carry a switchable [`ByteOrder`] flag,
//! know their current absolute position, and can pad to an alignment
//! boundary.
//!
//! The container format mixes byte orders inside a single stream: the file
//! header is always big-endian while the body uses whatever the header
//! declares. Callers switch with [`EndianReader::set_order`] /
//! [`EndianWriter::set_order`] at the exact point the layout changes.
//!
//! ## Bounds
//!
//! The reader captures the stream length when it is constructed. Every read
//! is checked against it *before* touching the underlying stream, so a
//! corrupt count can never trigger a giant allocation; the check fails with
//! [`CursorError::Bounds`] instead.
//!
//! ## Example
//!
//! ```rust
//! use endian::{ByteOrder, EndianReader};
//!
//! let bytes = [0u8, 0, 0, 1];
//! let mut be = EndianReader::from_bytes(&bytes, ByteOrder::Big);
//! assert_eq!(be.read_i32().unwrap(), 1);
//!
//! let mut le = EndianReader::from_bytes(&bytes, ByteOrder::Little);
//! assert_eq!(le.read_i32().unwrap(), 16_777_216);
//! ```

mod reader;
mod writer;

use std::io;

use thiserror::Error;

pub use reader::EndianReader;
pub use writer::EndianWriter;

/// Byte order of multi-byte scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Decodes the container's endianness flag byte (`0` = little, anything
    /// else = big).
    #[must_use]
    pub fn from_flag(flag: u8) -> Self {
        if flag == 0 {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }

    /// Encodes this byte order as the container flag byte.
    #[must_use]
    pub fn flag(self) -> u8 {
        match self {
            ByteOrder::Little => 0,
            ByteOrder::Big => 1,
        }
    }

    /// Byte order of the machine running this code.
    #[must_use]
    pub fn native() -> Self {
        if cfg!(target_endian = "little") {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        }
    }
}

/// Errors raised by [`EndianReader`] and [`EndianWriter`].
#[derive(Debug, Error)]
pub enum CursorError {
    /// A read or seek would leave the known extent of the stream.
    #[error("out of bounds: {requested} byte(s) at offset {offset} exceed stream length {len}")]
    Bounds {
        offset: u64,
        requested: u64,
        len: u64,
    },

    /// A null-terminated string was not valid UTF-8.
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: u64 },

    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Number of zero bytes needed to move `pos` to the next multiple of
/// `alignment`. An alignment of 0 or 1 never pads.
#[must_use]
pub fn padding_for(pos: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return 0;
    }
    (alignment - pos % alignment) % alignment
}
