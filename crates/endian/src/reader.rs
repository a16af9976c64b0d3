use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::{padding_for, ByteOrder, CursorError};

/// Generates a bounds-checked, order-aware scalar read.
macro_rules! read_scalar {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $width:expr) => {
        $(#[$meta])*
        pub fn $name(&mut self) -> Result<$ty, CursorError> {
            self.ensure($width)?;
            let v = match self.order {
                ByteOrder::Little => ReadBytesExt::$name::<LittleEndian>(&mut self.inner)?,
                ByteOrder::Big => ReadBytesExt::$name::<BigEndian>(&mut self.inner)?,
            };
            self.pos += $width;
            Ok(v)
        }
    };
}

/// Sequential reader with a switchable byte order and a fixed known length.
///
/// The position is tracked locally so that callers can mark block boundaries
/// without issuing extra `seek` calls on the underlying stream.
pub struct EndianReader<R> {
    inner: R,
    order: ByteOrder,
    pos: u64,
    len: u64,
}

impl<'a> EndianReader<Cursor<&'a [u8]>> {
    /// Wraps an in-memory byte slice.
    pub fn from_bytes(bytes: &'a [u8], order: ByteOrder) -> Self {
        Self {
            len: bytes.len() as u64,
            inner: Cursor::new(bytes),
            order,
            pos: 0,
        }
    }
}

impl EndianReader<BufReader<File>> {
    /// Opens a file for reading. The handle is released when the reader is
    /// dropped.
    pub fn open<P: AsRef<Path>>(path: P, order: ByteOrder) -> Result<Self, CursorError> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            inner: BufReader::new(file),
            order,
            pos: 0,
            len,
        })
    }
}

impl<R: Read + Seek> EndianReader<R> {
    /// Wraps any seekable stream. Reading starts at the stream's current
    /// position; the length is taken from the end of the stream.
    pub fn new(mut inner: R, order: ByteOrder) -> Result<Self, CursorError> {
        let pos = inner.stream_position()?;
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(pos))?;
        Ok(Self {
            inner,
            order,
            pos,
            len,
        })
    }

    /// Current byte order.
    #[must_use]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Switches the byte order for all subsequent reads.
    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Absolute position in the stream.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Total length of the stream captured at construction.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the stream holds no bytes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes left between the position and the end of the stream.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    /// Moves to an absolute position. Seeking exactly to the end is allowed.
    pub fn seek(&mut self, pos: u64) -> Result<(), CursorError> {
        if pos > self.len {
            return Err(CursorError::Bounds {
                offset: pos,
                requested: 0,
                len: self.len,
            });
        }
        self.inner.seek(SeekFrom::Start(pos))?;
        self.pos = pos;
        Ok(())
    }

    /// Moves `delta` bytes relative to the current position.
    pub fn skip(&mut self, delta: i64) -> Result<(), CursorError> {
        let target = self
            .pos
            .checked_add_signed(delta)
            .ok_or(CursorError::Bounds {
                offset: self.pos,
                requested: delta.unsigned_abs(),
                len: self.len,
            })?;
        self.seek(target)
    }

    /// Skips padding up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: u64) -> Result<(), CursorError> {
        let pad = padding_for(self.pos, alignment);
        if pad > 0 {
            self.ensure(pad)?;
            self.seek(self.pos + pad)?;
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        self.ensure(1)?;
        let v = self.inner.read_u8()?;
        self.pos += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8, CursorError> {
        self.ensure(1)?;
        let v = self.inner.read_i8()?;
        self.pos += 1;
        Ok(v)
    }

    /// Reads one byte as a boolean (any non-zero value is `true`).
    pub fn read_bool(&mut self) -> Result<bool, CursorError> {
        Ok(self.read_u8()? != 0)
    }

    read_scalar!(read_u16, u16, 2);
    read_scalar!(read_i16, i16, 2);
    read_scalar!(read_u32, u32, 4);
    read_scalar!(read_i32, i32, 4);
    read_scalar!(read_u64, u64, 8);
    read_scalar!(read_i64, i64, 8);
    read_scalar!(read_f32, f32, 4);
    read_scalar!(read_f64, f64, 8);

    /// Reads exactly `n` raw bytes. Bounds are checked before allocating.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, CursorError> {
        self.ensure(n as u64)?;
        let mut buf = vec![0u8; n];
        self.inner.read_exact(&mut buf)?;
        self.pos += n as u64;
        Ok(buf)
    }

    /// Fills `buf` completely from the stream.
    pub fn read_exact_into(&mut self, buf: &mut [u8]) -> Result<(), CursorError> {
        self.ensure(buf.len() as u64)?;
        self.inner.read_exact(buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    /// Reads a null-terminated UTF-8 string. The terminator is consumed but
    /// not returned.
    pub fn read_cstring(&mut self) -> Result<String, CursorError> {
        let start = self.pos;
        let mut bytes = Vec::new();
        loop {
            let b = self.read_u8()?;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        String::from_utf8(bytes).map_err(|_| CursorError::InvalidUtf8 { offset: start })
    }

    /// Consumes the reader and returns the wrapped stream.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn ensure(&self, n: u64) -> Result<(), CursorError> {
        match self.pos.checked_add(n) {
            Some(end) if end <= self.len => Ok(()),
            _ => Err(CursorError::Bounds {
                offset: self.pos,
                requested: n,
                len: self.len,
            }),
        }
    }
}
