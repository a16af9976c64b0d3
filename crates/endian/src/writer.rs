use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use std::io::{Cursor, Seek, SeekFrom, Write};

use crate::{padding_for, ByteOrder, CursorError};

macro_rules! write_scalar {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $width:expr) => {
        $(#[$meta])*
        pub fn $name(&mut self, v: $ty) -> Result<(), CursorError> {
            match self.order {
                ByteOrder::Little => WriteBytesExt::$name::<LittleEndian>(&mut self.inner, v)?,
                ByteOrder::Big => WriteBytesExt::$name::<BigEndian>(&mut self.inner, v)?,
            }
            self.advance($width);
            Ok(())
        }
    };
}

/// Sequential writer with a switchable byte order.
///
/// Tracks the furthest byte written (`len`) so that callers can seek back
/// into already-written regions and patch them, then return to the end.
pub struct EndianWriter<W> {
    inner: W,
    order: ByteOrder,
    pos: u64,
    len: u64,
}

impl EndianWriter<Cursor<Vec<u8>>> {
    /// Creates a writer over a fresh in-memory buffer.
    #[must_use]
    pub fn in_memory(order: ByteOrder) -> Self {
        Self {
            inner: Cursor::new(Vec::new()),
            order,
            pos: 0,
            len: 0,
        }
    }

    /// Consumes the writer and returns the written bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

impl<W: Write + Seek> EndianWriter<W> {
    /// Wraps a seekable stream. Writing continues at the stream's current
    /// position; the existing end of the stream counts as written extent.
    pub fn new(mut inner: W, order: ByteOrder) -> Result<Self, CursorError> {
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

    #[must_use]
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Switches the byte order for all subsequent writes.
    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Absolute write position.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Furthest extent written so far.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Moves to an absolute position inside the written extent.
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

    /// Returns to the end of the written extent.
    pub fn seek_end(&mut self) -> Result<(), CursorError> {
        self.seek(self.len)
    }

    /// Writes zero bytes up to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: u64) -> Result<(), CursorError> {
        let pad = padding_for(self.pos, alignment);
        if pad > 0 {
            self.write_bytes(&vec![0u8; pad as usize])?;
        }
        Ok(())
    }

    pub fn write_u8(&mut self, v: u8) -> Result<(), CursorError> {
        self.inner.write_u8(v)?;
        self.advance(1);
        Ok(())
    }

    pub fn write_i8(&mut self, v: i8) -> Result<(), CursorError> {
        self.inner.write_i8(v)?;
        self.advance(1);
        Ok(())
    }

    pub fn write_bool(&mut self, v: bool) -> Result<(), CursorError> {
        self.write_u8(u8::from(v))
    }

    write_scalar!(write_u16, u16, 2);
    write_scalar!(write_i16, i16, 2);
    write_scalar!(write_u32, u32, 4);
    write_scalar!(write_i32, i32, 4);
    write_scalar!(write_u64, u64, 8);
    write_scalar!(write_i64, i64, 8);
    write_scalar!(write_f32, f32, 4);
    write_scalar!(write_f64, f64, 8);

    /// Writes raw bytes verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CursorError> {
        self.inner.write_all(bytes)?;
        self.advance(bytes.len() as u64);
        Ok(())
    }

    /// Writes `s` followed by a null terminator.
    pub fn write_cstring(&mut self, s: &str) -> Result<(), CursorError> {
        self.write_bytes(s.as_bytes())?;
        self.write_u8(0)
    }

    /// Flushes the underlying stream.
    pub fn flush(&mut self) -> Result<(), CursorError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consumes the writer and returns the wrapped stream.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn advance(&mut self, n: u64) {
        self.pos += n;
        self.len = self.len.max(self.pos);
    }
}
