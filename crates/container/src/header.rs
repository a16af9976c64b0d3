use std::io::{Read, Seek, Write};

use endian::{ByteOrder, EndianReader, EndianWriter};

use crate::{ContainerError, SUPPORTED_FORMAT_VERSIONS};

/// First format version whose header carries the endianness flag and whose
/// metadata precedes the object data.
pub const MODERN_LAYOUT_VERSION: i32 = 9;

/// Fixed-size container header. Always stored big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub metadata_size: u32,
    pub file_size: u32,
    pub format_version: i32,
    pub data_offset: u32,
    /// Body byte order flag (0 = little). Legacy layouts store it in front of
    /// the metadata rather than in the header.
    pub endianness: u8,
    pub reserved: [u8; 3],
}

impl Header {
    pub fn new(format_version: i32, order: ByteOrder) -> Self {
        Self {
            format_version,
            endianness: order.flag(),
            ..Self::default()
        }
    }

    /// Legacy layouts store object data before the metadata.
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.format_version < MODERN_LAYOUT_VERSION
    }

    /// Encoded size of this header.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        if self.is_legacy() {
            16
        } else {
            20
        }
    }

    /// Reads a header, switching the reader to big-endian. The reader's
    /// order is left big-endian.
    pub fn read_from<R: Read + Seek>(r: &mut EndianReader<R>) -> Result<Self, ContainerError> {
        r.set_order(ByteOrder::Big);
        let metadata_size = r.read_u32()?;
        let file_size = r.read_u32()?;
        let format_version = r.read_i32()?;
        if !SUPPORTED_FORMAT_VERSIONS.contains(&format_version) {
            return Err(ContainerError::UnsupportedVersion(format_version));
        }
        let data_offset = r.read_u32()?;

        let mut header = Self {
            metadata_size,
            file_size,
            format_version,
            data_offset,
            endianness: 0,
            reserved: [0; 3],
        };
        if !header.is_legacy() {
            header.endianness = r.read_u8()?;
            r.read_exact_into(&mut header.reserved)?;
        }
        Ok(header)
    }

    /// Writes the header big-endian and restores the writer's previous order.
    pub fn write_to<W: Write + Seek>(&self, w: &mut EndianWriter<W>) -> Result<(), ContainerError> {
        let body_order = w.order();
        w.set_order(ByteOrder::Big);
        w.write_u32(self.metadata_size)?;
        w.write_u32(self.file_size)?;
        w.write_i32(self.format_version)?;
        w.write_u32(self.data_offset)?;
        if !self.is_legacy() {
            w.write_u8(self.endianness)?;
            w.write_bytes(&self.reserved)?;
        }
        w.set_order(body_order);
        Ok(())
    }
}
