//! Metadata sub-blocks: schema table, preload table, object index and
//! external references.

use std::io::{Read, Seek, Write};
use std::path::PathBuf;
use std::sync::Arc;

use endian::{EndianReader, EndianWriter};
use typetree::TypeNode;

use crate::ContainerError;

/// Format versions above this use the wide object index and carry a
/// preload table.
pub const WIDE_INDEX_VERSION: i32 = 13;

/// Format versions above this store an asset path in each external
/// reference.
pub const ASSET_PATH_VERSION: i32 = 5;

/// Embedded schemas keyed by the type identifier objects refer to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaTable {
    /// Engine version label the container was written by.
    pub signature: String,
    pub attributes: u32,
    pub entries: Vec<(i32, Arc<TypeNode>)>,
    pub padding: [u8; 4],
}

impl SchemaTable {
    pub fn new(signature: &str) -> Self {
        Self {
            signature: signature.to_string(),
            ..Self::default()
        }
    }

    /// Embedded schema for `type_id`, if any.
    #[must_use]
    pub fn get(&self, type_id: i32) -> Option<&Arc<TypeNode>> {
        self.entries
            .iter()
            .find(|(id, _)| *id == type_id)
            .map(|(_, node)| node)
    }

    pub fn read_from<R: Read + Seek>(r: &mut EndianReader<R>) -> Result<Self, ContainerError> {
        let signature = r.read_cstring()?;
        let attributes = r.read_u32()?;
        let count = read_count(r, "schema table")?;
        let mut entries = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let class_id = r.read_i32()?;
            let node = TypeNode::read_from(r)?;
            entries.push((class_id, Arc::new(node)));
        }
        let mut padding = [0u8; 4];
        r.read_exact_into(&mut padding)?;
        Ok(Self {
            signature,
            attributes,
            entries,
            padding,
        })
    }

    pub fn write_to<W: Write + Seek>(&self, w: &mut EndianWriter<W>) -> Result<(), ContainerError> {
        w.write_cstring(&self.signature)?;
        w.write_u32(self.attributes)?;
        write_count(w, self.entries.len(), "schema table")?;
        for (class_id, node) in &self.entries {
            w.write_i32(*class_id)?;
            node.write_to(w)?;
        }
        w.write_bytes(&self.padding)?;
        Ok(())
    }
}

/// One entry of the fixed-stride table that precedes the wide object index.
/// Its meaning is unknown; it is carried verbatim.
pub type PreloadEntry = [i32; 3];

pub(crate) fn read_preload<R: Read + Seek>(
    r: &mut EndianReader<R>,
) -> Result<Vec<PreloadEntry>, ContainerError> {
    r.align(4)?;
    let count = read_count(r, "preload table")?;
    let mut entries = Vec::with_capacity(count.min(r.remaining() as usize / 12));
    for _ in 0..count {
        entries.push([r.read_i32()?, r.read_i32()?, r.read_i32()?]);
    }
    Ok(entries)
}

pub(crate) fn write_preload<W: Write + Seek>(
    w: &mut EndianWriter<W>,
    entries: &[PreloadEntry],
) -> Result<(), ContainerError> {
    w.align(4)?;
    write_count(w, entries.len(), "preload table")?;
    for entry in entries {
        for v in entry {
            w.write_i32(*v)?;
        }
    }
    Ok(())
}

/// Object index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectInfo {
    pub object_id: i64,
    /// Offset relative to the header's data offset.
    pub byte_start: u32,
    pub byte_size: u32,
    /// Key into the embedded schema table, or the class id when none.
    pub type_id: i32,
    pub class_id: i32,
    pub is_destroyed: i16,
    /// Only stored for the wide index.
    pub script_type_index: i16,
    /// Only stored for the wide index.
    pub is_stripped: bool,
}

impl ObjectInfo {
    /// An entry whose type id equals its class id.
    pub fn new(object_id: i64, class_id: i32) -> Self {
        Self {
            object_id,
            type_id: class_id,
            class_id,
            script_type_index: -1,
            ..Self::default()
        }
    }

    fn read_from<R: Read + Seek>(
        r: &mut EndianReader<R>,
        format_version: i32,
    ) -> Result<Self, ContainerError> {
        let wide = format_version > WIDE_INDEX_VERSION;
        if wide {
            r.align(4)?;
        }
        let object_id = if wide {
            r.read_i64()?
        } else {
            i64::from(r.read_i32()?)
        };
        let mut info = Self {
            object_id,
            byte_start: r.read_u32()?,
            byte_size: r.read_u32()?,
            type_id: r.read_i32()?,
            class_id: i32::from(r.read_i16()?),
            is_destroyed: r.read_i16()?,
            script_type_index: -1,
            is_stripped: false,
        };
        if wide {
            info.script_type_index = r.read_i16()?;
            info.is_stripped = r.read_bool()?;
        }
        Ok(info)
    }

    fn write_to<W: Write + Seek>(
        &self,
        w: &mut EndianWriter<W>,
        format_version: i32,
    ) -> Result<(), ContainerError> {
        let wide = format_version > WIDE_INDEX_VERSION;
        if wide {
            w.align(4)?;
            w.write_i64(self.object_id)?;
        } else {
            let id = i32::try_from(self.object_id).map_err(|_| {
                ContainerError::Format(format!(
                    "object id {} does not fit the 32-bit index of format {format_version}",
                    self.object_id
                ))
            })?;
            w.write_i32(id)?;
        }
        w.write_u32(self.byte_start)?;
        w.write_u32(self.byte_size)?;
        w.write_i32(self.type_id)?;
        let class_id = i16::try_from(self.class_id).map_err(|_| {
            ContainerError::Format(format!(
                "class id {} of object {} does not fit 16 bits",
                self.class_id, self.object_id
            ))
        })?;
        w.write_i16(class_id)?;
        w.write_i16(self.is_destroyed)?;
        if wide {
            w.write_i16(self.script_type_index)?;
            w.write_bool(self.is_stripped)?;
        }
        Ok(())
    }
}

pub(crate) fn read_object_index<R: Read + Seek>(
    r: &mut EndianReader<R>,
    format_version: i32,
) -> Result<Vec<ObjectInfo>, ContainerError> {
    let count = read_count(r, "object index")?;
    let mut infos = Vec::with_capacity(count.min(r.remaining() as usize / 20));
    for _ in 0..count {
        infos.push(ObjectInfo::read_from(r, format_version)?);
    }
    Ok(infos)
}

pub(crate) fn write_object_index<'a, W, I>(
    w: &mut EndianWriter<W>,
    format_version: i32,
    infos: I,
) -> Result<(), ContainerError>
where
    W: Write + Seek,
    I: ExactSizeIterator<Item = &'a ObjectInfo>,
{
    write_count(w, infos.len(), "object index")?;
    for info in infos {
        info.write_to(w, format_version)?;
    }
    Ok(())
}

/// Reference from one container to another.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExternalReference {
    /// Absent for format versions up to 5.
    pub asset_path: Option<String>,
    pub guid: [u8; 16],
    pub ref_type: i32,
    pub file_path: String,
    /// Canonical path of the loaded target, set by reference resolution.
    pub resolved: Option<PathBuf>,
}

impl ExternalReference {
    pub fn new(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            ..Self::default()
        }
    }

    fn read_from<R: Read + Seek>(
        r: &mut EndianReader<R>,
        format_version: i32,
    ) -> Result<Self, ContainerError> {
        let asset_path = if format_version > ASSET_PATH_VERSION {
            Some(r.read_cstring()?)
        } else {
            None
        };
        let mut guid = [0u8; 16];
        r.read_exact_into(&mut guid)?;
        Ok(Self {
            asset_path,
            guid,
            ref_type: r.read_i32()?,
            file_path: r.read_cstring()?,
            resolved: None,
        })
    }

    fn write_to<W: Write + Seek>(
        &self,
        w: &mut EndianWriter<W>,
        format_version: i32,
    ) -> Result<(), ContainerError> {
        if format_version > ASSET_PATH_VERSION {
            w.write_cstring(self.asset_path.as_deref().unwrap_or(""))?;
        }
        w.write_bytes(&self.guid)?;
        w.write_i32(self.ref_type)?;
        w.write_cstring(&self.file_path)?;
        Ok(())
    }
}

pub(crate) fn read_externals<R: Read + Seek>(
    r: &mut EndianReader<R>,
    format_version: i32,
) -> Result<Vec<ExternalReference>, ContainerError> {
    let count = read_count(r, "external references")?;
    let mut refs = Vec::with_capacity(count.min(r.remaining() as usize / 21));
    for _ in 0..count {
        refs.push(ExternalReference::read_from(r, format_version)?);
    }
    Ok(refs)
}

pub(crate) fn write_externals<W: Write + Seek>(
    w: &mut EndianWriter<W>,
    format_version: i32,
    refs: &[ExternalReference],
) -> Result<(), ContainerError> {
    write_count(w, refs.len(), "external references")?;
    for reference in refs {
        reference.write_to(w, format_version)?;
    }
    Ok(())
}

fn read_count<R: Read + Seek>(r: &mut EndianReader<R>, what: &str) -> Result<usize, ContainerError> {
    let offset = r.position();
    let count = r.read_i32()?;
    usize::try_from(count).map_err(|_| {
        ContainerError::Format(format!("negative {what} count {count} at offset {offset}"))
    })
}

fn write_count<W: Write + Seek>(
    w: &mut EndianWriter<W>,
    len: usize,
    what: &str,
) -> Result<(), ContainerError> {
    let count = i32::try_from(len)
        .map_err(|_| ContainerError::Format(format!("too many {what} entries: {len}")))?;
    w.write_i32(count)?;
    Ok(())
}
