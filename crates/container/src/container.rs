use std::collections::HashSet;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use codec::Value;
use endian::{ByteOrder, EndianReader, EndianWriter};
use tracing::{debug, warn};
use typetree::{SchemaRepository, TypeNode};

use crate::extents::DataSpan;
use crate::metadata::{
    read_externals, read_object_index, read_preload, write_externals, write_object_index,
    write_preload,
};
use crate::{
    BlockExtents, ContainerError, Extent, ExternalReference, Header, ObjectInfo, PreloadEntry,
    SchemaTable, METADATA_PADDING, MONO_BEHAVIOUR_CLASS_ID, SUPPORTED_FORMAT_VERSIONS,
    WIDE_INDEX_VERSION,
};

/// One serialized object: its index entry, its raw bytes and the schema it
/// was bound to. Objects without a schema are carried as opaque bytes.
#[derive(Debug, Clone)]
pub struct Object {
    info: ObjectInfo,
    bytes: Vec<u8>,
    schema: Option<Arc<TypeNode>>,
}

impl Object {
    #[must_use]
    pub fn info(&self) -> &ObjectInfo {
        &self.info
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn schema(&self) -> Option<&Arc<TypeNode>> {
        self.schema.as_ref()
    }

    /// `true` when no schema could be found for this object.
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.schema.is_none()
    }
}

/// An asset container held fully in memory.
///
/// Loading parses all metadata and copies every object's bytes out of the
/// data region. Saving recomputes every offset, size and padding from the
/// current content.
#[derive(Debug, Clone)]
pub struct Container {
    path: Option<PathBuf>,
    header: Header,
    order: ByteOrder,
    schema_table: SchemaTable,
    preload: Vec<PreloadEntry>,
    objects: Vec<Object>,
    externals: Vec<ExternalReference>,
    extents: BlockExtents,
}

impl Container {
    /// An empty container for `format_version`, written by engine version
    /// `signature`.
    pub fn new(
        format_version: i32,
        order: ByteOrder,
        signature: &str,
    ) -> Result<Self, ContainerError> {
        if !SUPPORTED_FORMAT_VERSIONS.contains(&format_version) {
            return Err(ContainerError::UnsupportedVersion(format_version));
        }
        Ok(Self {
            path: None,
            header: Header::new(format_version, order),
            order,
            schema_table: SchemaTable::new(signature),
            preload: Vec::new(),
            objects: Vec::new(),
            externals: Vec::new(),
            extents: BlockExtents::default(),
        })
    }

    /// Loads a container file. The file handle is released before returning.
    ///
    /// A path whose extension starts with `split` names one fragment of a
    /// split container: `<name>.split0`, `<name>.split1`, ... are joined in
    /// order up to the first missing index and parsed as one container whose
    /// path is `<name>`.
    pub fn open<P: AsRef<Path>>(path: P, repo: &SchemaRepository) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        let (mut container, path) = match split_parts(path) {
            Some((joined, parts)) => {
                if parts.is_empty() {
                    return Err(ContainerError::Format(format!(
                        "no split parts found for {}",
                        joined.display()
                    )));
                }
                let mut bytes = Vec::new();
                for part in &parts {
                    debug!(part = %part.display(), "adding split part");
                    bytes.extend_from_slice(&fs::read(part)?);
                }
                (Self::from_bytes(&bytes, repo)?, joined)
            }
            None => {
                let mut r = EndianReader::open(path, ByteOrder::Big)?;
                (Self::read_from(&mut r, repo)?, path.to_path_buf())
            }
        };
        debug!(
            path = %path.display(),
            format = container.header.format_version,
            objects = container.objects.len(),
            externals = container.externals.len(),
            "loaded container"
        );
        container.path = Some(path);
        Ok(container)
    }

    /// Parses a container held in memory.
    pub fn from_bytes(bytes: &[u8], repo: &SchemaRepository) -> Result<Self, ContainerError> {
        let mut r = EndianReader::from_bytes(bytes, ByteOrder::Big);
        Self::read_from(&mut r, repo)
    }

    /// Parses a container that starts at offset 0 of `r`.
    pub fn read_from<R: Read + Seek>(
        r: &mut EndianReader<R>,
        repo: &SchemaRepository,
    ) -> Result<Self, ContainerError> {
        r.seek(0)?;
        let mut header = Header::read_from(r)?;
        let header_extent = Extent::new(0, r.position());
        let format_version = header.format_version;

        let order = if header.is_legacy() {
            let flag_pos = u64::from(header.file_size)
                .checked_sub(u64::from(header.metadata_size))
                .filter(|pos| *pos >= header_extent.end)
                .ok_or_else(|| {
                    ContainerError::Format(format!(
                        "metadata size {} does not fit file size {}",
                        header.metadata_size, header.file_size
                    ))
                })?;
            r.seek(flag_pos)?;
            header.endianness = r.read_u8()?;
            ByteOrder::from_flag(header.endianness)
        } else {
            ByteOrder::from_flag(header.endianness)
        };
        r.set_order(order);

        let start = r.position();
        let schema_table = SchemaTable::read_from(r)?;
        let preload = if format_version > WIDE_INDEX_VERSION {
            read_preload(r)?
        } else {
            Vec::new()
        };
        let schema_extent = Extent::new(start, r.position());

        let start = r.position();
        let infos = read_object_index(r, format_version)?;
        let index_extent = Extent::new(start, r.position());

        let start = r.position();
        let externals = read_externals(r, format_version)?;
        let externals_extent = Extent::new(start, r.position());

        let mut seen = HashSet::with_capacity(infos.len());
        let mut span = DataSpan::new();
        let mut ranges = Vec::with_capacity(infos.len());
        let mut objects = Vec::with_capacity(infos.len());
        for info in infos {
            if !seen.insert(info.object_id) {
                return Err(ContainerError::Format(format!(
                    "object id {} appears twice in the index",
                    info.object_id
                )));
            }
            let offset = u64::from(header.data_offset) + u64::from(info.byte_start);
            r.seek(offset)?;
            let bytes = r.read_bytes(info.byte_size as usize)?;
            span.add(offset, u64::from(info.byte_size));
            ranges.push((Extent::new(offset, offset + u64::from(info.byte_size)), info.object_id));

            let schema = resolve_schema(&info, &schema_table, repo);
            objects.push(Object {
                info,
                bytes,
                schema,
            });
        }

        check_object_ranges(&mut ranges)?;

        let extents = BlockExtents {
            header: header_extent,
            schema_table: schema_extent,
            object_index: index_extent,
            externals: externals_extent,
            object_data: span.extent(),
        };
        log_extents(&extents);
        extents.check_disjoint()?;

        Ok(Self {
            path: None,
            header,
            order,
            schema_table,
            preload,
            objects,
            externals,
            extents,
        })
    }

    /// Writes the container to `path` through a temporary sibling file that is
    /// synced and then renamed over the target.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<(), ContainerError> {
        let path = path.as_ref();
        let tmp_path = tmp_path_for(path);
        let snapshot = self.snapshot();

        if let Err(e) = self.write_file(&tmp_path, path) {
            let _ = fs::remove_file(&tmp_path);
            self.restore(snapshot);
            return Err(e);
        }

        self.path = Some(path.to_path_buf());
        debug!(
            path = %path.display(),
            file_size = self.header.file_size,
            metadata_size = self.header.metadata_size,
            "saved container"
        );
        Ok(())
    }

    fn write_file(&mut self, tmp_path: &Path, path: &Path) -> Result<(), ContainerError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp_path)?;
        let mut w = EndianWriter::new(BufWriter::new(file), self.order)?;
        self.save_to_writer(&mut w)?;

        let file = w.into_inner().into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    /// Serializes the container into a new byte vector.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>, ContainerError> {
        let mut w = EndianWriter::in_memory(self.order);
        self.save_to_writer(&mut w)?;
        Ok(w.into_bytes())
    }

    /// Writes the container into an empty stream, updating the header and
    /// every object's offset to match what was written. On error the header,
    /// offsets and extents keep their previous values.
    pub fn save_to_writer<W: Write + Seek>(
        &mut self,
        w: &mut EndianWriter<W>,
    ) -> Result<(), ContainerError> {
        if !w.is_empty() {
            return Err(ContainerError::Format(
                "containers must be written to an empty stream".to_string(),
            ));
        }
        let snapshot = self.snapshot();
        let result = self.write_layout(w);
        if result.is_err() {
            self.restore(snapshot);
        }
        result
    }

    fn write_layout<W: Write + Seek>(
        &mut self,
        w: &mut EndianWriter<W>,
    ) -> Result<(), ContainerError> {
        let format_version = self.header.format_version;
        let legacy = self.header.is_legacy();

        // Placeholder; rewritten once sizes are known.
        self.header.write_to(w)?;
        let header_extent = Extent::new(0, w.position());
        w.set_order(self.order);

        let (schema_extent, index_extent, externals_extent, data_extent) = if legacy {
            self.header.data_offset = 0;
            self.header.endianness = self.order.flag();
            let data = self.write_objects(w)?;
            w.write_u8(self.order.flag())?;
            let (schema, index, externals) = self.write_metadata(w)?;
            w.write_u8(0)?;
            (schema, index, externals, data)
        } else {
            self.header.endianness = self.order.flag();
            let (schema, index, externals) = self.write_metadata(w)?;

            if w.position() < METADATA_PADDING {
                w.align(METADATA_PADDING)?;
            }
            w.align(16)?;
            self.header.data_offset = to_u32(w.position(), "data offset")?;
            let data = self.write_objects(w)?;

            // The index written above still holds the old offsets.
            w.seek(index.start)?;
            write_object_index(w, format_version, self.objects.iter().map(|o| &o.info))?;
            w.seek_end()?;
            (schema, index, externals, data)
        };

        self.header.file_size = to_u32(w.len(), "file size")?;
        let adjust = if legacy { 2 } else { 1 };
        self.header.metadata_size = to_u32(
            schema_extent.len() + index_extent.len() + externals_extent.len() + adjust,
            "metadata size",
        )?;

        w.seek(header_extent.start)?;
        self.header.write_to(w)?;
        w.seek_end()?;
        w.flush()?;

        self.extents = BlockExtents {
            header: header_extent,
            schema_table: schema_extent,
            object_index: index_extent,
            externals: externals_extent,
            object_data: data_extent,
        };
        log_extents(&self.extents);
        self.extents.check_disjoint()
    }

    fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            header: self.header,
            extents: self.extents,
            infos: self.objects.iter().map(|o| o.info).collect(),
        }
    }

    fn restore(&mut self, snapshot: LayoutSnapshot) {
        self.header = snapshot.header;
        self.extents = snapshot.extents;
        for (object, info) in self.objects.iter_mut().zip(snapshot.infos) {
            object.info = info;
        }
    }

    fn write_metadata<W: Write + Seek>(
        &self,
        w: &mut EndianWriter<W>,
    ) -> Result<(Extent, Extent, Extent), ContainerError> {
        let format_version = self.header.format_version;

        let start = w.position();
        self.schema_table.write_to(w)?;
        if format_version > WIDE_INDEX_VERSION {
            write_preload(w, &self.preload)?;
        }
        let schema = Extent::new(start, w.position());

        let start = w.position();
        write_object_index(w, format_version, self.objects.iter().map(|o| &o.info))?;
        let index = Extent::new(start, w.position());

        let start = w.position();
        write_externals(w, format_version, &self.externals)?;
        let externals = Extent::new(start, w.position());

        Ok((schema, index, externals))
    }

    fn write_objects<W: Write + Seek>(
        &mut self,
        w: &mut EndianWriter<W>,
    ) -> Result<Extent, ContainerError> {
        let data_offset = u64::from(self.header.data_offset);
        let mut span = DataSpan::new();
        for object in &mut self.objects {
            w.align(8)?;
            let pos = w.position();
            let len = object.bytes.len() as u64;
            span.add(pos, len);
            object.info.byte_start = to_u32(pos - data_offset, "object offset")?;
            object.info.byte_size = to_u32(len, "object size")?;
            w.write_bytes(&object.bytes)?;
        }
        Ok(span.extent())
    }

    // -------------------- Objects --------------------

    /// All objects in index order.
    #[must_use]
    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    #[must_use]
    pub fn object(&self, object_id: i64) -> Option<&Object> {
        self.objects.iter().find(|o| o.info.object_id == object_id)
    }

    /// Appends an object and binds it to a schema the same way loading does.
    pub fn add_object(
        &mut self,
        info: ObjectInfo,
        bytes: Vec<u8>,
        repo: &SchemaRepository,
    ) -> Result<(), ContainerError> {
        if self.object(info.object_id).is_some() {
            return Err(ContainerError::Format(format!(
                "object id {} already exists",
                info.object_id
            )));
        }
        let mut info = info;
        info.byte_size = to_u32(bytes.len() as u64, "object size")?;
        let schema = resolve_schema(&info, &self.schema_table, repo);
        self.objects.push(Object {
            info,
            bytes,
            schema,
        });
        Ok(())
    }

    /// Decodes an object with its bound schema.
    pub fn decode_object(&self, object_id: i64) -> Result<Value, ContainerError> {
        let object = self.find(object_id)?;
        let schema = object.schema.as_ref().ok_or(ContainerError::NoSchema {
            object_id,
            class_id: object.info.class_id,
        })?;
        Ok(codec::decode_bytes(schema, &object.bytes, self.order)?)
    }

    /// Replaces an object's bytes with the encoding of `value`.
    pub fn encode_object(&mut self, object_id: i64, value: &Value) -> Result<(), ContainerError> {
        let order = self.order;
        let object = self.find_mut(object_id)?;
        let schema = object.schema.as_ref().ok_or(ContainerError::NoSchema {
            object_id,
            class_id: object.info.class_id,
        })?;
        object.bytes = codec::encode_to_vec(schema, value, order)?;
        object.info.byte_size = to_u32(object.bytes.len() as u64, "object size")?;
        Ok(())
    }

    /// Replaces an object's raw bytes. Works for opaque objects too.
    pub fn set_object_bytes(&mut self, object_id: i64, bytes: Vec<u8>) -> Result<(), ContainerError> {
        let object = self.find_mut(object_id)?;
        object.info.byte_size = to_u32(bytes.len() as u64, "object size")?;
        object.bytes = bytes;
        Ok(())
    }

    /// Number of bytes the object's schema accounts for, measured without
    /// decoding.
    pub fn object_byte_len(&self, object_id: i64) -> Result<u64, ContainerError> {
        let object = self.find(object_id)?;
        let schema = object.schema.as_ref().ok_or(ContainerError::NoSchema {
            object_id,
            class_id: object.info.class_id,
        })?;
        Ok(codec::measure_bytes(schema, &object.bytes, self.order)?)
    }

    fn find(&self, object_id: i64) -> Result<&Object, ContainerError> {
        self.object(object_id)
            .ok_or(ContainerError::ObjectNotFound(object_id))
    }

    fn find_mut(&mut self, object_id: i64) -> Result<&mut Object, ContainerError> {
        self.objects
            .iter_mut()
            .find(|o| o.info.object_id == object_id)
            .ok_or(ContainerError::ObjectNotFound(object_id))
    }

    // -------------------- Metadata --------------------

    /// Embeds `node` under `type_id` and rebinds objects of that type to it.
    pub fn embed_schema(&mut self, type_id: i32, node: TypeNode) {
        let node = Arc::new(node);
        match self
            .schema_table
            .entries
            .iter_mut()
            .find(|(id, _)| *id == type_id)
        {
            Some(entry) => entry.1 = Arc::clone(&node),
            None => self.schema_table.entries.push((type_id, Arc::clone(&node))),
        }
        for object in self.objects.iter_mut().filter(|o| o.info.type_id == type_id) {
            object.schema = Some(Arc::clone(&node));
        }
    }

    pub fn add_external(&mut self, reference: ExternalReference) {
        self.externals.push(reference);
    }

    #[must_use]
    pub fn externals(&self) -> &[ExternalReference] {
        &self.externals
    }

    pub(crate) fn externals_mut(&mut self) -> &mut [ExternalReference] {
        &mut self.externals
    }

    #[must_use]
    pub fn preload_table(&self) -> &[PreloadEntry] {
        &self.preload
    }

    /// Only written for format versions above 13.
    pub fn set_preload_table(&mut self, entries: Vec<PreloadEntry>) {
        self.preload = entries;
    }

    #[must_use]
    pub fn schema_table(&self) -> &SchemaTable {
        &self.schema_table
    }

    /// Engine version label used for schema lookups.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.schema_table.signature
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn format_version(&self) -> i32 {
        self.header.format_version
    }

    /// Byte order of everything after the header.
    #[must_use]
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Block ranges as of the last load or save.
    #[must_use]
    pub fn extents(&self) -> &BlockExtents {
        &self.extents
    }

    /// File this container was loaded from or last saved to.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Header, extents and index entries as they were before a save.
struct LayoutSnapshot {
    header: Header,
    extents: BlockExtents,
    infos: Vec<ObjectInfo>,
}

/// Objects may not share bytes. Empty objects are ignored.
fn check_object_ranges(ranges: &mut [(Extent, i64)]) -> Result<(), ContainerError> {
    ranges.sort_by_key(|(extent, _)| (extent.start, extent.end));
    let mut previous: Option<&(Extent, i64)> = None;
    for current in ranges.iter().filter(|(extent, _)| !extent.is_empty()) {
        if let Some((prev, prev_id)) = previous {
            if prev.intersects(&current.0) {
                return Err(ContainerError::Format(format!(
                    "object {} {} overlaps object {} {}",
                    prev_id, prev, current.1, current.0
                )));
            }
        }
        previous = Some(current);
    }
    Ok(())
}

/// Joined path and existing fragments when `path` names a split part.
fn split_parts(path: &Path) -> Option<(PathBuf, Vec<PathBuf>)> {
    let ext = path.extension()?.to_str()?;
    if !ext.starts_with("split") {
        return None;
    }
    let joined = path.with_extension("");
    let mut parts = Vec::new();
    loop {
        let mut name = joined.clone().into_os_string();
        name.push(format!(".split{}", parts.len()));
        let part = PathBuf::from(name);
        if !part.is_file() {
            break;
        }
        parts.push(part);
    }
    Some((joined, parts))
}

/// Embedded table entry first, then the repository by class and engine
/// version. `None` makes the object opaque.
fn resolve_schema(
    info: &ObjectInfo,
    table: &SchemaTable,
    repo: &SchemaRepository,
) -> Option<Arc<TypeNode>> {
    if let Some(node) = table.get(info.type_id) {
        return Some(Arc::clone(node));
    }
    match repo.newest_compatible(info.class_id, &table.signature) {
        Ok(node) => Some(node),
        Err(_) => {
            if info.class_id != MONO_BEHAVIOUR_CLASS_ID {
                warn!(
                    object_id = info.object_id,
                    class_id = info.class_id,
                    version = %table.signature,
                    "no schema for object; keeping raw bytes"
                );
            }
            None
        }
    }
}

fn log_extents(extents: &BlockExtents) {
    for (name, extent) in extents.named() {
        debug!(block = name, extent = %extent, "block extent");
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn to_u32(v: u64, what: &str) -> Result<u32, ContainerError> {
    u32::try_from(v)
        .map_err(|_| ContainerError::Format(format!("{what} {v} exceeds the 32-bit limit")))
}
