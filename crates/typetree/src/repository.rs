use endian::{ByteOrder, EndianReader, EndianWriter};
use std::fs::OpenOptions;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::version::{compare_versions, newest_label};
use crate::{SchemaError, TypeNode};

/// Binds one schema root to a class identifier and a version label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub node_index: usize,
    pub class_id: i32,
    pub version_index: usize,
}

/// Read-only lookup service over a schema bundle.
///
/// Built once (from a bundle file or a [`SchemaRepositoryBuilder`]) and never
/// mutated afterwards, so a single instance can be shared by every container
/// in a batch. Returned roots are `Arc`s; callers keep them without borrowing
/// the repository.
#[derive(Debug, Clone, Default)]
pub struct SchemaRepository {
    format_version: i32,
    nodes: Vec<Arc<TypeNode>>,
    versions: Vec<String>,
    bindings: Vec<Binding>,
}

impl SchemaRepository {
    /// An empty repository. Every query on it fails with `NotFound`.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a bundle file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let mut r = EndianReader::open(path.as_ref(), ByteOrder::Big)?;
        let repo = Self::read_from(&mut r)?;
        debug!(
            path = %path.as_ref().display(),
            nodes = repo.nodes.len(),
            versions = repo.versions.len(),
            bindings = repo.bindings.len(),
            "loaded schema bundle"
        );
        Ok(repo)
    }

    /// Parses a bundle. The reader is switched to big-endian.
    pub fn read_from<R: Read + Seek>(r: &mut EndianReader<R>) -> Result<Self, SchemaError> {
        r.set_order(ByteOrder::Big);

        let format_version = r.read_i32()?;

        let node_count = read_count(r, "node")?;
        let mut nodes = Vec::with_capacity(node_count.min(4096));
        for _ in 0..node_count {
            nodes.push(Arc::new(TypeNode::read_from(r)?));
        }

        let label_count = read_count(r, "version label")?;
        let mut versions = Vec::with_capacity(label_count.min(4096));
        for _ in 0..label_count {
            versions.push(r.read_cstring()?);
        }

        let binding_count = read_count(r, "binding")?;
        let mut bindings = Vec::with_capacity(binding_count.min(4096));
        for i in 0..binding_count {
            let node_index = r.read_i32()?;
            let class_id = r.read_i32()?;
            let version_index = r.read_i32()?;

            if node_index < 0 || node_index as usize >= nodes.len() {
                return Err(SchemaError::Format(format!(
                    "binding {} references node {} of {}",
                    i,
                    node_index,
                    nodes.len()
                )));
            }
            if version_index < 0 || version_index as usize >= versions.len() {
                return Err(SchemaError::Format(format!(
                    "binding {} references version label {} of {}",
                    i,
                    version_index,
                    versions.len()
                )));
            }

            bindings.push(Binding {
                node_index: node_index as usize,
                class_id,
                version_index: version_index as usize,
            });
        }

        Ok(Self {
            format_version,
            nodes,
            versions,
            bindings,
        })
    }

    /// Serializes the bundle (big-endian).
    pub fn write_to<W: Write + Seek>(&self, w: &mut EndianWriter<W>) -> Result<(), SchemaError> {
        w.set_order(ByteOrder::Big);
        w.write_i32(self.format_version)?;

        w.write_i32(self.nodes.len() as i32)?;
        for node in &self.nodes {
            node.write_to(w)?;
        }

        w.write_i32(self.versions.len() as i32)?;
        for label in &self.versions {
            w.write_cstring(label)?;
        }

        w.write_i32(self.bindings.len() as i32)?;
        for b in &self.bindings {
            w.write_i32(b.node_index as i32)?;
            w.write_i32(b.class_id)?;
            w.write_i32(b.version_index as i32)?;
        }
        Ok(())
    }

    /// Writes the bundle to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SchemaError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut w = EndianWriter::new(BufWriter::new(file), ByteOrder::Big)?;
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// The schema bound to `class_id` under exactly `version`.
    pub fn exact(&self, class_id: i32, version: &str) -> Result<Arc<TypeNode>, SchemaError> {
        self.bindings_for(class_id)
            .find(|b| self.versions[b.version_index] == version)
            .map(|b| Arc::clone(&self.nodes[b.node_index]))
            .ok_or_else(|| SchemaError::NotFound {
                class_id,
                version: Some(version.to_string()),
            })
    }

    /// Every schema bound to `class_id`, in binding order.
    pub fn all_for_class(&self, class_id: i32) -> Result<Vec<Arc<TypeNode>>, SchemaError> {
        let found: Vec<_> = self
            .bindings_for(class_id)
            .map(|b| Arc::clone(&self.nodes[b.node_index]))
            .collect();
        if found.is_empty() {
            return Err(SchemaError::NotFound {
                class_id,
                version: None,
            });
        }
        Ok(found)
    }

    /// The schema bound to the newest version label known for `class_id`.
    pub fn newest(&self, class_id: i32) -> Result<Arc<TypeNode>, SchemaError> {
        let newest = newest_label(self.labels_for(class_id)).ok_or(SchemaError::NotFound {
            class_id,
            version: None,
        })?;
        self.exact(class_id, newest)
    }

    /// The newest schema for `class_id` whose label is `version` itself or
    /// orders below it. Used to pick a layout for a container written by a
    /// specific engine version.
    pub fn newest_compatible(
        &self,
        class_id: i32,
        version: &str,
    ) -> Result<Arc<TypeNode>, SchemaError> {
        let candidates = self.labels_for(class_id).filter(|label| {
            *label == version || compare_versions(label, version) == std::cmp::Ordering::Less
        });
        let newest = newest_label(candidates).ok_or_else(|| SchemaError::NotFound {
            class_id,
            version: Some(version.to_string()),
        })?;
        self.exact(class_id, newest)
    }

    /// Returns `true` if at least one schema is bound to `class_id`.
    #[must_use]
    pub fn contains_class(&self, class_id: i32) -> bool {
        self.bindings_for(class_id).next().is_some()
    }

    #[must_use]
    pub fn format_version(&self) -> i32 {
        self.format_version
    }

    /// All version labels in bundle order.
    #[must_use]
    pub fn versions(&self) -> &[String] {
        &self.versions
    }

    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Number of schema roots in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn bindings_for(&self, class_id: i32) -> impl Iterator<Item = &Binding> {
        self.bindings.iter().filter(move |b| b.class_id == class_id)
    }

    fn labels_for(&self, class_id: i32) -> impl Iterator<Item = &str> {
        self.bindings_for(class_id)
            .map(|b| self.versions[b.version_index].as_str())
    }
}

fn read_count<R: Read + Seek>(r: &mut EndianReader<R>, what: &str) -> Result<usize, SchemaError> {
    let n = r.read_i32()?;
    if n < 0 {
        return Err(SchemaError::Format(format!("negative {} count {}", what, n)));
    }
    Ok(n as usize)
}

/// Assembles a repository in memory.
///
/// ```rust
/// use typetree::{SchemaRepositoryBuilder, TypeNode};
///
/// let mut b = SchemaRepositoryBuilder::new(1);
/// b.bind(1, "4.6.1f1", TypeNode::record("GameObject", "Base", vec![]));
/// let repo = b.build();
/// assert!(repo.exact(1, "4.6.1f1").is_ok());
/// ```
#[derive(Debug, Default)]
pub struct SchemaRepositoryBuilder {
    repo: SchemaRepository,
}

impl SchemaRepositoryBuilder {
    #[must_use]
    pub fn new(format_version: i32) -> Self {
        Self {
            repo: SchemaRepository {
                format_version,
                ..SchemaRepository::default()
            },
        }
    }

    /// Binds `node` to `class_id` under `version`. Labels are shared between
    /// bindings.
    pub fn bind(&mut self, class_id: i32, version: &str, node: TypeNode) -> &mut Self {
        let version_index = match self.repo.versions.iter().position(|v| v == version) {
            Some(i) => i,
            None => {
                self.repo.versions.push(version.to_string());
                self.repo.versions.len() - 1
            }
        };
        self.repo.nodes.push(Arc::new(node));
        self.repo.bindings.push(Binding {
            node_index: self.repo.nodes.len() - 1,
            class_id,
            version_index,
        });
        self
    }

    #[must_use]
    pub fn build(self) -> SchemaRepository {
        self.repo
    }
}
