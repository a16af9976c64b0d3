use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use typetree::SchemaRepository;

use crate::{Container, ContainerError, ExternalReference};

/// Every container reachable from a root through external references, each
/// loaded once and keyed by canonical path.
#[derive(Debug)]
pub struct ReferenceGraph {
    containers: Vec<(PathBuf, Container)>,
    by_path: HashMap<PathBuf, usize>,
}

impl ReferenceGraph {
    /// Loads `root` and, depth-first, every container it references.
    ///
    /// References are resolved against the referencing file's directory
    /// after replacing `library/` with `resources/`. Targets that do not
    /// exist are skipped. A container already in the graph is never loaded
    /// again, so cyclic references terminate.
    pub fn load<P: AsRef<Path>>(root: P, repo: &SchemaRepository) -> Result<Self, ContainerError> {
        let root = fs::canonicalize(root.as_ref())?;
        let container = Container::open(&root, repo)?;
        let mut graph = Self {
            containers: Vec::new(),
            by_path: HashMap::new(),
        };
        graph.visit(root, container, repo)?;
        Ok(graph)
    }

    fn visit(
        &mut self,
        path: PathBuf,
        mut container: Container,
        repo: &SchemaRepository,
    ) -> Result<(), ContainerError> {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut pending = Vec::new();
        for reference in container.externals_mut() {
            reference.resolved = resolve_reference(&dir, &reference.file_path);
            if let Some(target) = &reference.resolved {
                pending.push(target.clone());
            }
        }

        // Registered before descending; back references stop here.
        self.by_path.insert(path.clone(), self.containers.len());
        self.containers.push((path.clone(), container));

        for target in pending {
            if self.by_path.contains_key(&target) {
                continue;
            }
            debug!(
                target = %target.display(),
                from = %path.display(),
                "loading referenced container"
            );
            let child = Container::open(&target, repo)?;
            self.visit(target, child, repo)?;
        }
        Ok(())
    }

    /// The container the graph was loaded from.
    #[must_use]
    pub fn root(&self) -> &Container {
        &self.containers[0].1
    }

    #[must_use]
    pub fn get(&self, path: &Path) -> Option<&Container> {
        self.by_path.get(path).map(|&i| &self.containers[i].1)
    }

    /// The loaded target of `reference`, if it was resolved.
    #[must_use]
    pub fn resolve(&self, reference: &ExternalReference) -> Option<&Container> {
        reference.resolved.as_deref().and_then(|p| self.get(p))
    }

    /// Containers in load order, root first.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Container)> {
        self.containers.iter().map(|(p, c)| (p.as_path(), c))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Always `false`: a graph holds at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

fn resolve_reference(dir: &Path, file_path: &str) -> Option<PathBuf> {
    if file_path.is_empty() {
        return None;
    }
    let candidate = dir.join(file_path.replace("library/", "resources/"));
    match fs::canonicalize(&candidate) {
        Ok(path) if path.is_file() => Some(path),
        _ => {
            debug!(path = %candidate.display(), "referenced container not found");
            None
        }
    }
}
