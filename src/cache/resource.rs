// src/cache/resource.rs — Where unit source text comes from
//
// A resource id is an opaque locator. The filesystem provider treats it
// as a path relative to an ordered list of search roots (first hit wins),
// or as an absolute path. Nothing here caches "not found": every call
// looks again.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::infra::errors::HotloopError;

/// Supplies the current text of a resource.
pub trait ResourceProvider {
    /// Whether the resource can currently be located.
    fn exists(&self, resource_id: &str) -> bool;

    /// Read the full current text. Fails with `ResourceNotFound` when the
    /// resource cannot be located.
    fn read(&self, resource_id: &str) -> Result<String, HotloopError>;

    /// Ids this provider knows about, used for "did you mean" hints.
    fn known_ids(&self) -> Vec<String> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// Resolves resource ids against search roots on disk.
#[derive(Debug, Clone)]
pub struct FileSystemProvider {
    roots: Vec<PathBuf>,
}

impl FileSystemProvider {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Provider rooted at the current directory only.
    pub fn current_dir() -> Self {
        Self::new(vec![PathBuf::from(".")])
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Resolve an id to the first existing file.
    pub fn resolve(&self, resource_id: &str) -> Option<PathBuf> {
        let path = Path::new(resource_id);
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }
        self.roots
            .iter()
            .map(|root| root.join(path))
            .find(|candidate| candidate.is_file())
    }
}

impl ResourceProvider for FileSystemProvider {
    fn exists(&self, resource_id: &str) -> bool {
        self.resolve(resource_id).is_some()
    }

    fn read(&self, resource_id: &str) -> Result<String, HotloopError> {
        let path = self
            .resolve(resource_id)
            .ok_or_else(|| HotloopError::not_found(resource_id))?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(text),
            // Deleted between resolve and read
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(HotloopError::not_found(resource_id))
            }
            Err(e) => Err(HotloopError::Io(e)),
        }
    }

    /// Files directly inside each root, as ids relative to that root.
    fn known_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for root in &self.roots {
            let Ok(entries) = std::fs::read_dir(root) else {
                continue;
            };
            for entry in entries.flatten() {
                if entry.path().is_file() {
                    ids.push(entry.file_name().to_string_lossy().into_owned());
                }
            }
        }
        ids.sort();
        ids.dedup();
        ids
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// A shared in-memory set of resources. Clones see the same entries, so a
/// host can keep one handle for edits while the cache reads through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a resource.
    pub fn set(&self, resource_id: &str, text: impl Into<String>) {
        self.entries
            .borrow_mut()
            .insert(resource_id.to_string(), text.into());
    }

    pub fn remove(&self, resource_id: &str) -> Option<String> {
        self.entries.borrow_mut().remove(resource_id)
    }
}

impl ResourceProvider for MemoryProvider {
    fn exists(&self, resource_id: &str) -> bool {
        self.entries.borrow().contains_key(resource_id)
    }

    fn read(&self, resource_id: &str) -> Result<String, HotloopError> {
        self.entries
            .borrow()
            .get(resource_id)
            .cloned()
            .ok_or_else(|| HotloopError::not_found(resource_id))
    }

    fn known_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.borrow().keys().cloned().collect();
        ids.sort();
        ids
    }
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// Up to five known ids that look like `resource_id` (Jaro-Winkler > 0.7),
/// best first.
pub fn suggest(resource_id: &str, known: &[String]) -> Vec<String> {
    let wanted = Path::new(resource_id)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| resource_id.to_string());

    let mut scored: Vec<(&str, f64)> = known
        .iter()
        .map(|id| (id.as_str(), strsim::jaro_winkler(id, &wanted)))
        .filter(|(_, score)| *score > 0.7)
        .collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(5);
    scored.into_iter().map(|(id, _)| id.to_string()).collect()
}
