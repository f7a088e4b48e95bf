//! Persistence seam for the session blob.
//!
//! # Design
//! The store keeps exactly one serialized blob under a single well-known
//! location. Implementations are deliberately infallible at the trait
//! level: a read that fails for any reason is `None`, and write/remove
//! failures are logged and swallowed — losing persistence must never take
//! down an otherwise working session.

use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::warn;

/// Blob-level storage. The session store owns (de)serialization; this
/// trait only moves opaque strings.
pub trait SessionStorage {
    /// The persisted blob, if one exists and could be read.
    fn read(&self) -> Option<String>;
    fn write(&self, blob: &str);
    fn remove(&self);
}

/// Storage handles are often shared between a store and the host that
/// created it.
impl<S: SessionStorage + ?Sized> SessionStorage for std::rc::Rc<S> {
    fn read(&self) -> Option<String> {
        (**self).read()
    }

    fn write(&self, blob: &str) {
        (**self).write(blob)
    }

    fn remove(&self) {
        (**self).remove()
    }
}

/// Session blob stored as a single file on disk.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Conventional blob location under a data directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join("session.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileStorage {
    fn read(&self) -> Option<String> {
        fs::read_to_string(&self.path).ok()
    }

    fn write(&self, blob: &str) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(err) = fs::write(&self.path, blob) {
            warn!("session blob not persisted to {}: {err}", self.path.display());
        }
    }

    fn remove(&self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != ErrorKind::NotFound {
                warn!("session blob not removed from {}: {err}", self.path.display());
            }
        }
    }
}

/// In-memory storage for tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blob: RefCell<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a pre-seeded blob, corrupt or otherwise.
    pub fn with_blob(blob: &str) -> Self {
        Self {
            blob: RefCell::new(Some(blob.to_string())),
        }
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self) -> Option<String> {
        self.blob.borrow().clone()
    }

    fn write(&self, blob: &str) {
        *self.blob.borrow_mut() = Some(blob.to_string());
    }

    fn remove(&self) {
        *self.blob.borrow_mut() = None;
    }
}
