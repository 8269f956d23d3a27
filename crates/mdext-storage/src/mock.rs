//! Mock file system for testing.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::path::normalize;
use crate::FileSystem;

/// In-memory [`FileSystem`] for unit tests.
///
/// Files are registered with the builder method [`with_file`](Self::with_file)
/// and looked up by normalized path. The mock counts `read_all_text` calls
/// so cache behavior can be asserted.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use mdext_storage::{FileSystem, MockFileSystem};
///
/// let fs = MockFileSystem::new()
///     .with_file("docs/a.md", "# A");
///
/// assert!(fs.exists(Path::new("docs/a.md")));
/// assert!(!fs.exists(Path::new("docs/b.md")));
/// ```
#[derive(Debug, Default)]
pub struct MockFileSystem {
    files: RwLock<HashMap<PathBuf, String>>,
    reads: AtomicUsize,
}

impl MockFileSystem {
    /// Create an empty mock file system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file with the given content.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files
            .write()
            .unwrap()
            .insert(normalize(&path.into()), content.into());
        self
    }

    /// Add or replace a file after construction.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .write()
            .unwrap()
            .insert(normalize(&path.into()), content.into());
    }

    /// Number of `read_all_text` calls made so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(&normalize(path))
    }

    fn read_all_text(&self, path: &Path) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files
            .read()
            .unwrap()
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| {
                tracing::debug!("mock read miss: {}", path.display());
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no mock file at {}", path.display()),
                )
            })
    }
}
