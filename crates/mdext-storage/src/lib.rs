//! File system abstraction for the mdext markup layer.
//!
//! The markup layer never touches `std::fs` directly; everything goes
//! through the [`FileSystem`] trait so that resolvers and extractors can
//! be tested against an in-memory backend.
//!
//! - [`OsFileSystem`]: reads from the local file system
//! - [`MockFileSystem`]: in-memory backend for tests, with a read counter
//!
//! The crate also provides [`normalize`], the lexical path normalization
//! used for cycle detection and cache keys.

mod fs;
mod mock;
mod path;

pub use fs::OsFileSystem;
pub use mock::MockFileSystem;
pub use path::normalize;

use std::io;
use std::path::Path;

/// Read-only file access used by the inclusion and snippet resolvers.
///
/// Implementations map a path to text content. Paths are treated as
/// opaque keys; callers are expected to pass normalized paths (see
/// [`normalize`]) so that lookups are spelling-independent.
pub trait FileSystem: Send + Sync {
    /// Check whether a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Read the full text content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if the file does not exist or cannot be
    /// read as text.
    fn read_all_text(&self, path: &Path) -> io::Result<String>;
}
