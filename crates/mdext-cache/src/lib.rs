//! Memoized file content storage with temp-file spill.
//!
//! [`ContentCache`] keeps file content behind a [`Weak`] reference plus a
//! backing temp file that is written and flushed at insert time. Memory
//! pressure may drop the in-memory copy at any point (callers hold plain
//! `Arc<String>`s); a later `get` transparently reloads the content from
//! the spill file and re-arms the weak reference. Spill files are
//! delete-on-drop, so disposing the cache releases everything.

use std::collections::HashMap;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Weak};

use mdext_storage::normalize;
use tempfile::NamedTempFile;

/// One cached file: the live in-memory copy (if any caller still holds
/// it) and the always-present disk spill.
struct ContentEntry {
    live: Weak<String>,
    spill: NamedTempFile,
}

/// Memoized string storage keyed by normalized path.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use mdext_cache::ContentCache;
///
/// let cache = ContentCache::new();
/// let content = cache
///     .get_or_load(Path::new("a.md"), || Ok("# A".to_owned()))
///     .unwrap();
/// assert_eq!(&*content, "# A");
///
/// // Second access never re-runs the loader.
/// let again = cache
///     .get_or_load(Path::new("./a.md"), || unreachable!())
///     .unwrap();
/// assert_eq!(content, again);
/// ```
#[derive(Default)]
pub struct ContentCache {
    entries: Mutex<HashMap<PathBuf, ContentEntry>>,
}

impl ContentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up cached content for `path`.
    ///
    /// Returns `None` if the path was never inserted. If the in-memory
    /// copy has been dropped, the content is reloaded from the spill file
    /// and the weak reference is re-armed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn get(&self, path: &Path) -> Option<Arc<String>> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get_mut(&normalize(path))?;

        if let Some(live) = entry.live.upgrade() {
            return Some(live);
        }

        // In-memory copy was reclaimed; reload from the spill file.
        match read_spill(&mut entry.spill) {
            Ok(content) => {
                let arc = Arc::new(content);
                entry.live = Arc::downgrade(&arc);
                Some(arc)
            }
            Err(e) => {
                tracing::warn!("failed to reload spilled content for {}: {e}", path.display());
                None
            }
        }
    }

    /// Insert content for `path`, replacing any previous entry.
    ///
    /// The content is written to a temp file and flushed before the entry
    /// becomes visible.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if the spill file cannot be created or
    /// written.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn insert(&self, path: &Path, content: &str) -> io::Result<Arc<String>> {
        let mut spill = NamedTempFile::new()?;
        spill.write_all(content.as_bytes())?;
        spill.flush()?;

        let arc = Arc::new(content.to_owned());
        let entry = ContentEntry {
            live: Arc::downgrade(&arc),
            spill,
        };
        self.entries
            .lock()
            .unwrap()
            .insert(normalize(path), entry);
        Ok(arc)
    }

    /// Look up `path`, running `loader` and caching its result on a miss.
    ///
    /// # Errors
    ///
    /// Propagates loader and spill-file errors; nothing is cached on error.
    pub fn get_or_load(
        &self,
        path: &Path,
        loader: impl FnOnce() -> io::Result<String>,
    ) -> io::Result<Arc<String>> {
        if let Some(content) = self.get(path) {
            return Ok(content);
        }
        let content = loader()?;
        self.insert(path, &content)
    }

    /// Number of cached paths.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// True if nothing has been cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn read_spill(spill: &mut NamedTempFile) -> io::Result<String> {
    let file = spill.as_file_mut();
    file.seek(SeekFrom::Start(0))?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_and_get() {
        let cache = ContentCache::new();
        cache.insert(Path::new("a.md"), "content").unwrap();

        let got = cache.get(Path::new("a.md")).unwrap();
        assert_eq!(&*got, "content");
    }

    #[test]
    fn test_get_missing() {
        let cache = ContentCache::new();
        assert!(cache.get(Path::new("missing.md")).is_none());
    }

    #[test]
    fn test_keys_are_normalized() {
        let cache = ContentCache::new();
        cache.insert(Path::new("a/b/../c.md"), "x").unwrap();

        assert!(cache.get(Path::new("a/c.md")).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_reload_from_spill_after_drop() {
        let cache = ContentCache::new();
        let arc = cache.insert(Path::new("a.md"), "spilled").unwrap();
        drop(arc);

        // The only strong reference is gone; content comes back from disk.
        let reloaded = cache.get(Path::new("a.md")).unwrap();
        assert_eq!(&*reloaded, "spilled");

        // The weak reference is re-armed: the next get shares the Arc.
        let again = cache.get(Path::new("a.md")).unwrap();
        assert!(Arc::ptr_eq(&reloaded, &again));
    }

    #[test]
    fn test_get_or_load_runs_loader_once() {
        let cache = ContentCache::new();
        let mut calls = 0;

        let first = cache
            .get_or_load(Path::new("a.md"), || {
                calls += 1;
                Ok("loaded".to_owned())
            })
            .unwrap();
        assert_eq!(&*first, "loaded");
        assert_eq!(calls, 1);

        let second = cache
            .get_or_load(Path::new("a.md"), || {
                calls += 1;
                Ok("never".to_owned())
            })
            .unwrap();
        assert_eq!(&*second, "loaded");
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_get_or_load_error_caches_nothing() {
        let cache = ContentCache::new();

        let err = cache.get_or_load(Path::new("a.md"), || {
            Err(io::Error::new(io::ErrorKind::NotFound, "nope"))
        });
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_replaces_previous_entry() {
        let cache = ContentCache::new();
        cache.insert(Path::new("a.md"), "first").unwrap();
        cache.insert(Path::new("a.md"), "second").unwrap();

        assert_eq!(&*cache.get(Path::new("a.md")).unwrap(), "second");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_spill_survives_multiple_reloads() {
        let cache = ContentCache::new();
        drop(cache.insert(Path::new("a.md"), "persistent").unwrap());

        for _ in 0..3 {
            let got = cache.get(Path::new("a.md")).unwrap();
            assert_eq!(&*got, "persistent");
            drop(got);
        }
    }
}
