//! Fallback path resolution backed by the content cache.
//!
//! A file reference first resolves against the current folder; when it
//! does not exist there, each fallback folder is probed in order. Every
//! probed candidate is recorded as a dependency whether or not it exists,
//! so downstream rebuild logic reacts to a file appearing in an earlier
//! folder of the chain.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mdext_cache::ContentCache;
use mdext_engine::RenderContext;
use mdext_storage::{FileSystem, normalize};

use crate::error::PathError;

/// Prefix marking a reference as anchored at the working folder rather
/// than the current file. Stripped before resolution.
pub const WORKING_FOLDER_PREFIX: &str = "~/";

/// Strip the working-folder prefix from a reference, if present.
#[must_use]
pub fn strip_working_folder(reference: &str) -> &str {
    reference
        .strip_prefix(WORKING_FOLDER_PREFIX)
        .unwrap_or(reference)
}

/// The path `reference` resolves to before any fallback folder is tried:
/// working-folder references anchor at the base folder, everything else
/// at the current folder.
#[must_use]
pub fn primary_candidate(reference: &str, ctx: &RenderContext) -> PathBuf {
    match reference.strip_prefix(WORKING_FOLDER_PREFIX) {
        Some(rest) => normalize(&ctx.base_folder().join(rest)),
        None => normalize(&ctx.current_folder().join(reference)),
    }
}

/// Resolves file references through the current folder and the context's
/// fallback folders, memoizing content reads.
pub struct FallbackResolver {
    fs: Arc<dyn FileSystem>,
    cache: ContentCache,
}

impl FallbackResolver {
    /// Create a resolver over the given file system with an empty cache.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            cache: ContentCache::new(),
        }
    }

    /// The backing file system.
    #[must_use]
    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Resolve `reference` to an existing file path.
    ///
    /// The primary candidate anchors at the current folder (or the base
    /// folder for `~/` references). When it is missing and fallback
    /// folders are configured, each folder is probed in order; every fallback
    /// candidate is recorded in the context's dependency set, present or
    /// not.
    ///
    /// # Errors
    ///
    /// [`PathError::NotFound`] when no fallback folders are configured,
    /// [`PathError::FallbackExhausted`] when all of them miss.
    pub fn resolve(&self, reference: &str, ctx: &RenderContext) -> Result<PathBuf, PathError> {
        let stripped = strip_working_folder(reference);

        let primary = primary_candidate(reference, ctx);
        if self.fs.exists(&primary) {
            return Ok(primary);
        }

        let fallbacks = ctx.fallback_folders();
        if fallbacks.is_empty() {
            return Err(PathError::NotFound(primary));
        }

        let mut candidates = Vec::with_capacity(fallbacks.len());
        for folder in fallbacks {
            let candidate = normalize(&folder.join(stripped));
            ctx.dependencies().add(candidate.display().to_string());
            if self.fs.exists(&candidate) {
                tracing::debug!(
                    "resolved \"{reference}\" via fallback folder {}",
                    folder.display()
                );
                return Ok(candidate);
            }
            candidates.push(candidate);
        }

        Err(PathError::FallbackExhausted {
            reference: reference.to_owned(),
            candidates,
        })
    }

    /// Resolve `reference` and read its content through the cache.
    ///
    /// # Errors
    ///
    /// Resolution errors as in [`resolve`](Self::resolve), plus
    /// [`PathError::Read`] when the file cannot be read.
    pub fn read(
        &self,
        reference: &str,
        ctx: &RenderContext,
    ) -> Result<(PathBuf, Arc<String>), PathError> {
        let path = self.resolve(reference, ctx)?;
        let content = self.read_resolved(&path)?;
        Ok((path, content))
    }

    /// Read an already-resolved path through the cache.
    ///
    /// # Errors
    ///
    /// [`PathError::Read`] when the file cannot be read.
    pub fn read_resolved(&self, path: &Path) -> Result<Arc<String>, PathError> {
        self.cache
            .get_or_load(path, || self.fs.read_all_text(path))
            .map_err(|source| PathError::Read {
                path: path.to_path_buf(),
                source,
            })
    }
}
