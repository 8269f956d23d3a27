//! Document render context.
//!
//! [`RenderContext`] is the immutable environment threaded through one
//! recursive markup invocation. Every `with_*` mutator returns a new
//! context sharing unchanged entries, so sibling recursive calls derived
//! from one parent never observe each other's later changes.
//!
//! The one deliberate exception is [`DependencySet`]: a mutable
//! accumulator shared by reference across every context derived from one
//! top-level call. The aliasing is kept explicit in the type rather than
//! folded into the copy-on-write abstraction.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Context type identifier used in dispatch keys.
pub const MARKDOWN_CONTEXT: &str = "markdown";

/// Mutable dependency accumulator, aliased across one invocation tree.
///
/// Dependencies only grow within one top-level invocation. The set is
/// ordered and deduplicated.
#[derive(Clone, Debug, Default)]
pub struct DependencySet(Arc<Mutex<BTreeSet<String>>>);

impl DependencySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one dependency.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn add(&self, dependency: impl Into<String>) {
        self.0.lock().unwrap().insert(dependency.into());
    }

    /// True if `dependency` has been recorded.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn contains(&self, dependency: &str) -> bool {
        self.0.lock().unwrap().contains(dependency)
    }

    /// Snapshot the recorded dependencies in sorted order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().cloned().collect()
    }

    /// True if the two handles alias the same underlying set.
    #[must_use]
    pub fn same_set(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Immutable environment threaded through one markup invocation tree.
///
/// Created per top-level document. `Arc`-shared fields make the `with_*`
/// mutators cheap: a derived context shares every unchanged entry with
/// its parent.
#[derive(Clone, Debug)]
pub struct RenderContext {
    kind: &'static str,
    base_folder: Arc<PathBuf>,
    file_path_stack: Arc<Vec<PathBuf>>,
    fallback_folders: Arc<Vec<PathBuf>>,
    dependencies: DependencySet,
    is_include: bool,
    is_in_table: bool,
}

impl RenderContext {
    /// Create a top-level context rooted at `base_folder`, with an empty
    /// ancestor stack and a fresh dependency set.
    #[must_use]
    pub fn new(base_folder: impl Into<PathBuf>) -> Self {
        Self {
            kind: MARKDOWN_CONTEXT,
            base_folder: Arc::new(base_folder.into()),
            file_path_stack: Arc::new(Vec::new()),
            fallback_folders: Arc::new(Vec::new()),
            dependencies: DependencySet::new(),
            is_include: false,
            is_in_table: false,
        }
    }

    /// Context type identifier (dispatch-key component).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Override the context type identifier.
    #[must_use]
    pub fn with_kind(mut self, kind: &'static str) -> Self {
        self.kind = kind;
        self
    }

    /// The base folder of the top-level document.
    #[must_use]
    pub fn base_folder(&self) -> &Path {
        &self.base_folder
    }

    /// The ancestor-path stack; the last entry is the file currently
    /// being rendered.
    #[must_use]
    pub fn file_path_stack(&self) -> &[PathBuf] {
        &self.file_path_stack
    }

    /// The file currently being rendered, if the stack is non-empty.
    #[must_use]
    pub fn current_file(&self) -> Option<&Path> {
        self.file_path_stack.last().map(PathBuf::as_path)
    }

    /// Directory that relative references resolve against: the current
    /// file's parent, or the base folder when the stack is empty.
    #[must_use]
    pub fn current_folder(&self) -> PathBuf {
        match self.current_file().and_then(Path::parent) {
            Some(parent) => parent.to_path_buf(),
            None => (*self.base_folder).clone(),
        }
    }

    /// True if `path` already appears anywhere on the ancestor stack.
    #[must_use]
    pub fn is_ancestor(&self, path: &Path) -> bool {
        self.file_path_stack.iter().any(|p| p == path)
    }

    /// Derive a context with `path` pushed onto the ancestor stack.
    #[must_use]
    pub fn push_file(&self, path: impl Into<PathBuf>) -> Self {
        let mut stack = (*self.file_path_stack).clone();
        stack.push(path.into());
        Self {
            file_path_stack: Arc::new(stack),
            ..self.clone()
        }
    }

    /// Ordered fallback search roots.
    #[must_use]
    pub fn fallback_folders(&self) -> &[PathBuf] {
        &self.fallback_folders
    }

    /// Derive a context with the given fallback search roots.
    #[must_use]
    pub fn with_fallback_folders(self, folders: Vec<PathBuf>) -> Self {
        Self {
            fallback_folders: Arc::new(folders),
            ..self
        }
    }

    /// The shared dependency accumulator.
    #[must_use]
    pub fn dependencies(&self) -> &DependencySet {
        &self.dependencies
    }

    /// Derive a context using `dependencies` as its accumulator.
    ///
    /// Used by the inclusion resolver to give a nested render a fresh set
    /// whose contents are merged back (re-based) afterwards.
    #[must_use]
    pub fn with_dependencies(self, dependencies: DependencySet) -> Self {
        Self {
            dependencies,
            ..self
        }
    }

    /// True inside an included file's render.
    #[must_use]
    pub fn is_include(&self) -> bool {
        self.is_include
    }

    /// Derive a context with the is-include flag set.
    #[must_use]
    pub fn with_is_include(self, is_include: bool) -> Self {
        Self { is_include, ..self }
    }

    /// True while rendering table content.
    #[must_use]
    pub fn is_in_table(&self) -> bool {
        self.is_in_table
    }

    /// Derive a context with the is-in-table flag set.
    #[must_use]
    pub fn with_is_in_table(self, is_in_table: bool) -> Self {
        Self {
            is_in_table,
            ..self
        }
    }
}
