//! Documentation markup extensions over a pluggable tokenizer.
//!
//! This facade wires the pieces of the mdext workspace together: the
//! [`EngineBuilder`] takes a base folder and a [`MarkupParser`], attaches
//! the built-in extension parts (file inclusion, code snippets, typed
//! blockquotes) plus any caller-supplied [`PartProvider`]s, and builds an
//! [`Engine`] whose [`markup`](Engine::markup) call renders one document
//! and reports the file dependencies recorded along the way.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use mdext::{EngineBuilder, MarkupParser, RenderContext, Token};
//!
//! struct MyParser;
//! impl MarkupParser for MyParser {
//!     fn parse(&self, text: &str, _ctx: &RenderContext) -> Vec<Token> {
//!         vec![Token::text(text)]
//!     }
//! }
//!
//! let engine = EngineBuilder::new("docs", Arc::new(MyParser)).build();
//! let result = engine.markup("hello", "docs/index.md");
//! assert_eq!(result.html, "hello");
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use mdext_engine::compose;
use mdext_include::{IncludePart, IncludeResolver};
use mdext_snippets::{SnippetExtractor, SnippetPart};
use mdext_storage::OsFileSystem;

pub use mdext_engine::{
    BlockquotePart, DependencySet, DispatchKey, HTML_RENDERER, HtmlRenderer, MARKDOWN_CONTEXT,
    MarkupParser, PartProvider, PartTriple, RenderContext, RendererPart, Token, TokenKind,
    TokenRenderer, TokenTag, error_comment, escape_html, render_all,
};
pub use mdext_engine::{IncludeRef, SnippetRef, SourcePos};
pub use mdext_include::{IncludeError, PathError};
pub use mdext_snippets::SnippetError;
pub use mdext_storage::{FileSystem, MockFileSystem, normalize};

/// Provider for the built-in extension parts.
///
/// Inclusion and snippet parts share the resolver and extractor across
/// every render of one engine, which is what makes their memoization
/// effective.
struct BuiltinProvider {
    resolver: Arc<IncludeResolver>,
    extractor: Arc<SnippetExtractor>,
    parser: Arc<dyn MarkupParser>,
}

impl PartProvider for BuiltinProvider {
    fn parts(&self, _parameters: &HashMap<String, String>) -> Vec<Box<dyn RendererPart>> {
        vec![
            Box::new(IncludePart::new(
                Arc::clone(&self.resolver),
                Arc::clone(&self.parser),
            )),
            Box::new(SnippetPart::new(Arc::clone(&self.extractor))),
            Box::new(BlockquotePart),
        ]
    }
}

/// Configures and builds an [`Engine`].
pub struct EngineBuilder {
    base_folder: PathBuf,
    fallback_folders: Vec<PathBuf>,
    fs: Arc<dyn FileSystem>,
    parser: Arc<dyn MarkupParser>,
    providers: Vec<Box<dyn PartProvider>>,
    parameters: HashMap<String, String>,
    builtin_parts: bool,
}

impl EngineBuilder {
    /// Start a builder for documents rooted at `base_folder`, tokenized
    /// by `parser`, reading from the local file system.
    #[must_use]
    pub fn new(base_folder: impl Into<PathBuf>, parser: Arc<dyn MarkupParser>) -> Self {
        Self {
            base_folder: base_folder.into(),
            fallback_folders: Vec::new(),
            fs: Arc::new(OsFileSystem),
            parser,
            providers: Vec::new(),
            parameters: HashMap::new(),
            builtin_parts: true,
        }
    }

    /// Build without the built-in include, snippet, and blockquote
    /// parts, leaving only caller-supplied providers.
    #[must_use]
    pub fn without_builtin_parts(mut self) -> Self {
        self.builtin_parts = false;
        self
    }

    /// Replace the backing file system.
    #[must_use]
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Append a fallback folder, searched in registration order when a
    /// reference does not resolve against the current folder.
    #[must_use]
    pub fn with_fallback_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.fallback_folders.push(folder.into());
        self
    }

    /// Register an extension part provider.
    ///
    /// Caller parts are consulted before the built-in parts of the same
    /// dispatch triple, so a provider can override built-in rendering.
    #[must_use]
    pub fn with_provider(mut self, provider: Box<dyn PartProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Set a parameter passed to every provider at composition time.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Compose the renderer and build the engine.
    #[must_use]
    pub fn build(self) -> Engine {
        let mut providers = self.providers;
        if self.builtin_parts {
            providers.push(Box::new(BuiltinProvider {
                resolver: Arc::new(IncludeResolver::new(Arc::clone(&self.fs))),
                extractor: Arc::new(SnippetExtractor::new(Arc::clone(&self.fs))),
                parser: Arc::clone(&self.parser),
            }));
        }

        let renderer = compose(Box::new(HtmlRenderer), &providers, &self.parameters);
        tracing::debug!(
            "engine built for {} with {} provider(s)",
            self.base_folder.display(),
            providers.len()
        );

        Engine {
            base_folder: self.base_folder,
            fallback_folders: self.fallback_folders,
            parser: self.parser,
            renderer,
        }
    }
}

/// Result of rendering one document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkupResult {
    /// The rendered HTML.
    pub html: String,
    /// Every file reference recorded during the render, sorted and
    /// deduplicated, relative to the document.
    pub dependencies: Vec<String>,
}

/// Configured markup engine; immutable and shareable across threads.
pub struct Engine {
    base_folder: PathBuf,
    fallback_folders: Vec<PathBuf>,
    parser: Arc<dyn MarkupParser>,
    renderer: Box<dyn TokenRenderer>,
}

impl Engine {
    /// Render `text` as the content of the document at `file_path`.
    pub fn markup(&self, text: &str, file_path: impl Into<PathBuf>) -> MarkupResult {
        // The ancestor stack holds normalized paths, so the entry path
        // must normalize too or a spelled variant of the document's own
        // path would slip past cycle detection.
        let file_path = normalize(&file_path.into());
        tracing::debug!("markup {}", file_path.display());

        let ctx = RenderContext::new(self.base_folder.clone())
            .with_fallback_folders(self.fallback_folders.clone())
            .push_file(file_path);
        let tokens = self.parser.parse(text, &ctx);
        let html = render_all(self.renderer.as_ref(), &tokens, &ctx);

        MarkupResult {
            html,
            dependencies: ctx.dependencies().snapshot(),
        }
    }
}
