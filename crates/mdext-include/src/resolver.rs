//! Recursive inclusion resolver.
//!
//! Resolves inclusion directives by loading the referenced file, parsing
//! it with the externally supplied [`MarkupParser`], rendering the token
//! tree through the same dispatcher that rendered the parent, and
//! memoizing the result. A single re-entrant lock spans the whole
//! resolve / load / recursive-render / store sequence, so concurrent
//! top-level renders serialize on inclusion work while recursive
//! inclusions on the same thread proceed.
//!
//! Every failure renders as an inline HTML comment; an unresolvable
//! include never aborts the surrounding document.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mdext_engine::{
    DependencySet, IncludeRef, MarkupParser, RenderContext, TokenRenderer, error_comment,
    render_all,
};
use mdext_storage::{FileSystem, normalize};
use parking_lot::ReentrantMutex;

use crate::error::{IncludeError, PathError};
use crate::fallback::FallbackResolver;
use crate::rewrite::{anchor_relative_links, rebase_dependency, splice_anchored_links};

/// Memo key: the resolved file path plus whether the inline trim was
/// applied. Inline and block renditions of the same file differ, so they
/// cache separately.
type MemoKey = (PathBuf, bool);

/// Per-file memo: rendered HTML (in the `~/`-anchored link form) and the
/// dependency strings recorded while rendering it, always written
/// together.
#[derive(Default)]
struct IncludeState {
    rendered: HashMap<MemoKey, String>,
    dependencies: HashMap<MemoKey, Vec<String>>,
}

/// Resolves and renders inclusion directives.
pub struct IncludeResolver {
    files: FallbackResolver,
    state: ReentrantMutex<RefCell<IncludeState>>,
}

impl IncludeResolver {
    /// Create a resolver over the given file system.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            files: FallbackResolver::new(fs),
            state: ReentrantMutex::new(RefCell::new(IncludeState::default())),
        }
    }

    /// Render one inclusion directive to HTML.
    ///
    /// Failures come back as an inline HTML comment carrying the error
    /// message, so the surrounding document stays intact.
    pub fn render(
        &self,
        parser: &dyn MarkupParser,
        dispatcher: &dyn TokenRenderer,
        include: &IncludeRef,
        ctx: &RenderContext,
    ) -> String {
        match self.render_inner(parser, dispatcher, include, ctx) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(
                    "include \"{}\" failed in {}: {e}",
                    include.path,
                    ctx.current_file()
                        .unwrap_or_else(|| ctx.base_folder())
                        .display()
                );
                error_comment(&e.to_string())
            }
        }
    }

    fn render_inner(
        &self,
        parser: &dyn MarkupParser,
        dispatcher: &dyn TokenRenderer,
        include: &IncludeRef,
        ctx: &RenderContext,
    ) -> Result<String, IncludeError> {
        if Path::new(&include.path).is_absolute() {
            return Err(PathError::Absolute(include.path.clone()).into());
        }

        // The original reference is a dependency even when resolution
        // fails later: the document must re-render once the file appears.
        ctx.dependencies().add(include.path.clone());

        let guard = self.state.lock();

        // Resolution runs on every encounter, memo hit or not, so
        // fallback candidates are reported for each referring document.
        let resolved = self.files.resolve(&include.path, ctx)?;
        if ctx.is_ancestor(&resolved) {
            let parent = ctx
                .current_file()
                .unwrap_or_else(|| ctx.base_folder())
                .display()
                .to_string();
            return Err(IncludeError::Circular { parent });
        }

        let inline = include.inline || ctx.is_in_table();
        let key = (resolved.clone(), inline);

        // Both halves of the memo must be present; a partial entry is
        // treated as a miss and recomputed wholesale.
        let memo = {
            let state = guard.borrow();
            match (state.rendered.get(&key), state.dependencies.get(&key)) {
                (Some(html), Some(deps)) => Some((html.clone(), deps.clone())),
                _ => None,
            }
        };

        let (html, deps) = match memo {
            Some(hit) => hit,
            None => {
                let content = self.files.read_resolved(&resolved)?;

                let mut content = (*content).clone();
                if inline {
                    content.truncate(content.trim_end().len());
                }

                let nested_deps = DependencySet::new();
                let nested_ctx = ctx
                    .push_file(resolved.clone())
                    .with_dependencies(nested_deps.clone())
                    .with_is_include(true);

                // No RefCell borrow is held here: nested includes re-enter
                // through the same lock and borrow the state themselves.
                let tokens = parser.parse(&content, &nested_ctx);
                let body = render_all(dispatcher, &tokens, &nested_ctx);
                // Cached output carries `~/`-anchored link targets so it
                // splices correctly from any referring document. Targets
                // anchored by a deeper inclusion level stay as they are.
                let html = anchor_relative_links(&body, &resolved, ctx.base_folder());
                let deps = nested_deps.snapshot();

                let mut state = guard.borrow_mut();
                state.rendered.insert(key.clone(), html.clone());
                state.dependencies.insert(key, deps.clone());
                (html, deps)
            }
        };

        // Merge the included file's dependencies into the caller's set,
        // re-anchored from the included file's folder to the caller's.
        // Fallback-candidate paths name probe locations anchored at the
        // configured folders, not references relative to the included
        // file, and pass through untouched.
        let include_dir = resolved.parent().unwrap_or_else(|| Path::new(""));
        let caller_dir = ctx.current_folder();
        for dep in &deps {
            if is_fallback_candidate(dep, ctx.fallback_folders()) {
                ctx.dependencies().add(dep.clone());
            } else {
                ctx.dependencies()
                    .add(rebase_dependency(dep, include_dir, &caller_dir));
            }
        }

        // Anchored targets resolve against the document the output lands
        // in; intermediate inclusion levels hand them through unchanged.
        if ctx.is_include() {
            Ok(html)
        } else {
            Ok(splice_anchored_links(&html, &caller_dir, ctx.base_folder()))
        }
    }
}

fn is_fallback_candidate(dependency: &str, folders: &[PathBuf]) -> bool {
    let path = Path::new(dependency);
    folders
        .iter()
        .any(|folder| path.starts_with(normalize(folder)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdext_engine::{HTML_RENDERER, HtmlRenderer, Token, TokenKind};
    use mdext_storage::MockFileSystem;
    use once_cell::sync::Lazy;
    use pretty_assertions::assert_eq;
    use regex::Regex;

    /// Line-based parser: `[!include[title](path)]` on its own line is an
    /// inclusion directive, a line starting with `<` is raw HTML, and
    /// everything else is a text token.
    struct LineParser;

    static INCLUDE_LINE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\[!include\[([^\]]*)\]\(([^)]+)\)\]$").unwrap());

    impl MarkupParser for LineParser {
        fn parse(&self, text: &str, _ctx: &RenderContext) -> Vec<Token> {
            text.lines()
                .map(|line| {
                    if let Some(caps) = INCLUDE_LINE.captures(line.trim()) {
                        Token::new(
                            TokenKind::Include(IncludeRef {
                                path: caps[2].to_owned(),
                                title: caps[1].to_owned(),
                                inline: false,
                            }),
                            line,
                        )
                    } else if line.starts_with('<') {
                        Token::new(TokenKind::Raw(line.to_owned()), line)
                    } else {
                        Token::text(line)
                    }
                })
                .collect()
        }
    }

    /// Renderer handling inclusion tokens through the resolver and
    /// everything else through the base renderer.
    struct IncludeRenderer {
        resolver: Arc<IncludeResolver>,
    }

    impl TokenRenderer for IncludeRenderer {
        fn id(&self) -> &'static str {
            HTML_RENDERER
        }

        fn render(
            &self,
            dispatcher: &dyn TokenRenderer,
            token: &Token,
            ctx: &RenderContext,
        ) -> String {
            match &token.kind {
                TokenKind::Include(include) => {
                    self.resolver.render(&LineParser, dispatcher, include, ctx)
                }
                _ => HtmlRenderer.render(dispatcher, token, ctx),
            }
        }
    }

    fn render_document(
        fs: Arc<MockFileSystem>,
        document: &str,
        ctx: &RenderContext,
    ) -> (String, Arc<IncludeResolver>) {
        let resolver = Arc::new(IncludeResolver::new(fs));
        let renderer = IncludeRenderer {
            resolver: Arc::clone(&resolver),
        };
        let tokens = LineParser.parse(document, ctx);
        (render_all(&renderer, &tokens, ctx), resolver)
    }

    fn top_context(base: &str, file: &str) -> RenderContext {
        RenderContext::new(base).push_file(file)
    }

    #[test]
    fn test_simple_include() {
        let fs = Arc::new(
            MockFileSystem::new()
                .with_file("docs/main.md", "")
                .with_file("docs/inc/a.md", "hello"),
        );
        let ctx = top_context("docs", "docs/main.md");

        let (html, _) = render_document(fs, "[!include[a](inc/a.md)]", &ctx);
        assert_eq!(html, "hello");
        assert!(ctx.dependencies().contains("inc/a.md"));
    }

    #[test]
    fn test_missing_include_renders_error_comment() {
        let fs = Arc::new(MockFileSystem::new());
        let ctx = top_context("docs", "docs/main.md");

        let (html, _) = render_document(fs, "[!include[a](gone.md)]", &ctx);
        assert!(html.starts_with("<!--"));
        assert!(html.contains("not found"));
        // The unresolved reference is still a dependency.
        assert!(ctx.dependencies().contains("gone.md"));
    }

    #[test]
    fn test_absolute_path_is_rejected() {
        let fs = Arc::new(MockFileSystem::new().with_file("/abs/a.md", "A"));
        let ctx = top_context("docs", "docs/main.md");

        let (html, _) = render_document(fs, "[!include[a](/abs/a.md)]", &ctx);
        assert!(html.contains("not supported"));
        // A rejected absolute reference never enters the dependency set.
        assert!(!ctx.dependencies().contains("/abs/a.md"));
        assert!(ctx.dependencies().snapshot().is_empty());
    }

    #[test]
    fn test_self_include_is_circular() {
        let fs = Arc::new(MockFileSystem::new().with_file("docs/main.md", ""));
        let ctx = top_context("docs", "docs/main.md");

        let (html, _) = render_document(fs, "[!include[m](main.md)]", &ctx);
        assert!(html.contains("circular dependency"));
        assert!(html.contains("docs/main.md"));
    }

    #[test]
    fn test_mutual_cycle_renders_one_marker() {
        let fs = Arc::new(
            MockFileSystem::new()
                .with_file("docs/a.md", "A\n[!include[b](b.md)]")
                .with_file("docs/b.md", "B\n[!include[a](a.md)]"),
        );
        let ctx = top_context("docs", "docs/main.md");

        let (html, _) = render_document(fs, "[!include[a](a.md)]", &ctx);
        // A renders, B renders, B's include of A is cut off.
        assert!(html.contains('A'));
        assert!(html.contains('B'));
        assert_eq!(html.matches("circular dependency").count(), 1);
        assert!(html.contains("docs/b.md"));
    }

    #[test]
    fn test_transitive_dependencies_are_rebased() {
        let fs = Arc::new(
            MockFileSystem::new()
                .with_file("docs/inc/b.md", "B\n[!include[c](c.md)]")
                .with_file("docs/inc/c.md", "C"),
        );
        let ctx = top_context("docs", "docs/main.md");

        let (html, _) = render_document(fs, "[!include[b](inc/b.md)]", &ctx);
        assert_eq!(html, "BC");

        let deps = ctx.dependencies().snapshot();
        assert!(deps.contains(&"inc/b.md".to_owned()));
        assert!(deps.contains(&"inc/c.md".to_owned()));
        // The nested reference is not reported verbatim at the top level.
        assert!(!deps.contains(&"c.md".to_owned()));
    }

    #[test]
    fn test_memo_avoids_rerender_and_still_merges_deps() {
        let fs = Arc::new(
            MockFileSystem::new()
                .with_file("docs/inc/b.md", "B\n[!include[c](c.md)]")
                .with_file("docs/inc/c.md", "C"),
        );
        let resolver = Arc::new(IncludeResolver::new(Arc::clone(&fs) as Arc<dyn FileSystem>));
        let renderer = IncludeRenderer {
            resolver: Arc::clone(&resolver),
        };

        let first_ctx = top_context("docs", "docs/main.md");
        let tokens = LineParser.parse("[!include[b](inc/b.md)]", &first_ctx);
        let first = render_all(&renderer, &tokens, &first_ctx);
        let reads = fs.read_count();

        // Second render of a different document hits the memo.
        let second_ctx = top_context("docs", "docs/other.md");
        let tokens = LineParser.parse("[!include[b](inc/b.md)]", &second_ctx);
        let second = render_all(&renderer, &tokens, &second_ctx);

        assert_eq!(first, second);
        assert_eq!(fs.read_count(), reads);
        // Cached dependencies are merged and re-based for the new caller.
        assert!(second_ctx.dependencies().contains("inc/b.md"));
        assert!(second_ctx.dependencies().contains("inc/c.md"));
    }

    #[test]
    fn test_inline_include_trims_trailing_whitespace() {
        let fs = Arc::new(MockFileSystem::new().with_file("docs/a.md", "inline me\n\n"));
        let resolver = IncludeResolver::new(fs);
        let ctx = top_context("docs", "docs/main.md");

        let renderer = HtmlRenderer;
        let include = IncludeRef {
            path: "a.md".to_owned(),
            title: String::new(),
            inline: true,
        };
        let html = resolver.render(&LineParser, &renderer, &include, &ctx);
        assert_eq!(html, "inline me");
    }

    #[test]
    fn test_table_context_forces_inline_trim() {
        let fs = Arc::new(MockFileSystem::new().with_file("docs/a.md", "cell\n"));
        let resolver = IncludeResolver::new(fs);
        let ctx = top_context("docs", "docs/main.md").with_is_in_table(true);

        let include = IncludeRef {
            path: "a.md".to_owned(),
            title: String::new(),
            inline: false,
        };
        let html = resolver.render(&LineParser, &HtmlRenderer, &include, &ctx);
        assert_eq!(html, "cell");
    }

    #[test]
    fn test_relative_links_are_rewritten() {
        let fs = Arc::new(
            MockFileSystem::new()
                .with_file("docs/guide/inc.md", r#"<img src="img/pic.png"/>"#),
        );
        let resolver = IncludeResolver::new(fs);
        let ctx = top_context("docs", "docs/main.md");

        let include = IncludeRef {
            path: "guide/inc.md".to_owned(),
            title: String::new(),
            inline: false,
        };
        let html = resolver.render(&LineParser, &HtmlRenderer, &include, &ctx);
        assert_eq!(html, r#"<img src="guide/img/pic.png"/>"#);
    }

    #[test]
    fn test_nested_include_links_anchor_at_their_own_folder() {
        let fs = Arc::new(
            MockFileSystem::new()
                .with_file("docs/sub/a.md", "[!include[b](inner/b.md)]")
                .with_file("docs/sub/inner/b.md", r#"<img src="pic.png"/>"#),
        );
        let ctx = top_context("docs", "docs/main.md");

        let (html, _) = render_document(fs, "[!include[a](sub/a.md)]", &ctx);
        // The image sits next to b.md, not one folder per inclusion level.
        assert_eq!(html, r#"<img src="sub/inner/pic.png"/>"#);
    }

    #[test]
    fn test_document_below_base_folder_keeps_sibling_links() {
        let fs = Arc::new(
            MockFileSystem::new()
                .with_file("docs/guide/frag.md", r#"<img src="pic.png"/>"#),
        );
        let ctx = top_context("docs", "docs/guide/page.md");

        let (html, _) = render_document(fs, "[!include[f](frag.md)]", &ctx);
        // The target is already a sibling of the document; no prefix.
        assert_eq!(html, r#"<img src="pic.png"/>"#);
    }

    #[test]
    fn test_fallback_candidates_survive_nested_merge() {
        let fs = Arc::new(
            MockFileSystem::new()
                .with_file("docs/inc/b.md", "[!include[s](shared.md)]")
                .with_file("fallback2/shared.md", "S"),
        );
        let ctx = top_context("docs", "docs/main.md").with_fallback_folders(vec![
            PathBuf::from("fallback1"),
            PathBuf::from("fallback2"),
        ]);

        let (html, _) = render_document(fs, "[!include[b](inc/b.md)]", &ctx);
        assert_eq!(html, "S");

        // Candidate paths name the probed locations themselves and are
        // not re-anchored to the including file's folder on merge.
        let deps = ctx.dependencies().snapshot();
        assert_eq!(
            deps,
            vec![
                "fallback1/shared.md".to_owned(),
                "fallback2/shared.md".to_owned(),
                "inc/b.md".to_owned(),
                "inc/shared.md".to_owned(),
            ]
        );
    }

    #[test]
    fn test_inline_and_block_renditions_cache_separately() {
        let fs = Arc::new(MockFileSystem::new().with_file("docs/a.md", "cell   \n"));
        let resolver = IncludeResolver::new(fs);
        let ctx = top_context("docs", "docs/main.md");

        let inline = IncludeRef {
            path: "a.md".to_owned(),
            title: String::new(),
            inline: true,
        };
        let block = IncludeRef {
            path: "a.md".to_owned(),
            title: String::new(),
            inline: false,
        };

        let trimmed = resolver.render(&LineParser, &HtmlRenderer, &inline, &ctx);
        assert_eq!(trimmed, "cell");

        // The block rendition keeps the trailing whitespace even though
        // the inline one was rendered (and cached) first.
        let untrimmed = resolver.render(&LineParser, &HtmlRenderer, &block, &ctx);
        assert_eq!(untrimmed, "cell   ");
    }
}
