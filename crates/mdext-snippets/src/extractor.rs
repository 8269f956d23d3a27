//! Snippet extraction over the fallback resolver.
//!
//! A snippet reference names a source file plus either a tag or an
//! explicit 1-based line range. Files are read through the shared content
//! cache, and each file is tag-scanned at most once no matter how many
//! snippets it serves or how many threads ask concurrently.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use mdext_engine::{RenderContext, SnippetRef};
use mdext_include::{FallbackResolver, PathError};
use mdext_storage::FileSystem;

use crate::error::SnippetError;
use crate::index::TagIndex;
use crate::language::{CommentFamily, language_for_extension};

/// Extracted snippet: the source slice and the language it should be
/// highlighted as.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snippet {
    pub language: Option<String>,
    pub source: String,
}

/// Extracts tagged or line-ranged regions from source files.
pub struct SnippetExtractor {
    files: FallbackResolver,
    /// One scan cell per file. The outer lock only guards the map; the
    /// scan itself runs inside the cell so concurrent callers block on
    /// the same scan instead of repeating it.
    indexes: Mutex<HashMap<PathBuf, Arc<OnceLock<Arc<TagIndex>>>>>,
}

impl SnippetExtractor {
    /// Create an extractor over the given file system.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            files: FallbackResolver::new(fs),
            indexes: Mutex::new(HashMap::new()),
        }
    }

    /// Extract the region `snippet` refers to.
    ///
    /// The original file reference is recorded as a dependency whether or
    /// not extraction succeeds.
    ///
    /// # Errors
    ///
    /// Resolution errors from the fallback chain, tag errors from the
    /// index, and range errors for out-of-bounds line bounds.
    pub fn extract(
        &self,
        snippet: &SnippetRef,
        ctx: &RenderContext,
    ) -> Result<Snippet, SnippetError> {
        ctx.dependencies().add(snippet.path.clone());

        if Path::new(&snippet.path).is_absolute() {
            return Err(PathError::Absolute(snippet.path.clone()).into());
        }

        let (path, content) = self.files.read(&snippet.path, ctx)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_owned();
        let language = snippet
            .language
            .clone()
            .or_else(|| language_for_extension(&extension).map(str::to_owned));

        let source = if let Some(tag) = &snippet.tag {
            let family = language
                .as_deref()
                .and_then(CommentFamily::for_language)
                .or_else(|| CommentFamily::for_extension(&extension));
            if family.is_none() {
                return Err(SnippetError::UnsupportedLanguage(
                    language.unwrap_or(extension),
                ));
            }
            let index = self.index_for(&path, &content, family);
            let range = index.resolve(tag)?;
            collect_lines(&content, range, |line| !index.is_marker_line(line))
        } else {
            let total = content.lines().count();
            let (start, end) = validate_range(snippet.start_line, snippet.end_line, total)?;
            collect_lines(&content, start..=end, |_| true)
        };

        Ok(Snippet { language, source })
    }

    fn index_for(
        &self,
        path: &Path,
        content: &str,
        family: Option<CommentFamily>,
    ) -> Arc<TagIndex> {
        let cell = {
            let mut indexes = self.indexes.lock().unwrap();
            Arc::clone(indexes.entry(path.to_path_buf()).or_default())
        };
        Arc::clone(cell.get_or_init(|| Arc::new(TagIndex::scan(content, family))))
    }
}

/// Check an explicit line range against the file length.
///
/// Bounds default to the whole file; an end past the last line is clamped
/// rather than rejected, since trailing content may legitimately shrink.
fn validate_range(
    start: Option<usize>,
    end: Option<usize>,
    total: usize,
) -> Result<(usize, usize), SnippetError> {
    if start == Some(0) || end == Some(0) {
        return Err(SnippetError::NonPositiveBound);
    }
    let start = start.unwrap_or(1);
    let end = end.unwrap_or(total).min(total);

    if start > total {
        return Err(SnippetError::StartBeyondEof { start, total });
    }
    if start > end {
        return Err(SnippetError::StartAfterEnd { start, end });
    }
    Ok((start, end))
}

fn collect_lines(
    content: &str,
    range: std::ops::RangeInclusive<usize>,
    keep: impl Fn(usize) -> bool,
) -> String {
    content
        .lines()
        .enumerate()
        .filter(|(i, _)| range.contains(&(i + 1)) && keep(i + 1))
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdext_storage::MockFileSystem;
    use pretty_assertions::assert_eq;

    const PROGRAM: &str = "\
// <Main>
fn main() {
    body();
}
// </Main>
fn body() {}
";

    fn extractor(fs: MockFileSystem) -> SnippetExtractor {
        SnippetExtractor::new(Arc::new(fs))
    }

    fn tag_ref(path: &str, tag: &str) -> SnippetRef {
        SnippetRef {
            path: path.to_owned(),
            tag: Some(tag.to_owned()),
            ..SnippetRef::default()
        }
    }

    fn range_ref(path: &str, start: Option<usize>, end: Option<usize>) -> SnippetRef {
        SnippetRef {
            path: path.to_owned(),
            start_line: start,
            end_line: end,
            ..SnippetRef::default()
        }
    }

    #[test]
    fn test_extract_by_tag() {
        let ex = extractor(MockFileSystem::new().with_file("docs/src/main.rs", PROGRAM));
        let ctx = RenderContext::new("docs");

        let snippet = ex.extract(&tag_ref("src/main.rs", "Main"), &ctx).unwrap();
        assert_eq!(snippet.source, "fn main() {\n    body();\n}");
        assert_eq!(snippet.language.as_deref(), Some("rust"));
        assert!(ctx.dependencies().contains("src/main.rs"));
    }

    #[test]
    fn test_extract_by_line_range() {
        let ex = extractor(MockFileSystem::new().with_file("docs/src/main.rs", PROGRAM));
        let ctx = RenderContext::new("docs");

        let snippet = ex
            .extract(&range_ref("src/main.rs", Some(2), Some(4)), &ctx)
            .unwrap();
        assert_eq!(snippet.source, "fn main() {\n    body();\n}");
    }

    #[test]
    fn test_line_range_keeps_marker_lines() {
        let ex = extractor(MockFileSystem::new().with_file("docs/src/main.rs", PROGRAM));
        let ctx = RenderContext::new("docs");

        let snippet = ex
            .extract(&range_ref("src/main.rs", Some(1), Some(1)), &ctx)
            .unwrap();
        assert_eq!(snippet.source, "// <Main>");
    }

    #[test]
    fn test_end_is_clamped_to_file_length() {
        let ex = extractor(MockFileSystem::new().with_file("docs/src/main.rs", PROGRAM));
        let ctx = RenderContext::new("docs");

        let snippet = ex
            .extract(&range_ref("src/main.rs", Some(6), Some(999)), &ctx)
            .unwrap();
        assert_eq!(snippet.source, "fn body() {}");
    }

    #[test]
    fn test_zero_bound_is_rejected() {
        let ex = extractor(MockFileSystem::new().with_file("docs/a.rs", "x\n"));
        let ctx = RenderContext::new("docs");

        assert!(matches!(
            ex.extract(&range_ref("a.rs", Some(0), None), &ctx),
            Err(SnippetError::NonPositiveBound)
        ));
    }

    #[test]
    fn test_start_after_end_is_rejected() {
        let ex = extractor(MockFileSystem::new().with_file("docs/a.rs", "x\ny\nz\n"));
        let ctx = RenderContext::new("docs");

        assert!(matches!(
            ex.extract(&range_ref("a.rs", Some(3), Some(2)), &ctx),
            Err(SnippetError::StartAfterEnd { start: 3, end: 2 })
        ));
    }

    #[test]
    fn test_start_beyond_eof_is_rejected() {
        let ex = extractor(MockFileSystem::new().with_file("docs/a.rs", "x\n"));
        let ctx = RenderContext::new("docs");

        assert!(matches!(
            ex.extract(&range_ref("a.rs", Some(5), None), &ctx),
            Err(SnippetError::StartBeyondEof { start: 5, total: 1 })
        ));
    }

    #[test]
    fn test_whole_file_without_bounds() {
        let ex = extractor(MockFileSystem::new().with_file("docs/a.sql", "select 1;\n"));
        let ctx = RenderContext::new("docs");

        let snippet = ex.extract(&range_ref("a.sql", None, None), &ctx).unwrap();
        assert_eq!(snippet.source, "select 1;");
        assert_eq!(snippet.language.as_deref(), Some("sql"));
    }

    #[test]
    fn test_explicit_language_wins_over_extension() {
        let ex = extractor(MockFileSystem::new().with_file("docs/a.rs", "x\n"));
        let ctx = RenderContext::new("docs");

        let reference = SnippetRef {
            path: "a.rs".to_owned(),
            language: Some("csharp".to_owned()),
            ..SnippetRef::default()
        };
        let snippet = ex.extract(&reference, &ctx).unwrap();
        assert_eq!(snippet.language.as_deref(), Some("csharp"));
    }

    #[test]
    fn test_tag_in_unsupported_language() {
        let ex = extractor(MockFileSystem::new().with_file("docs/a.bin", "x\n"));
        let ctx = RenderContext::new("docs");

        assert!(matches!(
            ex.extract(&tag_ref("a.bin", "t"), &ctx),
            Err(SnippetError::UnsupportedLanguage(_))
        ));
    }

    #[test]
    fn test_missing_file_reports_path_error_and_dependency() {
        let ex = extractor(MockFileSystem::new());
        let ctx = RenderContext::new("docs");

        assert!(matches!(
            ex.extract(&tag_ref("gone.rs", "t"), &ctx),
            Err(SnippetError::Path(_))
        ));
        assert!(ctx.dependencies().contains("gone.rs"));
    }

    #[test]
    fn test_file_is_scanned_once() {
        let fs = Arc::new(MockFileSystem::new().with_file("docs/src/main.rs", PROGRAM));
        let ex = SnippetExtractor::new(Arc::clone(&fs) as Arc<dyn FileSystem>);
        let ctx = RenderContext::new("docs");

        ex.extract(&tag_ref("src/main.rs", "Main"), &ctx).unwrap();
        ex.extract(&tag_ref("src/main.rs", "Main"), &ctx).unwrap();

        // One read through the cache, one scan cell.
        assert_eq!(fs.read_count(), 1);
        assert_eq!(ex.indexes.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrent_extraction_scans_once() {
        let fs = Arc::new(MockFileSystem::new().with_file("docs/src/main.rs", PROGRAM));
        let ex = Arc::new(SnippetExtractor::new(Arc::clone(&fs) as Arc<dyn FileSystem>));

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let ex = Arc::clone(&ex);
                scope.spawn(move || {
                    let ctx = RenderContext::new("docs");
                    let snippet = ex.extract(&tag_ref("src/main.rs", "Main"), &ctx).unwrap();
                    assert_eq!(snippet.source, "fn main() {\n    body();\n}");
                });
            }
        });

        assert_eq!(ex.indexes.lock().unwrap().len(), 1);
    }
}
