//! Comment families and language inference.
//!
//! Snippet tags are written inside line comments, so the tag syntax
//! depends only on the comment style of the language. Each family has one
//! marker pattern matching both the opening `<tag>` and closing `</tag>`
//! form of a marker line.

use once_cell::sync::Lazy;
use regex::Regex;

/// Comment style a source language uses for snippet tag markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentFamily {
    /// `// <tag>` (C-like languages)
    DoubleSlash,
    /// `' <tag>` (Basic-like languages)
    Apostrophe,
    /// `<!-- <tag> -->` (markup languages)
    XmlComment,
    /// `-- <tag>` (SQL-like languages)
    DoubleDash,
}

static DOUBLE_SLASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*//\s*<(/?)([\w.\-]+)>\s*$").expect("valid regex"));
static APOSTROPHE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*'\s*<(/?)([\w.\-]+)>\s*$").expect("valid regex"));
static XML_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*<!--\s*<(/?)([\w.\-]+)>\s*-->\s*$").expect("valid regex"));
static DOUBLE_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*--\s*<(/?)([\w.\-]+)>\s*$").expect("valid regex"));

impl CommentFamily {
    /// The family used by a language id, if tags are supported for it.
    #[must_use]
    pub fn for_language(language: &str) -> Option<Self> {
        match language.to_lowercase().as_str() {
            "c" | "cpp" | "cs" | "csharp" | "fsharp" | "go" | "java" | "javascript" | "js"
            | "kotlin" | "php" | "rust" | "scala" | "swift" | "ts" | "typescript" => {
                Some(Self::DoubleSlash)
            }
            "vb" | "vbnet" | "visualbasic" => Some(Self::Apostrophe),
            "cshtml" | "html" | "markdown" | "md" | "xaml" | "xml" => Some(Self::XmlComment),
            "haskell" | "lua" | "sql" => Some(Self::DoubleDash),
            _ => None,
        }
    }

    /// The family for a file extension (without the dot).
    #[must_use]
    pub fn for_extension(extension: &str) -> Option<Self> {
        language_for_extension(extension).and_then(Self::for_language)
    }

    /// The marker-line pattern of this family.
    ///
    /// Capture 1 is `/` for a closing marker and empty for an opening
    /// one; capture 2 is the tag name.
    #[must_use]
    pub fn marker_pattern(&self) -> &'static Regex {
        match self {
            Self::DoubleSlash => &DOUBLE_SLASH,
            Self::Apostrophe => &APOSTROPHE,
            Self::XmlComment => &XML_COMMENT,
            Self::DoubleDash => &DOUBLE_DASH,
        }
    }
}

/// Language id for a file extension (without the dot), used when a
/// snippet reference does not name a language explicitly.
#[must_use]
pub fn language_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_lowercase().as_str() {
        "c" | "h" => Some("c"),
        "cc" | "cpp" | "cxx" | "hpp" => Some("cpp"),
        "cs" => Some("csharp"),
        "cshtml" => Some("cshtml"),
        "fs" | "fsx" => Some("fsharp"),
        "go" => Some("go"),
        "hs" => Some("haskell"),
        "html" => Some("html"),
        "java" => Some("java"),
        "js" => Some("javascript"),
        "kt" => Some("kotlin"),
        "lua" => Some("lua"),
        "md" => Some("markdown"),
        "php" => Some("php"),
        "rs" => Some("rust"),
        "scala" => Some("scala"),
        "sql" => Some("sql"),
        "swift" => Some("swift"),
        "ts" => Some("typescript"),
        "vb" => Some("vb"),
        "xaml" | "xml" => Some("xml"),
        _ => None,
    }
}
