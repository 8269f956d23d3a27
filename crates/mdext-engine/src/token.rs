//! Immutable token tree produced by an external tokenizer.
//!
//! The markup layer does not parse markdown itself; it consumes a tree of
//! [`Token`]s built by a [`MarkupParser`](crate::MarkupParser)
//! implementation and renders it. Tokens are created once per parse and
//! are read-only afterwards, which is what makes sharing the tree across
//! render workers safe.

/// Source position of a token within its originating file (1-indexed).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourcePos {
    /// Line number where the token starts.
    pub line: usize,
}

/// Reference payload of an inclusion token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncludeRef {
    /// The reference as written in the document (pre-resolution).
    pub path: String,
    /// Link title, used as alt text in error output.
    pub title: String,
    /// True for the inline variant (trailing whitespace of the included
    /// content is trimmed before recursion).
    pub inline: bool,
}

/// Reference payload of a fenced-code snippet token.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SnippetRef {
    /// Source file reference as written in the document.
    pub path: String,
    /// Display name.
    pub name: String,
    /// Language id (e.g. `csharp`); inferred from the file extension when
    /// absent.
    pub language: Option<String>,
    /// Named tag delimiting the region to extract.
    pub tag: Option<String>,
    /// Explicit 1-based start line (line-range mode).
    pub start_line: Option<usize>,
    /// Explicit 1-based end line (line-range mode).
    pub end_line: Option<usize>,
}

/// Payload-free token discriminant, used as a dispatch-table key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenTag {
    Text,
    Raw,
    Paragraph,
    Heading,
    Blockquote,
    CodeFence,
    CodeSnippet,
    Include,
    SectionMarker,
    NoteMarker,
    VideoMarker,
}

/// Token kind with kind-specific payload.
///
/// This is a closed set: the base renderer dispatches over every variant,
/// and extension parts key their dispatch on the matching [`TokenTag`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Plain text (escaped on output).
    Text(String),
    /// Raw HTML passed through unchanged.
    Raw(String),
    /// Paragraph containing child tokens.
    Paragraph(Vec<Token>),
    /// Heading with level 1-6 and child tokens.
    Heading { level: u8, children: Vec<Token> },
    /// Blockquote containing child tokens.
    Blockquote(Vec<Token>),
    /// Ordinary fenced code block with literal source.
    CodeFence {
        language: Option<String>,
        source: String,
    },
    /// Fenced-code reference to an external source file.
    CodeSnippet(SnippetRef),
    /// File inclusion directive.
    Include(IncludeRef),
    /// Section marker heading a blockquote group (`[!div ...]`).
    SectionMarker { attributes: String },
    /// Note marker heading a blockquote group (`[!NOTE]` etc.).
    NoteMarker { kind: String },
    /// Video marker heading a blockquote group (`[!VIDEO url]`).
    VideoMarker { link: String },
}

impl TokenKind {
    /// The payload-free discriminant for dispatch keys.
    #[must_use]
    pub fn tag(&self) -> TokenTag {
        match self {
            Self::Text(_) => TokenTag::Text,
            Self::Raw(_) => TokenTag::Raw,
            Self::Paragraph(_) => TokenTag::Paragraph,
            Self::Heading { .. } => TokenTag::Heading,
            Self::Blockquote(_) => TokenTag::Blockquote,
            Self::CodeFence { .. } => TokenTag::CodeFence,
            Self::CodeSnippet(_) => TokenTag::CodeSnippet,
            Self::Include(_) => TokenTag::Include,
            Self::SectionMarker { .. } => TokenTag::SectionMarker,
            Self::NoteMarker { .. } => TokenTag::NoteMarker,
            Self::VideoMarker { .. } => TokenTag::VideoMarker,
        }
    }

    /// True for the marker kinds that head a blockquote group.
    #[must_use]
    pub fn is_marker(&self) -> bool {
        matches!(
            self,
            Self::SectionMarker { .. } | Self::NoteMarker { .. } | Self::VideoMarker { .. }
        )
    }
}

/// One immutable node of the parsed document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// Kind tag plus kind-specific payload.
    pub kind: TokenKind,
    /// The raw source text this token was parsed from.
    pub raw: String,
    /// Source position, when the tokenizer provides one.
    pub pos: Option<SourcePos>,
}

impl Token {
    /// Create a token without source position.
    #[must_use]
    pub fn new(kind: TokenKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
            pos: None,
        }
    }

    /// Attach a source position.
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.pos = Some(SourcePos { line });
        self
    }

    /// Convenience constructor for a text token.
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        Self {
            kind: TokenKind::Text(s.clone()),
            raw: s,
            pos: None,
        }
    }
}
