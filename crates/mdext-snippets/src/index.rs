//! Per-file tag index.
//!
//! One scan over a source file collects every marker line and the lines
//! each tag occurs on. Tag names are case-insensitive; a valid tag occurs
//! exactly twice (open and close). Marker lines never appear in extracted
//! output, regardless of which tag is being extracted.

use std::collections::{BTreeSet, HashMap};
use std::ops::RangeInclusive;

use crate::error::SnippetError;
use crate::language::CommentFamily;

/// Marker occurrences of one scanned file.
#[derive(Debug)]
pub struct TagIndex {
    /// Lowercased tag name to the 1-based lines its markers occur on.
    occurrences: HashMap<String, Vec<usize>>,
    /// All marker lines (1-based), for exclusion from extracted output.
    marker_lines: BTreeSet<usize>,
    total_lines: usize,
}

impl TagIndex {
    /// Scan `content` for marker lines of the given comment family.
    ///
    /// With no family (tags unsupported for the language) the index is
    /// empty apart from the line count.
    #[must_use]
    pub fn scan(content: &str, family: Option<CommentFamily>) -> Self {
        let mut occurrences: HashMap<String, Vec<usize>> = HashMap::new();
        let mut marker_lines = BTreeSet::new();
        let mut total_lines = 0;

        for (i, line) in content.lines().enumerate() {
            let line_no = i + 1;
            total_lines = line_no;
            let Some(family) = family else { continue };
            if let Some(caps) = family.marker_pattern().captures(line) {
                occurrences
                    .entry(caps[2].to_lowercase())
                    .or_default()
                    .push(line_no);
                marker_lines.insert(line_no);
            }
        }

        Self {
            occurrences,
            marker_lines,
            total_lines,
        }
    }

    /// Number of lines in the scanned file.
    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// True if `line` (1-based) is a marker line of any tag.
    #[must_use]
    pub fn is_marker_line(&self, line: usize) -> bool {
        self.marker_lines.contains(&line)
    }

    /// Resolve `tag` to the 1-based line range strictly between its
    /// opening and closing marker.
    ///
    /// A tag written as `foo` also matches markers named `snippetfoo`.
    ///
    /// # Errors
    ///
    /// [`SnippetError::TagNotFound`] when no marker carries the name,
    /// [`SnippetError::TagNotClosed`] on a single occurrence, and
    /// [`SnippetError::TagOccursTooOften`] on more than two.
    pub fn resolve(&self, tag: &str) -> Result<RangeInclusive<usize>, SnippetError> {
        let wanted = tag.to_lowercase();
        let lines = self
            .occurrences
            .get(&wanted)
            .or_else(|| self.occurrences.get(&format!("snippet{wanted}")))
            .map(Vec::as_slice)
            .unwrap_or_default();

        match lines {
            [] => Err(SnippetError::TagNotFound(tag.to_owned())),
            [_] => Err(SnippetError::TagNotClosed(tag.to_owned())),
            [open, close] => Ok(open + 1..=close.saturating_sub(1)),
            _ => Err(SnippetError::TagOccursTooOften(tag.to_owned())),
        }
    }
}
