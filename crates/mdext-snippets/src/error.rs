//! Snippet extraction failures, all recoverable.

use mdext_include::PathError;
use thiserror::Error;

/// Failure to extract a snippet from a source file.
#[derive(Debug, Error)]
pub enum SnippetError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("tag \"{0}\" not found")]
    TagNotFound(String),

    #[error("tag \"{0}\" is not closed")]
    TagNotClosed(String),

    #[error("tag \"{0}\" occurs more than twice")]
    TagOccursTooOften(String),

    #[error("snippet line numbers are 1-based and must be positive")]
    NonPositiveBound,

    #[error("snippet start line {start} is after end line {end}")]
    StartAfterEnd { start: usize, end: usize },

    #[error("snippet start line {start} is beyond the end of the file ({total} lines)")]
    StartBeyondEof { start: usize, total: usize },

    #[error("snippet tags are not supported for \"{0}\"")]
    UnsupportedLanguage(String),
}
