//! Inclusion and path-resolution failures.
//!
//! Every failure here is recoverable: callers render the error message as
//! an inline HTML comment and keep going.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to resolve or read a file reference.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("absolute path \"{0}\" is not supported")]
    Absolute(String),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error(
        "file \"{reference}\" not found in any fallback folder (tried {})",
        format_candidates(.candidates)
    )]
    FallbackExhausted {
        reference: String,
        candidates: Vec<PathBuf>,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure to resolve an inclusion directive.
#[derive(Debug, Error)]
pub enum IncludeError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("circular dependency found in \"{parent}\"")]
    Circular { parent: String },
}

fn format_candidates(candidates: &[PathBuf]) -> String {
    candidates
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
