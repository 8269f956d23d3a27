//! Code snippet extraction for the mdext markup layer.
//!
//! A snippet reference points into an external source file, either by a
//! named tag written in that file's comments or by an explicit 1-based
//! line range. Tag scanning happens at most once per file; extraction
//! failures render as inline HTML comments.

mod error;
mod extractor;
mod index;
mod language;
mod part;

pub use error::SnippetError;
pub use extractor::{Snippet, SnippetExtractor};
pub use index::TagIndex;
pub use language::{CommentFamily, language_for_extension};
pub use part::SnippetPart;
