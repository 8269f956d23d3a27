//! Recursive file inclusion for the mdext markup layer.
//!
//! An inclusion directive pulls another file into the current document:
//! the referenced file is resolved (with fallback folders and a `~/`
//! working-folder anchor), parsed with the externally supplied tokenizer,
//! rendered through the same composed renderer as the parent, and
//! memoized together with the dependencies recorded along the way.
//! Cycles are cut with an inline HTML comment, as is every other
//! resolution failure.

mod error;
mod fallback;
mod part;
mod resolver;
mod rewrite;

pub use error::{IncludeError, PathError};
pub use fallback::{
    FallbackResolver, WORKING_FOLDER_PREFIX, primary_candidate, strip_working_folder,
};
pub use part::IncludePart;
pub use resolver::IncludeResolver;
pub use rewrite::{anchor_relative_links, rebase_dependency, splice_anchored_links};
