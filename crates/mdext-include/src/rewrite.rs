//! Relative link rewriting for included HTML.
//!
//! Links inside an included file are written relative to that file, but
//! the rendered HTML ends up spliced into another document. Rendered
//! include output is therefore cached with relative `href`/`src` targets
//! in the location-independent `~/` working-folder form, anchored at the
//! included file's own folder; at splice time into the top-level
//! document the anchored targets are relativized against that document's
//! folder. Already-anchored targets are left alone, so nested inclusion
//! never re-anchors a child's output. Absolute targets, fragments,
//! queries, and targets with a URI scheme pass through unchanged.

use std::path::{Component, Path, PathBuf};

use mdext_storage::normalize;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::fallback::WORKING_FOLDER_PREFIX;

static LINK_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?P<attr>href|src)="(?P<target>[^"]*)""#).expect("valid regex"));

static URI_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("valid regex"));

/// Rewrite relative `href`/`src` targets in `html` into the `~/` form,
/// anchored at `include_file`'s folder.
///
/// Targets already in `~/` form are kept as they are, which makes the
/// pass idempotent across nested inclusion levels.
#[must_use]
pub fn anchor_relative_links(html: &str, include_file: &Path, base_folder: &Path) -> String {
    let include_dir = include_file.parent().unwrap_or_else(|| Path::new(""));
    let anchor = relative_between(base_folder, include_dir);

    LINK_ATTR
        .replace_all(html, |caps: &Captures<'_>| {
            let target = &caps["target"];
            if is_external(target) || target.starts_with(WORKING_FOLDER_PREFIX) {
                caps[0].to_owned()
            } else {
                let anchored = normalize(&anchor.join(target));
                format!(
                    r#"{}="{}{}""#,
                    &caps["attr"],
                    WORKING_FOLDER_PREFIX,
                    anchored.display()
                )
            }
        })
        .into_owned()
}

/// Relativize `~/`-anchored `href`/`src` targets in `html` against the
/// folder of the document the output is spliced into.
#[must_use]
pub fn splice_anchored_links(html: &str, document_folder: &Path, base_folder: &Path) -> String {
    LINK_ATTR
        .replace_all(html, |caps: &Captures<'_>| {
            let target = &caps["target"];
            match target.strip_prefix(WORKING_FOLDER_PREFIX) {
                Some(rest) => {
                    let resolved = normalize(&base_folder.join(rest));
                    let relative = relative_between(document_folder, &resolved);
                    format!(r#"{}="{}""#, &caps["attr"], relative.display())
                }
                None => caps[0].to_owned(),
            }
        })
        .into_owned()
}

fn is_external(target: &str) -> bool {
    target.is_empty()
        || target.starts_with('/')
        || target.starts_with('#')
        || target.starts_with('?')
        || URI_SCHEME.is_match(target)
}

/// Re-anchor a dependency string recorded relative to `from_dir` so it is
/// relative to `to_dir` instead.
///
/// Absolute paths and working-folder references are location-independent
/// and pass through unchanged.
#[must_use]
pub fn rebase_dependency(dependency: &str, from_dir: &Path, to_dir: &Path) -> String {
    if Path::new(dependency).is_absolute()
        || dependency.starts_with(WORKING_FOLDER_PREFIX)
    {
        return dependency.to_owned();
    }
    let target = normalize(&from_dir.join(dependency));
    relative_between(to_dir, &target).display().to_string()
}

/// Lexical relative path from the folder `from_dir` to `to`.
pub(crate) fn relative_between(from_dir: &Path, to: &Path) -> PathBuf {
    let from_dir = normalize(from_dir);
    let to = normalize(to);
    let from: Vec<Component<'_>> = from_dir
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();
    let to: Vec<Component<'_>> = to
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..from.len() {
        result.push("..");
    }
    for component in &to[common..] {
        result.push(component);
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}
