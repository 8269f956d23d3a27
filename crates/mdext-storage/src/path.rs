//! Lexical path normalization.

use std::path::{Component, Path, PathBuf};

/// Normalize a path lexically, without touching the file system.
///
/// Drops `.` segments and resolves `..` against the preceding normal
/// component where possible. Leading `..` segments (and `..` that would
/// escape past a root) are kept, so relative paths stay relative.
///
/// The markup layer compares paths for ancestor-stack membership and uses
/// them as cache keys, so `a/./b.md` and `a/c/../b.md` must map to the
/// same value.
///
/// # Examples
///
/// ```
/// use std::path::{Path, PathBuf};
/// use mdext_storage::normalize;
///
/// assert_eq!(normalize(Path::new("a/./b.md")), PathBuf::from("a/b.md"));
/// assert_eq!(normalize(Path::new("a/c/../b.md")), PathBuf::from("a/b.md"));
/// assert_eq!(normalize(Path::new("../b.md")), PathBuf::from("../b.md"));
/// ```
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {
                    // `..` at the root stays at the root
                }
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    let mut result = PathBuf::new();
    for component in out {
        result.push(component.as_os_str());
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_identity() {
        assert_eq!(normalize(Path::new("a/b/c.md")), PathBuf::from("a/b/c.md"));
    }

    #[test]
    fn test_drops_cur_dir() {
        assert_eq!(normalize(Path::new("./a/./b.md")), PathBuf::from("a/b.md"));
    }

    #[test]
    fn test_resolves_parent_dir() {
        assert_eq!(
            normalize(Path::new("a/b/../../c.md")),
            PathBuf::from("c.md")
        );
    }

    #[test]
    fn test_keeps_leading_parent_dirs() {
        assert_eq!(
            normalize(Path::new("../../a.md")),
            PathBuf::from("../../a.md")
        );
    }

    #[test]
    fn test_parent_at_root_is_absorbed() {
        assert_eq!(normalize(Path::new("/../a.md")), PathBuf::from("/a.md"));
    }

    #[test]
    fn test_empty_result_becomes_dot() {
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
        assert_eq!(normalize(Path::new(".")), PathBuf::from("."));
    }

    #[test]
    fn test_absolute_path() {
        assert_eq!(
            normalize(Path::new("/docs/./guide/../a.md")),
            PathBuf::from("/docs/a.md")
        );
    }
}
