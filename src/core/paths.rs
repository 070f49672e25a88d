//! core::paths
//!
//! Path arithmetic for repository-relative, slash-separated paths.
//!
//! # Conventions
//!
//! - Separators are always `/`, regardless of host platform
//! - Leading and trailing separators are stripped on entry
//! - The empty string is the repository root
//!
//! Everything here is pure string manipulation. No function touches the
//! entry set; resolution against entries lives in `fs::cache`.
//!
//! # Example
//!
//! ```
//! use ghfs::core::paths;
//!
//! assert_eq!(paths::normalize("/docs/guide.md").unwrap(), "docs/guide.md");
//! assert_eq!(paths::parent("docs/guide.md"), "docs");
//! assert_eq!(paths::parent("guide.md"), paths::ROOT);
//! assert_eq!(paths::file_name("docs/guide.md"), "guide.md");
//! ```

use thiserror::Error;

/// Path separator used by the remote tree.
pub const SEPARATOR: char = '/';

/// The repository root.
pub const ROOT: &str = "";

/// Errors from path normalization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("path '{0}' contains a relative segment")]
    RelativeSegment(String),
}

/// Normalize a caller-supplied path.
///
/// Strips leading and trailing separators. The root normalizes to `""`.
///
/// # Errors
///
/// Returns `PathError` for `a//b`, or for any `.` or `..` segment.
pub fn normalize(path: &str) -> Result<String, PathError> {
    let trimmed = path.trim_start_matches(SEPARATOR).trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        return Ok(ROOT.to_string());
    }
    for segment in trimmed.split(SEPARATOR) {
        if segment.is_empty() {
            return Err(PathError::EmptySegment(path.to_string()));
        }
        if segment == "." || segment == ".." {
            return Err(PathError::RelativeSegment(path.to_string()));
        }
    }
    Ok(trimmed.to_string())
}

/// Whether `path` is the repository root.
pub fn is_root(path: &str) -> bool {
    path.is_empty()
}

/// Parent directory of a normalized path; `ROOT` for top-level paths
/// and for the root itself.
pub fn parent(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[..idx],
        None => ROOT,
    }
}

/// Final component of a normalized path.
pub fn file_name(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Join a directory and a relative name.
pub fn join(dir: &str, name: &str) -> String {
    if is_root(dir) {
        name.to_string()
    } else {
        format!("{dir}{SEPARATOR}{name}")
    }
}

/// Whether `path` lies strictly below `dir`.
pub fn is_descendant(path: &str, dir: &str) -> bool {
    if is_root(dir) {
        return !is_root(path);
    }
    path.len() > dir.len() + 1
        && path.starts_with(dir)
        && path.as_bytes()[dir.len()] == SEPARATOR as u8
}

/// Immediate child name of `path` relative to `dir`, if `path` is exactly
/// one segment below `dir`.
pub fn child_name<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    if !is_descendant(path, dir) {
        return None;
    }
    let rest = if is_root(dir) {
        path
    } else {
        &path[dir.len() + 1..]
    };
    (!rest.contains(SEPARATOR)).then_some(rest)
}

/// Every proper ancestor of `path`, from the top level downward,
/// excluding the root.
///
/// ```
/// use ghfs::core::paths::ancestors;
///
/// assert_eq!(ancestors("a/b/c"), vec!["a", "a/b"]);
/// assert!(ancestors("a").is_empty());
/// ```
pub fn ancestors(path: &str) -> Vec<&str> {
    path.match_indices(SEPARATOR)
        .map(|(idx, _)| &path[..idx])
        .collect()
}

/// Replace the `from` prefix of `path` with `to`. `path` must be `from` or
/// a descendant of it.
pub fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    if path == from {
        Some(to.to_string())
    } else if is_descendant(path, from) {
        Some(format!("{to}{}", &path[from.len()..]))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_separators() {
        assert_eq!(normalize("/a/b/").unwrap(), "a/b");
        assert_eq!(normalize("///").unwrap(), ROOT);
        assert_eq!(normalize("").unwrap(), ROOT);
    }

    #[test]
    fn normalize_rejects_bad_segments() {
        assert!(matches!(normalize("a//b"), Err(PathError::EmptySegment(_))));
        assert!(matches!(normalize("a/../b"), Err(PathError::RelativeSegment(_))));
        assert!(matches!(normalize("./a"), Err(PathError::RelativeSegment(_))));
    }

    #[test]
    fn parent_and_name() {
        assert_eq!(parent("a/b/c.txt"), "a/b");
        assert_eq!(parent("c.txt"), ROOT);
        assert_eq!(parent(ROOT), ROOT);
        assert_eq!(file_name("a/b/c.txt"), "c.txt");
        assert_eq!(file_name("c.txt"), "c.txt");
    }

    #[test]
    fn join_handles_root() {
        assert_eq!(join(ROOT, "x"), "x");
        assert_eq!(join("a", "x"), "a/x");
    }

    #[test]
    fn descendant_requires_separator_boundary() {
        assert!(is_descendant("a/b", "a"));
        assert!(is_descendant("a/b/c", "a"));
        assert!(!is_descendant("ab/c", "a"));
        assert!(!is_descendant("a", "a"));
        assert!(is_descendant("a", ROOT));
        assert!(!is_descendant(ROOT, ROOT));
    }

    #[test]
    fn child_name_is_one_level() {
        assert_eq!(child_name("a/b", "a"), Some("b"));
        assert_eq!(child_name("a/b/c", "a"), None);
        assert_eq!(child_name("a", ROOT), Some("a"));
        assert_eq!(child_name("a/b", ROOT), None);
    }

    #[test]
    fn rebase_moves_prefix() {
        assert_eq!(rebase("a/b/c", "a/b", "x").as_deref(), Some("x/c"));
        assert_eq!(rebase("a/b", "a/b", "x/y").as_deref(), Some("x/y"));
        assert_eq!(rebase("a/bc", "a/b", "x"), None);
    }
}
