//! Path and name helpers: child path construction, boundary checks, physical
//! name derivation from display labels, and locale-aware ordering.

use crate::error::StorageError;
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Join `name` onto `parent`, rejecting names that would leave `parent`
pub fn child_path(parent: &Path, name: &str) -> Result<PathBuf, StorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if invalid {
        return Err(StorageError::TraversalRejected {
            path: parent.join(name),
            boundary: parent.to_path_buf(),
        });
    }
    Ok(parent.join(name))
}

/// Lexically normalise a path, dropping `.` and resolving `..` against
/// preceding components. Returns `None` if `..` climbs above the start.
pub fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    let mut depth = 0usize;
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::RootDir | Component::Prefix(_) => out.push(component.as_os_str()),
        }
    }
    Some(out)
}

/// True when `path` lies at or below `boundary` after lexical normalisation
pub fn is_within(path: &Path, boundary: &Path) -> bool {
    match (normalize(path), normalize(boundary)) {
        (Some(path), Some(boundary)) => path.starts_with(boundary),
        _ => false,
    }
}

/// Fail with `TraversalRejected` unless `path` lies at or below `boundary`
pub fn ensure_within(path: &Path, boundary: &Path) -> Result<(), StorageError> {
    if is_within(path, boundary) {
        Ok(())
    } else {
        Err(StorageError::TraversalRejected {
            path: path.to_path_buf(),
            boundary: boundary.to_path_buf(),
        })
    }
}

/// Split `notes.txt` into (`notes`, Some(`txt`)). Dotfiles keep their name as stem.
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// `base`, `base (1)`, `base (2)`, ... with the extension re-attached
pub fn numbered_name(stem: &str, n: u32, extension: Option<&str>) -> String {
    let stem = if n == 0 {
        stem.to_string()
    } else {
        format!("{} ({})", stem, n)
    };
    match extension {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem,
    }
}

/// Candidate physical names in probing order
pub fn numbered_candidates<'a>(
    stem: &'a str,
    extension: Option<&'a str>,
) -> impl Iterator<Item = String> + 'a {
    (0u32..).map(move |n| numbered_name(stem, n, extension))
}

/// Derive a physical name stem from a display label.
///
/// Takes the first `max_chars` characters, replaces every run of
/// non-alphanumeric characters with a single `-`, and trims dashes at both
/// ends. Returns an empty string when nothing usable remains.
pub fn sanitize_display_name(display_name: &str, max_chars: usize) -> String {
    let mut out = String::new();
    let mut pending_dash = false;
    for c in display_name.chars().take(max_chars) {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out
}

fn collation_key(name: &str) -> String {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Locale-aware name ordering: accent- and case-insensitive first, then the
/// raw string as a tie-break so the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

/// Hidden entries start with a dot
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
