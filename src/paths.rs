//! Canonical document path handling.
//!
//! Every document is identified by its canonical path: a relative, `/`-separated path with no
//! `.` segments and no leading separator. The same source file always produces the same
//! canonical path regardless of how the discovery collaborator spelled it.

use crate::error::NotegraphError;

/// Normalize a source path into its canonical form.
///
/// Backslashes become `/`, leading `./` and `/` are dropped, empty and `.` segments are removed
/// and `..` pops the previous segment. A path that normalizes to nothing, or that escapes its
/// root, is rejected.
pub fn canonicalize(path: &str) -> Result<String, NotegraphError> {
    let mut segments: Vec<&str> = Vec::new();
    let unified = path.replace('\\', "/");
    for segment in unified.split('/') {
        match segment.trim() {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(NotegraphError::InvalidPath(path.to_string()));
                }
            }
            _ => segments.push(segment),
        }
    }
    if segments.is_empty() {
        return Err(NotegraphError::InvalidPath(path.to_string()));
    }
    Ok(segments.join("/"))
}

/// The extension of the final path segment, without the dot.
pub fn path_extension(path: &str) -> Option<&str> {
    let file_name = file_name(path);
    file_name
        .rfind('.')
        .filter(|idx| *idx > 0)
        .map(|idx| &file_name[idx + 1..])
}

/// The final path segment.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// The final path segment with its extension removed.
pub fn file_stem(path: &str) -> &str {
    let file_name = file_name(path);
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}

/// Remove the extension from `path` if it is one of `extensions`.
pub fn strip_extension<'a>(path: &'a str, extensions: &[String]) -> Option<&'a str> {
    let ext = path_extension(path)?;
    if extensions.iter().any(|known| known.eq_ignore_ascii_case(ext)) {
        Some(&path[..path.len() - ext.len() - 1])
    } else {
        None
    }
}

/// Slugify a heading into the fragment form used by renderers.
pub fn to_anchor(title: &str) -> String {
    title
        .trim()
        .to_lowercase()
        .replace(char::is_whitespace, "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect()
}
