//! File naming conventions shared by every stage.
//!
//! Fragments are recognised purely by name: anything ending in `.html` is a
//! fragment awaiting a template, everything else is an inert asset that is
//! copied but never rendered.
//!
//! ## Page Titles
//!
//! The page title is derived from the bare file name. The `.html` suffix is
//! dropped and underscores become spaces:
//! - `index.html` → "index"
//! - `getting_started.html` → "getting started"
//! - `release_notes_v2.html` → "release notes v2"
//!
//! ## Path Keys
//!
//! Snapshots and the ignore list compare paths as strings. [`path_key`]
//! produces the canonical form: relative to a root, `/`-separated.

use std::path::Path;

/// Suffix that marks a fragment file.
pub const FRAGMENT_SUFFIX: &str = ".html";

/// Whether a bare file name denotes a fragment.
pub fn is_fragment(file_name: &str) -> bool {
    file_name.ends_with(FRAGMENT_SUFFIX)
}

/// Derive the display title for a fragment from its bare file name.
///
/// - `"index.html"` → `"index"`
/// - `"getting_started.html"` → `"getting started"`
/// - `"notes"` → `"notes"` (no suffix to strip)
pub fn page_title(file_name: &str) -> String {
    file_name
        .strip_suffix(FRAGMENT_SUFFIX)
        .unwrap_or(file_name)
        .replace('_', " ")
}

/// Display label for a directory segment in breadcrumbs.
pub fn directory_title(dir_name: &str) -> String {
    dir_name.replace('_', " ")
}

/// Normalize a path string for suffix and key comparisons.
///
/// Backslashes become `/` and a leading `./` is dropped.
pub fn normalize(path: &str) -> String {
    let forward = path.replace('\\', "/");
    match forward.strip_prefix("./") {
        Some(rest) => rest.to_string(),
        None => forward,
    }
}

/// Key for `file` relative to `root`, `/`-separated.
///
/// Falls back to the full path when `file` is not under `root`.
pub fn path_key(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    normalize(&relative.to_string_lossy())
}

/// Whether [`path_key`] is lossless for `file`, i.e. the relative path is
/// valid UTF-8.
pub fn has_utf8_key(root: &Path, file: &Path) -> bool {
    file.strip_prefix(root).unwrap_or(file).to_str().is_some()
}
