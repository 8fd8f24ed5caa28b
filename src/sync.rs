//! Mirroring the content tree into the output tree.
//!
//! Two modes:
//!
//! - [`full_sync`] discards the output tree and copies the whole content tree.
//! - [`selective_sync`] copies only the listed files, creating directories as
//!   needed and overwriting what is there.
//!
//! Copies preserve the source modification time so the output tree looks
//! exactly like the content tree until the renderer rewrites fragments.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Cannot clear output directory {}: {source}", .path.display())]
    Clear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot scan content tree: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Cannot create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Cannot copy {} to {}: {source}", .from.display(), .to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result of a [`selective_sync`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SelectiveSync {
    /// Destination paths written, in input order.
    pub copied: Vec<PathBuf>,
    /// Input paths that no longer existed in the content tree.
    pub missing: Vec<String>,
}

/// Replace `output_dir` with a fresh copy of `content_dir`.
///
/// Returns the number of files copied.
pub fn full_sync(content_dir: &Path, output_dir: &Path) -> Result<usize, SyncError> {
    if output_dir.exists() {
        fs::remove_dir_all(output_dir).map_err(|source| SyncError::Clear {
            path: output_dir.to_path_buf(),
            source,
        })?;
    }

    let mut copied = 0;
    for entry in WalkDir::new(content_dir)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_dangling(&e) => {
                warn!(error = %e, "skipping dangling entry");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let relative = entry
            .path()
            .strip_prefix(content_dir)
            .unwrap_or(entry.path());
        let dest = output_dir.join(relative);

        if entry.file_type().is_dir() {
            create_dir(&dest)?;
        } else if entry.file_type().is_file() {
            copy_preserving(entry.path(), &dest)?;
            copied += 1;
        }
    }

    debug!(files = copied, from = %content_dir.display(), to = %output_dir.display(), "full sync");
    Ok(copied)
}

/// Copy each content-relative path in `paths` into the output tree.
///
/// Paths that vanished since they were detected are skipped and reported
/// in [`SelectiveSync::missing`]; any other I/O failure is an error.
pub fn selective_sync<I, S>(
    paths: I,
    content_dir: &Path,
    output_dir: &Path,
) -> Result<SelectiveSync, SyncError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = SelectiveSync::default();

    for path in paths {
        let path = path.as_ref();
        let source = content_dir.join(path);
        let dest = output_dir.join(path);

        if !source.is_file() {
            warn!(path, "source vanished before copy, skipping");
            result.missing.push(path.to_string());
            continue;
        }
        if let Some(parent) = dest.parent() {
            create_dir(parent)?;
        }
        match copy_preserving(&source, &dest) {
            Ok(()) => {
                debug!(path, "copied");
                result.copied.push(dest);
            }
            Err(SyncError::Copy { source: e, .. })
                if e.kind() == io::ErrorKind::NotFound && !source.exists() =>
            {
                warn!(path, "source vanished during copy, skipping");
                result.missing.push(path.to_string());
            }
            Err(e) => return Err(e),
        }
    }

    Ok(result)
}

/// A walk entry that disappeared or is a symlink to nothing.
pub(crate) fn is_dangling(err: &walkdir::Error) -> bool {
    err.io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

fn create_dir(path: &Path) -> Result<(), SyncError> {
    fs::create_dir_all(path).map_err(|source| SyncError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Copy one file, overwriting `to`, and carry over the modification time.
fn copy_preserving(from: &Path, to: &Path) -> Result<(), SyncError> {
    let copy = || -> io::Result<()> {
        fs::copy(from, to)?;
        let modified = fs::metadata(from)?.modified()?;
        File::options().write(true).open(to)?.set_modified(modified)?;
        Ok(())
    };
    copy().map_err(|source| SyncError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}
