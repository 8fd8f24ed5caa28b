//! Shared test utilities for the pagewrap test suite.
//!
//! Provides file-tree writers, timestamp control, snapshot builders, and a
//! [`TestSite`] that lays out content, template, output and snapshot paths
//! inside one temporary directory.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let site = TestSite::new();
//! site.content("index.html", "<p>hi</p>");
//! site.set_content_mtime("index.html", 100);
//!
//! site.builder().full_build().unwrap();
//! assert!(site.output("index.html").contains("<title>index</title>"));
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

use crate::builder::Builder;
use crate::config::SiteConfig;
use crate::render::{self, RenderError};
use crate::snapshot::Snapshot;
use crate::types::BuildReport;

/// Default-mode template: title on line 2, body anchor on line 4.
pub const DEFAULT_TEMPLATE: &str = include_str!("../fixtures/sample_template.html");

/// Toolbox-mode template using every token.
pub const TOOLBOX_TEMPLATE: &str = include_str!("../fixtures/toolbox_template.html");

pub const TEMPLATE_NAME: &str = "sample_template.html";

// =========================================================================
// File tree helpers
// =========================================================================

/// Write `content` to `root/relative`, creating parent directories.
pub fn write_file(root: &Path, relative: &str, content: &str) {
    write_bytes(root, relative, content.as_bytes());
}

pub fn write_bytes(root: &Path, relative: &str, content: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Read `root/relative` as text. Panics with the path on failure.
pub fn read(root: &Path, relative: &str) -> String {
    let path = root.join(relative);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

/// Every file under `root`, keyed by relative path, with its bytes.
pub fn tree_contents(root: &Path) -> BTreeMap<String, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let key = crate::naming::path_key(root, e.path());
            (key, std::fs::read(e.path()).unwrap())
        })
        .collect()
}

// =========================================================================
// Timestamps and snapshots
// =========================================================================

/// Set a file's modification time to `secs` after the epoch.
pub fn set_mtime(path: &Path, secs: u64) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

/// Whole seconds of a file's modification time.
pub fn mtime_secs(path: &Path) -> u64 {
    std::fs::metadata(path)
        .unwrap()
        .modified()
        .unwrap()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

pub fn snapshot_of(entries: &[(&str, f64)]) -> Snapshot {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

// =========================================================================
// Converters and reports
// =========================================================================

/// Default renderer that fails for one file name.
pub fn fail_on(
    bad_name: &str,
) -> impl Fn(&Path, &str, &Path) -> Result<(), RenderError> + 'static {
    let bad_name = bad_name.to_string();
    move |file: &Path, name: &str, template: &Path| {
        if name == bad_name {
            Err(RenderError::MarkerNotFound {
                marker: render::BODY_MARKER,
                template: template.to_path_buf(),
            })
        } else {
            render::render(template, file, name)
        }
    }
}

/// Rendered paths in report order.
pub fn rendered_paths(report: &BuildReport) -> Vec<&str> {
    report.rendered.iter().map(|r| r.path.as_str()).collect()
}

// =========================================================================
// Test site
// =========================================================================

/// A temporary project: `content/`, `out/`, a default template and a
/// snapshot file, all under one directory.
pub struct TestSite {
    tmp: TempDir,
}

impl TestSite {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(TEMPLATE_NAME), DEFAULT_TEMPLATE).unwrap();
        Self { tmp }
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root().join("content")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("out")
    }

    pub fn template_path(&self) -> PathBuf {
        self.root().join(TEMPLATE_NAME)
    }

    /// Write a content file.
    pub fn content(&self, relative: &str, text: &str) {
        write_file(&self.content_dir(), relative, text);
    }

    pub fn set_content_mtime(&self, relative: &str, secs: u64) {
        set_mtime(&self.content_dir().join(relative), secs);
    }

    /// Read an output file.
    pub fn output(&self, relative: &str) -> String {
        read(&self.output_dir(), relative)
    }

    pub fn config(&self) -> SiteConfig {
        SiteConfig {
            content_dir: self.content_dir(),
            output_dir: self.output_dir(),
            template: self.template_path(),
            snapshot_file: self.root().join("snapshot.json"),
            ..SiteConfig::default()
        }
    }

    pub fn builder(&self) -> Builder {
        Builder::from_config(&self.config()).unwrap()
    }
}
