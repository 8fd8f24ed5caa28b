//! Shared types produced by the orchestrator and consumed by reporting.

/// Which kind of cycle produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleKind {
    /// Output tree discarded and rebuilt.
    Full,
    /// Only modified files copied and re-rendered.
    Incremental,
}

/// A fragment rendered into a full document.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFile {
    /// Output-root relative path, `/`-separated.
    pub path: String,
    /// Page title derived from the file name.
    pub title: String,
}

/// A fragment whose render failed. The error is kept as text so reports can
/// outlive the cycle that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedFile {
    pub path: String,
    pub error: String,
}

/// Outcome of one full build or incremental cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub kind: CycleKind,
    /// Number of content files detected as new or modified (incremental only).
    pub modified: usize,
    /// Number of files written into the output tree.
    pub copied: usize,
    pub rendered: Vec<RenderedFile>,
    /// Fragments skipped because of the ignore list.
    pub ignored: Vec<String>,
    /// Modified files that vanished before they could be copied.
    pub missing: Vec<String>,
    pub failed: Vec<FailedFile>,
}

impl BuildReport {
    pub fn new(kind: CycleKind) -> Self {
        Self {
            kind,
            modified: 0,
            copied: 0,
            rendered: Vec::new(),
            ignored: Vec::new(),
            missing: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// An incremental cycle that found nothing to do.
    pub fn is_noop(&self) -> bool {
        self.kind == CycleKind::Incremental && self.modified == 0
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
