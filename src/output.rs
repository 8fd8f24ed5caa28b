//! CLI output formatting for build reports.
//!
//! # Output Format
//!
//! ## Full build
//!
//! ```text
//! Rendered
//! 001 index → index.html
//! 002 getting started → guides/getting_started.html
//!
//! Ignored
//!     drafts/wip.html
//!
//! Failed
//!     broken.html
//!         Marker `<body>` not found in template sample_template.html
//!
//! Full build: 5 files copied, 2 pages rendered, 1 ignored, 1 failed
//! ```
//!
//! ## Incremental cycle
//!
//! ```text
//! Rendered
//! 001 getting started → guides/getting_started.html
//!
//! Skipped
//!     guides/removed.html (vanished before copy)
//!
//! Update: 2 modified, 1 file copied, 1 page rendered
//! ```
//!
//! An incremental cycle with nothing to do prints `No changes`.
//!
//! # Architecture
//!
//! [`format_report`] returns `Vec<String>` for testability and
//! [`print_report`] writes it to stdout. Formatting is pure: no I/O, no side
//! effects. Diagnostics go through `tracing` instead.

use crate::types::{BuildReport, CycleKind};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 file`, `2 files`.
fn count(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{} {}", n, singular)
    } else {
        format!("{} {}", n, plural)
    }
}

/// Format a build report as display lines.
pub fn format_report(report: &BuildReport) -> Vec<String> {
    if report.is_noop() {
        return vec!["No changes".to_string()];
    }

    let mut lines = Vec::new();

    if !report.rendered.is_empty() {
        lines.push("Rendered".to_string());
        for (i, file) in report.rendered.iter().enumerate() {
            lines.push(format!(
                "{} {} \u{2192} {}",
                format_index(i + 1),
                file.title,
                file.path
            ));
        }
    }

    if !report.ignored.is_empty() {
        push_section_break(&mut lines);
        lines.push("Ignored".to_string());
        for path in &report.ignored {
            lines.push(format!("{}{}", indent(1), path));
        }
    }

    if !report.missing.is_empty() {
        push_section_break(&mut lines);
        lines.push("Skipped".to_string());
        for path in &report.missing {
            lines.push(format!("{}{} (vanished before copy)", indent(1), path));
        }
    }

    if !report.failed.is_empty() {
        push_section_break(&mut lines);
        lines.push("Failed".to_string());
        for failed in &report.failed {
            lines.push(format!("{}{}", indent(1), failed.path));
            lines.push(format!("{}{}", indent(2), failed.error));
        }
    }

    push_section_break(&mut lines);
    lines.push(summary_line(report));
    lines
}

fn push_section_break(lines: &mut Vec<String>) {
    if !lines.is_empty() {
        lines.push(String::new());
    }
}

/// One-line summary closing every report.
pub fn summary_line(report: &BuildReport) -> String {
    let mut parts = Vec::new();
    let label = match report.kind {
        CycleKind::Full => "Full build",
        CycleKind::Incremental => {
            parts.push(format!("{} modified", report.modified));
            "Update"
        }
    };
    parts.push(format!("{} copied", count(report.copied, "file", "files")));
    parts.push(format!(
        "{} rendered",
        count(report.rendered.len(), "page", "pages")
    ));
    if !report.ignored.is_empty() {
        parts.push(format!("{} ignored", report.ignored.len()));
    }
    if !report.missing.is_empty() {
        parts.push(format!("{} skipped", report.missing.len()));
    }
    if !report.failed.is_empty() {
        parts.push(format!("{} failed", report.failed.len()));
    }
    format!("{}: {}", label, parts.join(", "))
}

/// Print a build report to stdout.
pub fn print_report(report: &BuildReport) {
    for line in format_report(report) {
        println!("{}", line);
    }
}
