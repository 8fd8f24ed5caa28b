//! # pagewrap
//!
//! Wraps a tree of short-form HTML fragments in a reusable template and
//! writes the resulting documents to an output tree. Your filesystem is the
//! data source: every `.html` file under the content directory is a fragment,
//! everything else is copied as-is.
//!
//! # Architecture: Snapshot, Sync, Render
//!
//! ```text
//! 1. Snapshot   content/  →  path → mtime map     (what exists, and how fresh)
//! 2. Sync       content/  →  generated_html/      (full mirror, or just changed files)
//! 3. Render     fragments →  full documents        (in place, through a converter)
//! 4. Persist    snapshot  →  .pagewrap-snapshot.json
//! ```
//!
//! A full build runs all four steps over the whole tree. An incremental
//! cycle compares a fresh snapshot with the persisted one and runs steps 2–4
//! only for files that are new or whose modification time moved forward.
//! Watch mode repeats the incremental cycle on a fixed poll interval.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`builder`] | Orchestrates full builds, incremental cycles and the watch loop |
//! | [`snapshot`] | Captures, loads and atomically saves modification-time snapshots |
//! | [`changes`] | Computes the modified set between two snapshots |
//! | [`sync`] | Mirrors the content tree into the output tree (full or selective) |
//! | [`render`] | Default and toolbox marker renderers |
//! | [`registry`] | Resolves a template to its converter |
//! | [`ignore`] | Suffix-based ignore list |
//! | [`config`] | `pagewrap.toml` loading, merging and validation |
//! | [`naming`] | Fragment detection, page titles, path keys |
//! | [`output`] | CLI report formatting |
//! | [`types`] | Build report types |
//!
//! # Design Decisions
//!
//! ## Timestamps, Not Hashes
//!
//! Change detection compares modification times only. Touching a file
//! re-renders it even if the bytes are the same; restoring an old file with
//! its old timestamp does not. In exchange a cycle never reads file contents
//! it does not need to copy.
//!
//! ## Append-Only Output
//!
//! Deleting a content file does not delete its rendered page. Run a full
//! build to prune the output tree.
//!
//! ## Rendering Is Not Idempotent
//!
//! A renderer replaces the fragment with the wrapped document, so feeding an
//! already-rendered file through again nests a second template around it.
//! The orchestrator always re-copies a fragment from the content tree before
//! rendering it.
//!
//! ## Converters Are Static
//!
//! Templates map to converters through [`registry::ConversionRegistry`], a
//! plain map of named [`registry::Converter`] implementations assembled at
//! startup. Once a registry is configured, every template must be listed in
//! it; there is no silent fallback to the default renderer.

pub mod builder;
pub mod changes;
pub mod config;
pub mod ignore;
pub mod naming;
pub mod output;
pub mod registry;
pub mod render;
pub mod snapshot;
pub mod sync;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
