//! Build orchestration: full builds, incremental cycles, and the watch loop.
//!
//! ## Full build
//!
//! ```text
//! IDLE → SNAPSHOTTING → SYNCING → RENDERING → PERSISTING → IDLE
//! ```
//!
//! The baseline snapshot is captured **before** the output tree is touched, so
//! anything edited while the build runs shows up as modified in the next
//! incremental cycle.
//!
//! ## Incremental cycle
//!
//! ```text
//! DETECT → (no-op | SYNC-SUBSET → RENDER-SUBSET → PERSIST)
//! ```
//!
//! [`Builder::watch`] repeats the cycle after a fixed sleep, forever. There is
//! no in-band cancellation; stop the process to stop watching.
//!
//! ## Failures
//!
//! Inputs (content directory, template, converter) are checked before the
//! output tree is mutated. Render failures are isolated per file: the file is
//! reported and dropped from the snapshot that gets persisted, so the next
//! cycle sees it as new and tries again. With `fail_fast` the first render
//! failure aborts the cycle and nothing is persisted.
//!
//! Deleted content files are not removed from the output tree.

use crate::changes::compute_modified;
use crate::config::{ConfigError, SiteConfig};
use crate::ignore::IgnoreList;
use crate::naming;
use crate::registry::{self, ConversionRegistry, Converter, RegistryError};
use crate::render::RenderError;
use crate::snapshot::{Snapshot, SnapshotError, SnapshotStore};
use crate::sync::{self, SyncError};
use crate::types::{BuildReport, CycleKind, FailedFile, RenderedFile};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Content directory not found: {}", .0.display())]
    MissingContentDir(PathBuf),
    #[error("Template not found: {}", .0.display())]
    MissingTemplate(PathBuf),
    #[error("Converter error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Failed to render {path}: {source}")]
    Render {
        path: String,
        #[source]
        source: RenderError,
    },
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("Cannot scan output tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Drives builds for one content/output directory pair.
#[derive(Debug)]
pub struct Builder {
    content_dir: PathBuf,
    output_dir: PathBuf,
    template: PathBuf,
    ignore: IgnoreList,
    store: SnapshotStore,
    registry: Option<ConversionRegistry>,
    fail_fast: bool,
}

impl Builder {
    /// Validate `config` and assemble a builder from it.
    pub fn from_config(config: &SiteConfig) -> Result<Self, BuildError> {
        config.validate()?;
        let registry = config
            .converters
            .as_ref()
            .map(|entries| ConversionRegistry::from_config(entries, &config.output_dir));

        Ok(Self {
            content_dir: config.content_dir.clone(),
            output_dir: config.output_dir.clone(),
            template: config.template.clone(),
            ignore: IgnoreList::new(&config.ignore),
            store: SnapshotStore::new(&config.snapshot_file),
            registry,
            fail_fast: config.fail_fast,
        })
    }

    /// Replace the converter registry, e.g. with caller-supplied converters.
    pub fn with_registry(mut self, registry: ConversionRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Check the content directory, template, and converter without
    /// touching any tree.
    pub fn check(&self) -> Result<(), BuildError> {
        self.prepare().map(|_| ())
    }

    /// Check everything a cycle needs before the output tree is touched.
    fn prepare(&self) -> Result<&dyn Converter, BuildError> {
        if !self.content_dir.is_dir() {
            return Err(BuildError::MissingContentDir(self.content_dir.clone()));
        }
        if !self.template.is_file() {
            return Err(BuildError::MissingTemplate(self.template.clone()));
        }
        Ok(registry::resolve(self.registry.as_ref(), &self.template)?)
    }

    /// Discard the output tree, rebuild it, and persist a fresh baseline.
    pub fn full_build(&self) -> Result<BuildReport, BuildError> {
        let converter = self.prepare()?;
        info!(
            content = %self.content_dir.display(),
            output = %self.output_dir.display(),
            "full build"
        );

        let mut baseline = Snapshot::capture(&self.content_dir)?;
        // Until the new baseline is saved, an aborted build leaves no snapshot
        // and the next cycle treats every file as new.
        self.store.clear()?;
        let mut report = BuildReport::new(CycleKind::Full);
        report.copied = sync::full_sync(&self.content_dir, &self.output_dir)?;

        let fragments = self.collect_fragments()?;
        self.render_files(converter, &fragments, &mut report, &mut baseline)?;

        self.store.save(&baseline)?;
        Ok(report)
    }

    /// Copy and re-render only what changed since the persisted snapshot.
    pub fn incremental_cycle(&self) -> Result<BuildReport, BuildError> {
        let converter = self.prepare()?;

        let previous = self.store.load();
        let current = Snapshot::capture(&self.content_dir)?;
        self.apply_changes(converter, &previous, current)
    }

    /// Sync, render, and persist whatever differs between `previous` and
    /// `current`.
    fn apply_changes(
        &self,
        converter: &dyn Converter,
        previous: &Snapshot,
        mut current: Snapshot,
    ) -> Result<BuildReport, BuildError> {
        let modified = compute_modified(previous, &current);

        let mut report = BuildReport::new(CycleKind::Incremental);
        if modified.is_empty() {
            debug!("no changes detected");
            return Ok(report);
        }
        report.modified = modified.len();
        info!(files = modified.len(), "changes detected");

        let synced = sync::selective_sync(&modified, &self.content_dir, &self.output_dir)?;
        report.copied = synced.copied.len();
        for key in &synced.missing {
            current.remove(key);
        }
        report.missing = synced.missing;

        self.render_files(converter, &synced.copied, &mut report, &mut current)?;

        self.store.save(&current)?;
        Ok(report)
    }

    /// Poll for changes every `interval`, forever.
    ///
    /// Each cycle's outcome is handed to `on_cycle`. A failed cycle does not
    /// advance the snapshot, so its work is retried on the next poll.
    pub fn watch<F>(&self, interval: Duration, mut on_cycle: F) -> !
    where
        F: FnMut(Result<BuildReport, BuildError>),
    {
        info!(
            content = %self.content_dir.display(),
            interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            "watching for changes"
        );
        loop {
            thread::sleep(interval);
            on_cycle(self.incremental_cycle());
        }
    }

    /// Every fragment under the output tree, in path order.
    ///
    /// Directories without any fragment are reported but are not an error.
    fn collect_fragments(&self) -> Result<Vec<PathBuf>, BuildError> {
        let mut fragments = Vec::new();
        let mut per_dir: BTreeMap<PathBuf, usize> = BTreeMap::new();

        for entry in WalkDir::new(&self.output_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if sync::is_dangling(&e) => continue,
                Err(e) => return Err(e.into()),
            };
            if entry.file_type().is_dir() {
                per_dir.entry(entry.path().to_path_buf()).or_insert(0);
            } else if entry.file_type().is_file()
                && naming::is_fragment(&entry.file_name().to_string_lossy())
            {
                if let Some(parent) = entry.path().parent() {
                    *per_dir.entry(parent.to_path_buf()).or_insert(0) += 1;
                }
                fragments.push(entry.into_path());
            }
        }

        for (dir, count) in &per_dir {
            if *count == 0 {
                info!(dir = %naming::path_key(&self.output_dir, dir), "no fragments found");
            }
        }
        Ok(fragments)
    }

    /// Render each fragment among `files`, recording outcomes in `report`.
    ///
    /// Failed files are removed from `snapshot` so the next cycle retries them.
    fn render_files(
        &self,
        converter: &dyn Converter,
        files: &[PathBuf],
        report: &mut BuildReport,
        snapshot: &mut Snapshot,
    ) -> Result<(), BuildError> {
        for file in files {
            let Some(file_name) = file.file_name().map(|n| n.to_string_lossy().into_owned())
            else {
                continue;
            };
            if !naming::is_fragment(&file_name) {
                continue;
            }

            let key = naming::path_key(&self.output_dir, file);
            if self.ignore.is_ignored(&file.to_string_lossy()) {
                debug!(path = %key, "ignored");
                report.ignored.push(key);
                continue;
            }

            match converter.convert(file, &file_name, &self.template) {
                Ok(()) => {
                    debug!(path = %key, "rendered");
                    report.rendered.push(RenderedFile {
                        path: key,
                        title: naming::page_title(&file_name),
                    });
                }
                Err(source) if self.fail_fast => {
                    return Err(BuildError::Render { path: key, source });
                }
                Err(e) => {
                    warn!(path = %key, error = %e, "render failed");
                    snapshot.remove(&key);
                    report.failed.push(FailedFile {
                        path: key,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
