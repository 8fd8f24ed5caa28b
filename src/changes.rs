//! Change detection between two snapshots.

use crate::snapshot::Snapshot;
use std::collections::BTreeSet;

/// Paths that are new or whose modification time increased.
///
/// A path is reported iff it is absent from `previous` or
/// `current[p] > previous[p]`. Deleted paths (only in `previous`) and paths
/// whose timestamp went backwards or stayed equal are never reported.
pub fn compute_modified(previous: &Snapshot, current: &Snapshot) -> BTreeSet<String> {
    current
        .iter()
        .filter(|(path, modified)| match previous.get(path) {
            Some(seen) => *modified > seen,
            None => true,
        })
        .map(|(path, _)| path.to_string())
        .collect()
}
