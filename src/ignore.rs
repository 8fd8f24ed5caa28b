//! Output paths that are copied but never rendered.
//!
//! Matching is a plain suffix test on the normalized (`/`-separated) path,
//! not a glob: `wip.html` matches `drafts/wip.html` and also `notwip.html`.

use crate::naming;

#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    suffixes: Vec<String>,
}

impl IgnoreList {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| naming::normalize(s.as_ref()))
                .collect(),
        }
    }

    /// Whether `path` ends with any configured suffix.
    pub fn is_ignored(&self, path: &str) -> bool {
        let path = naming::normalize(path);
        self.suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()))
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.suffixes.is_empty()
    }
}
