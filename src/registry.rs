//! Template → converter resolution.
//!
//! A converter turns a fragment file into a full document in place. The
//! registry maps a template's **basename** (never its full path) to the
//! converter that understands that template's markers.
//!
//! Resolution rules:
//!
//! | Registry | Key present | Result |
//! |----------|-------------|--------|
//! | not supplied | — | built-in [`MarkerRenderer`] |
//! | supplied | yes | registered converter |
//! | supplied | no | [`RegistryError::Unregistered`] |
//!
//! A supplied registry replaces the default behaviour entirely, so a missing
//! key is a configuration mistake rather than a reason to fall back.

use crate::config::ConverterKind;
use crate::render::{MarkerRenderer, RenderError, ToolboxRenderer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Renders one content file in place using a template.
///
/// Any `Fn(&Path, &str, &Path) -> Result<(), RenderError>` is a converter,
/// taking `(content_file, bare_file_name, template)`.
pub trait Converter {
    fn convert(&self, content_file: &Path, file_name: &str, template: &Path) -> Result<(), RenderError>;
}

impl<F> Converter for F
where
    F: Fn(&Path, &str, &Path) -> Result<(), RenderError>,
{
    fn convert(&self, content_file: &Path, file_name: &str, template: &Path) -> Result<(), RenderError> {
        self(content_file, file_name, template)
    }
}

static DEFAULT_CONVERTER: MarkerRenderer = MarkerRenderer;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("No converter registered for template `{template}` (available: {})", .available.join(", "))]
    Unregistered {
        template: String,
        available: Vec<String>,
    },
    #[error("Template path has no file name: {0}")]
    NoBasename(String),
}

/// Named converters, keyed by template basename.
#[derive(Default)]
pub struct ConversionRegistry {
    converters: BTreeMap<String, Box<dyn Converter>>,
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

impl ConversionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `[converters]` config entries.
    ///
    /// Toolbox converters are bound to `output_root` for breadcrumbs and
    /// relative file references.
    pub fn from_config(entries: &BTreeMap<String, ConverterKind>, output_root: &Path) -> Self {
        let mut registry = Self::new();
        for (basename, kind) in entries {
            match kind {
                ConverterKind::Default => registry.register(basename, MarkerRenderer),
                ConverterKind::Toolbox => {
                    registry.register(basename, ToolboxRenderer::new(output_root))
                }
            }
        }
        registry
    }

    pub fn register(&mut self, basename: impl Into<String>, converter: impl Converter + 'static) {
        self.converters.insert(basename.into(), Box::new(converter));
    }

    pub fn get(&self, basename: &str) -> Option<&dyn Converter> {
        self.converters.get(basename).map(|c| c.as_ref())
    }

    /// Registered basenames in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.converters.keys().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

/// Resolve the converter for `template`.
pub fn resolve<'a>(
    registry: Option<&'a ConversionRegistry>,
    template: &Path,
) -> Result<&'a dyn Converter, RegistryError> {
    let Some(registry) = registry else {
        return Ok(&DEFAULT_CONVERTER);
    };

    let basename = template
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| RegistryError::NoBasename(template.display().to_string()))?;

    registry
        .get(&basename)
        .ok_or_else(|| RegistryError::Unregistered {
            template: basename,
            available: registry.keys(),
        })
}
