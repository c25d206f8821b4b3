//! Manifest loading helpers.
//!
//! A `Kumikifile` is plain YAML deserialised straight into
//! [`KumikiManifest`]. Unknown keys are rejected by the schema and every
//! failure carries a located [`miette`] diagnostic, see [`ManifestError`].

use std::fs;

use camino::Utf8Path;
use tracing::debug;

use crate::ast::KumikiManifest;

mod diagnostics;
mod hints;

pub use diagnostics::{ManifestError, ManifestName, map_yaml_error};

/// File name looked up when no manifest path is given.
pub const DEFAULT_MANIFEST: &str = "Kumikifile";

fn from_str_named(yaml: &str, name: &ManifestName) -> Result<KumikiManifest, ManifestError> {
    let manifest: KumikiManifest =
        serde_saphyr::from_str(yaml).map_err(|e| ManifestError::Parse {
            name: name.to_string(),
            source: map_yaml_error(e, yaml, name),
        })?;
    debug!(
        manifest = %name,
        projects = manifest.projects.len(),
        macros = manifest.macros.len(),
        "parsed manifest"
    );
    Ok(manifest)
}

/// Parse a manifest from a YAML string.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] if the YAML is malformed or does not
/// match the schema.
///
/// # Examples
///
/// ```
/// let manifest = kumiki::manifest::from_str(
///     "kumiki_version: \"1.0.0\"\nprojects:\n  - name: app\n    inputs: [main.cpp]\n",
/// )
/// .expect("valid manifest");
/// assert_eq!(manifest.projects[0].inputs, ["main.cpp"]);
/// ```
pub fn from_str(yaml: &str) -> Result<KumikiManifest, ManifestError> {
    from_str_named(yaml, &ManifestName::new(DEFAULT_MANIFEST))
}

/// Load a [`KumikiManifest`] from the given file path.
///
/// # Errors
///
/// Returns [`ManifestError::Read`] if the file cannot be read and
/// [`ManifestError::Parse`] if its contents fail to parse.
pub fn from_path(path: impl AsRef<Utf8Path>) -> Result<KumikiManifest, ManifestError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_string(),
        source,
    })?;
    from_str_named(&data, &ManifestName::new(path.as_str()))
}

#[cfg(test)]
mod tests;
