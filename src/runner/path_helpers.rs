//! Path resolution helpers for the runner module.
//!
//! Centralises manifest and output path logic so the main runner module stays
//! focused on command dispatch.

use camino::{Utf8Path, Utf8PathBuf};
use std::borrow::Cow;

use super::RunnerError;
use crate::cli::Cli;

/// Determine the manifest path respecting the CLI's directory option.
///
/// # Errors
///
/// Returns [`RunnerError::ManifestPathMissingName`] when the resolved path
/// ends in `..` or is a root.
pub(super) fn resolve_manifest_path(cli: &Cli) -> Result<Utf8PathBuf, RunnerError> {
    let resolved = resolve_output_path(cli, &cli.file).into_owned();
    if resolved.file_name().is_none() {
        return Err(RunnerError::ManifestPathMissingName { path: resolved });
    }
    Ok(resolved)
}

/// Resolve a path given on the command line relative to `-C/--directory`.
///
/// When `path` is relative and a directory has been configured, the returned
/// path is `directory/path`.
#[must_use]
pub(super) fn resolve_output_path<'a>(cli: &Cli, path: &'a Utf8Path) -> Cow<'a, Utf8Path> {
    if path.is_relative() {
        cli.directory
            .as_ref()
            .map_or_else(|| Cow::Borrowed(path), |dir| Cow::Owned(dir.join(path)))
    } else {
        Cow::Borrowed(path)
    }
}

/// Directory that relative source paths in the manifest are resolved against.
#[must_use]
pub(super) fn source_root(manifest_path: &Utf8Path) -> Utf8PathBuf {
    manifest_path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_path_buf)
}

pub(super) fn ensure_manifest_exists_or_error(
    cli: &Cli,
    manifest_path: &Utf8Path,
) -> Result<(), RunnerError> {
    if manifest_path.exists() {
        return Ok(());
    }
    let manifest_name = manifest_path
        .file_name()
        .ok_or_else(|| RunnerError::ManifestPathMissingName {
            path: manifest_path.to_path_buf(),
        })?
        .to_owned();
    let directory = if cli.directory.is_some() {
        let parent = manifest_path
            .parent()
            .map_or_else(|| manifest_path.as_str(), Utf8Path::as_str);
        format!("directory '{parent}'")
    } else {
        "the current directory".to_owned()
    };
    Err(RunnerError::ManifestNotFound {
        manifest_name,
        directory,
        path: manifest_path.to_path_buf(),
    })
}
