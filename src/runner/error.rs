//! Error types for the runner module.

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised during command execution.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The manifest file does not exist at the expected path.
    #[error("no {manifest_name} found in {directory}")]
    #[diagnostic(
        code(kumiki::runner::manifest_not_found),
        help("create a {manifest_name} or point --file at an existing manifest")
    )]
    ManifestNotFound {
        /// Name of the expected manifest file (e.g., "Kumikifile").
        manifest_name: String,
        /// Directory description (e.g., "the current directory").
        directory: String,
        /// The path that was attempted.
        path: Utf8PathBuf,
    },

    /// The manifest path does not name a file.
    #[error("manifest path '{path}' has no file name")]
    #[diagnostic(code(kumiki::runner::manifest_path))]
    ManifestPathMissingName {
        /// Offending path.
        path: Utf8PathBuf,
    },
}
