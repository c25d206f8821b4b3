//! Translates manifest parsing errors into actionable diagnostics.
//!
//! `serde_saphyr` reports a line and column; [`map_yaml_error`] turns that
//! into a [`miette`] span over the manifest source and adds a hint for the
//! most common mistakes.

use std::fmt;

use miette::{Diagnostic, NamedSource, SourceSpan};
use serde_saphyr::{Error as YamlError, Location};
use thiserror::Error;

use super::hints::YAML_HINTS;

/// Display name for a manifest used in diagnostics, usually its path.
///
/// # Examples
/// ```rust
/// use kumiki::manifest::ManifestName;
/// let name = ManifestName::new("Kumikifile");
/// assert_eq!(name.as_str(), "Kumikifile");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestName(String);

impl ManifestName {
    /// Wrap a display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ManifestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error raised when a manifest cannot be loaded.
///
/// # Examples
/// ```rust
/// use miette::miette;
/// use kumiki::manifest::ManifestError;
///
/// let err = ManifestError::Parse {
///     name: "Kumikifile".into(),
///     source: miette!("bad manifest").into(),
/// };
/// assert_eq!(format!("{err}"), "failed to parse manifest 'Kumikifile'");
/// ```
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest '{path}'")]
    #[diagnostic(
        code(kumiki::manifest::read),
        help("run kumiki from the project directory or pass --file")
    )]
    Read {
        /// Path that was opened.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid YAML or does not match the schema.
    #[error("failed to parse manifest '{name}'")]
    #[diagnostic(code(kumiki::manifest::parse))]
    Parse {
        /// Display name of the manifest.
        name: String,
        /// Located YAML diagnostic.
        #[source]
        #[diagnostic_source]
        source: Box<dyn Diagnostic + Send + Sync + 'static>,
    },
}

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(kumiki::yaml::parse))]
struct YamlDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("parse error here")]
    span: Option<SourceSpan>,
    #[help]
    help: Option<String>,
    #[source]
    source: YamlError,
    message: String,
}

fn saturating_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

/// Byte offset of a one-based line and column in `src`, clamped to the end.
fn byte_index(src: &str, line: u64, column: u64) -> usize {
    let target_line = saturating_usize(line.saturating_sub(1));
    let target_column = saturating_usize(column.saturating_sub(1));
    let mut offset = 0usize;
    for (idx, segment) in src.split_inclusive('\n').enumerate() {
        if idx == target_line {
            let line = segment.strip_suffix('\n').unwrap_or(segment);
            let within = line
                .char_indices()
                .nth(target_column)
                .map_or(line.len(), |(byte, _)| byte);
            return offset + within;
        }
        offset += segment.len();
    }
    src.len()
}

fn to_span(src: &str, loc: Location) -> SourceSpan {
    let at = byte_index(src, loc.line(), loc.column());
    let len = src
        .get(at..)
        .and_then(|rest| rest.chars().next())
        .filter(|c| *c != '\n')
        .map_or(0, char::len_utf8);
    SourceSpan::new(at.into(), len)
}

fn has_tab_indent(src: &str, loc: Option<Location>) -> bool {
    let Some(loc) = loc else { return false };
    let line_idx = saturating_usize(loc.line().saturating_sub(1));
    src.lines()
        .nth(line_idx)
        .unwrap_or("")
        .chars()
        .take_while(|c| c.is_whitespace())
        .any(|c| c == '\t')
}

fn hint_for(err_str: &str, src: &str, loc: Option<Location>) -> Option<String> {
    if has_tab_indent(src, loc) {
        return Some("Use spaces for indentation; tabs are invalid in YAML.".into());
    }
    let lower = err_str.to_lowercase();
    YAML_HINTS
        .iter()
        .find(|(needle, _)| lower.contains(*needle))
        .map(|(_, hint)| (*hint).into())
}

/// Wrap a `serde_saphyr` error in a located diagnostic.
#[must_use]
pub fn map_yaml_error(
    err: YamlError,
    src: &str,
    name: &ManifestName,
) -> Box<dyn Diagnostic + Send + Sync + 'static> {
    let loc = err.location();
    let (line, col, span) = loc.map_or((1, 1, None), |l| (l.line(), l.column(), Some(to_span(src, l))));
    let err_str = err.to_string();
    let help = hint_for(&err_str, src, loc);
    let message = format!("YAML parse error at line {line}, column {col}: {err_str}");
    Box::new(YamlDiagnostic {
        src: NamedSource::new(name.as_str(), src.to_owned()),
        span,
        help,
        source: err,
        message,
    })
}
