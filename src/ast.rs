//! Kumiki manifest Abstract Syntax Tree structures.
//!
//! This module defines the data structures used to represent a parsed
//! `Kumikifile`. They mirror the YAML schema and are deserialised with
//! `serde-saphyr`.
//!
//! The following example shows how to parse a minimal manifest string:
//!
//! ```rust
//! use kumiki::ast::KumikiManifest;
//!
//! let yaml = "kumiki_version: \"1.0.0\"\nprojects:\n  - name: hello\n    inputs: [hello.c]";
//! let manifest: KumikiManifest = serde_saphyr::from_str(yaml).expect("parse");
//! assert_eq!(manifest.projects[0].name, "hello");
//! ```

use indexmap::IndexMap;
use itertools::Itertools;
use semver::Version;
use serde::{Deserialize, Serialize};
use shell_quote::{QuoteRefExt, Sh};

/// Default output directory prefix for projects.
pub const DEFAULT_OUTDIR: &str = "$(OUTDIR)";
/// Default intermediate directory prefix for projects.
pub const DEFAULT_INTDIR: &str = "$(INTDIR)";

/// Top-level manifest structure parsed from a `Kumikifile`.
///
/// ```yaml
/// kumiki_version: "1.0.0"
/// macros:
///   CXXFLAGS: [-std=c++11, -Wall]
/// projects:
///   - name: app
///     inputs: [main.cpp]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KumikiManifest {
    /// Semantic version of the manifest format.
    pub kumiki_version: Version,

    /// Makefile macro assignments, kept in declaration order.
    #[serde(default)]
    pub macros: IndexMap<String, StringOrList>,

    /// Targets listed under `.SILENT`. An empty list silences every recipe;
    /// omitting the key emits no `.SILENT` rule.
    #[serde(default)]
    pub silent: Option<Vec<String>>,

    /// Prerequisites of `.SUFFIXES`. An empty list clears make's built-in
    /// suffix list; omitting the key emits no `.SUFFIXES` rule.
    #[serde(default)]
    pub suffixes: Option<Vec<String>>,

    /// Projects translated into rules. The first one becomes the default goal.
    pub projects: Vec<ProjectDecl>,
}

/// Declaration of a single project.
///
/// Every optional field falls back to the documented default so manifests only
/// spell out what differs.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectDecl {
    /// Caller-facing project name.
    pub name: String,

    /// Source inputs. In precompiled-header mode these are header names,
    /// either local paths or `<system>` includes.
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Output directory prefix (default `$(OUTDIR)`).
    #[serde(default)]
    pub outdir: Option<String>,

    /// Output file name without directory (default: `name`).
    #[serde(default)]
    pub outname: Option<String>,

    /// Intermediate directory prefix (default `$(INTDIR)`).
    #[serde(default)]
    pub intdir: Option<String>,

    /// Language tag; inferred from input extensions when absent.
    #[serde(default)]
    pub lang: Option<String>,

    /// Commands appended to the output rule.
    #[serde(default)]
    pub postbuild: Vec<Command>,

    /// Commands appended to the alias rule, or the output rule without one.
    #[serde(default)]
    pub postexec: Vec<Command>,

    /// External prerequisites that Kumiki does not generate.
    #[serde(default)]
    pub extdeps: Vec<String>,

    /// Additional files removed by `make clean`.
    #[serde(default)]
    pub outs: Vec<String>,

    /// Extra compiler and linker flags.
    #[serde(default)]
    pub flags: FlagSet,

    /// Name of a precompiled-header project whose output is force-included
    /// into C++ compilations.
    #[serde(default)]
    pub precompiled: Option<String>,
}

impl ProjectDecl {
    /// Create a declaration with the given name and inputs.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumiki::ast::ProjectDecl;
    ///
    /// let decl = ProjectDecl::new("app", ["main.cpp"]);
    /// assert_eq!(decl.out_path(), "$(OUTDIR)app");
    /// ```
    #[must_use]
    pub fn new<I, S>(name: &str, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_owned(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Output directory prefix with the default applied.
    #[must_use]
    pub fn outdir(&self) -> &str {
        self.outdir.as_deref().unwrap_or(DEFAULT_OUTDIR)
    }

    /// Output file name with the default applied.
    #[must_use]
    pub fn outname(&self) -> &str {
        self.outname.as_deref().unwrap_or(&self.name)
    }

    /// Intermediate directory prefix with the default applied.
    #[must_use]
    pub fn intdir(&self) -> &str {
        self.intdir.as_deref().unwrap_or(DEFAULT_INTDIR)
    }

    /// Physical output path: `outdir` followed by `outname`.
    #[must_use]
    pub fn out_path(&self) -> String {
        format!("{}{}", self.outdir(), self.outname())
    }
}

/// Flag categories accepted on a project.
///
/// The four categories are fixed; there is no free-form lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlagSet {
    /// Flags passed to the C compiler after `$(CFLAGS)`.
    #[serde(default, rename = "compile-c")]
    pub compile_c: Vec<String>,
    /// Flags passed to the C++ compiler after `$(CXXFLAGS)`.
    #[serde(default, rename = "compile-c++")]
    pub compile_cxx: Vec<String>,
    /// Preprocessor flags shared by both compilers, after `$(CPPFLAGS)`.
    #[serde(default)]
    pub preprocessor: Vec<String>,
    /// Linker flags, always placed last on the link line.
    #[serde(default)]
    pub link: Vec<String>,
}

/// Recognised flag categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagCategory {
    /// `compile-c`
    CompileC,
    /// `compile-c++`
    CompileCxx,
    /// `preprocessor`
    Preprocessor,
    /// `link`
    Link,
}

impl FlagCategory {
    /// Manifest spelling of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CompileC => "compile-c",
            Self::CompileCxx => "compile-c++",
            Self::Preprocessor => "preprocessor",
            Self::Link => "link",
        }
    }
}

impl FlagSet {
    /// Borrow the flags for `category`.
    #[must_use]
    pub fn get(&self, category: FlagCategory) -> &[String] {
        match category {
            FlagCategory::CompileC => &self.compile_c,
            FlagCategory::CompileCxx => &self.compile_cxx,
            FlagCategory::Preprocessor => &self.preprocessor,
            FlagCategory::Link => &self.link,
        }
    }

    /// Mutably borrow the flags for `category`.
    pub fn get_mut(&mut self, category: FlagCategory) -> &mut Vec<String> {
        match category {
            FlagCategory::CompileC => &mut self.compile_c,
            FlagCategory::CompileCxx => &mut self.compile_cxx,
            FlagCategory::Preprocessor => &mut self.preprocessor,
            FlagCategory::Link => &mut self.link,
        }
    }
}

/// A recipe line.
///
/// A plain string is kept verbatim; a list is a sequence of tokens joined with
/// single spaces when the Makefile is written.
///
/// ```yaml
/// postbuild:
///   - "@echo done"          # literal
///   - [strip, "$@"]         # tokens
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// A shell line passed through unchanged.
    Literal(String),
    /// Tokens joined by single spaces.
    Tokens(Vec<String>),
}

impl Command {
    /// Build a token command from anything string-like.
    #[must_use]
    pub fn tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Tokens(tokens.into_iter().map(Into::into).collect())
    }

    /// Render the command as a single shell line.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Literal(line) => line.clone(),
            Self::Tokens(tokens) => tokens.join(" "),
        }
    }
}

/// A helper for fields that accept either a single string or a list of
/// strings.
///
/// ```yaml
/// # Scalar
/// CXX: clang++
/// # Sequence
/// CXXFLAGS:
///   - -Wall
///   - -std=c++11
/// ```
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum StringOrList {
    /// No value provided.
    #[default]
    Empty,
    /// A single string item.
    String(String),
    /// A list of string items.
    List(Vec<String>),
}

impl StringOrList {
    /// Render the value as a macro body: lists are joined with spaces.
    #[must_use]
    pub fn joined(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::String(s) => s.clone(),
            Self::List(items) => items.join(" "),
        }
    }

    /// Split the value into shell words.
    ///
    /// A string is split with POSIX shell quoting rules and list items are
    /// taken as they are. Returns `None` for a string with unbalanced quotes.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumiki::ast::StringOrList;
    ///
    /// let flags = StringOrList::String(r#"-DTAG='"a  b"' -O2"#.into());
    /// assert_eq!(flags.words(), Some(vec![r#"-DTAG="a  b""#.to_owned(), "-O2".to_owned()]));
    /// ```
    #[must_use]
    pub fn words(&self) -> Option<Vec<String>> {
        match self {
            Self::Empty => Some(Vec::new()),
            Self::String(s) => shlex::split(s),
            Self::List(items) => Some(items.clone()),
        }
    }

    /// Replace the words while keeping the value's shape.
    ///
    /// A string is rebuilt from `words`, quoting each one that would not
    /// survive shell splitting on its own.
    #[must_use]
    pub fn with_words(&self, words: Vec<String>) -> Self {
        match self {
            Self::String(_) => Self::String(words.iter().map(|word| shell_word(word)).join(" ")),
            Self::Empty | Self::List(_) => Self::List(words),
        }
    }
}

/// Quote `text` for a POSIX shell unless it already splits to itself.
pub(crate) fn shell_word(text: &str) -> String {
    if shlex::split(text).is_some_and(|words| words == [text]) {
        return text.to_owned();
    }
    let bytes: Vec<u8> = text.quoted(Sh);
    match String::from_utf8(bytes) {
        Ok(quoted) => quoted,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}
