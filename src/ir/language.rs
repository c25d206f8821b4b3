//! Project languages and source-extension classification.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Language of a project or a single input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// C sources compiled with `$(CC)`.
    C,
    /// C++ sources compiled with `$(CXX)`.
    Cxx,
    /// Precompiled C header.
    CHeader,
    /// Precompiled C++ header.
    CxxHeader,
}

impl Language {
    /// Manifest and `-x` spelling of the language.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::C => "c",
            Self::Cxx => "c++",
            Self::CHeader => "c-header",
            Self::CxxHeader => "c++-header",
        }
    }

    /// Whether the language selects precompiled-header mode.
    #[must_use]
    pub const fn is_header(self) -> bool {
        matches!(self, Self::CHeader | Self::CxxHeader)
    }

    /// Classify a source file by extension.
    ///
    /// Returns `None` for anything that is not a C or C++ translation unit.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumiki::ir::Language;
    ///
    /// assert_eq!(Language::from_source("src/a.cc"), Some(Language::Cxx));
    /// assert_eq!(Language::from_source("a.c"), Some(Language::C));
    /// assert_eq!(Language::from_source("a.h"), None);
    /// ```
    #[must_use]
    pub fn from_source(path: &str) -> Option<Self> {
        match extension(path) {
            ".cc" | ".cpp" | ".cxx" | ".c++" => Some(Self::Cxx),
            ".c" => Some(Self::C),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a language tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown language '{0}'; expected one of c, c++, c-header, c++-header")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "c" => Ok(Self::C),
            "c++" => Ok(Self::Cxx),
            "c-header" => Ok(Self::CHeader),
            "c++-header" => Ok(Self::CxxHeader),
            other => Err(UnknownLanguage(other.to_owned())),
        }
    }
}

/// Extension of the final path component including the leading dot, or an
/// empty string. Leading dots of hidden files do not count.
pub(crate) fn extension(path: &str) -> &str {
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rfind('.') {
        Some(0) | None => "",
        Some(idx) => file.get(idx..).unwrap_or(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("main.cpp", ".cpp")]
    #[case("dir.v2/main", "")]
    #[case(".hidden", "")]
    #[case("src/lib.c++", ".c++")]
    #[case("noext", "")]
    fn extension_of_last_component(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(extension(path), expected);
    }

    #[rstest]
    #[case("c", Language::C)]
    #[case("c++", Language::Cxx)]
    #[case("c-header", Language::CHeader)]
    #[case("c++-header", Language::CxxHeader)]
    fn parses_known_tags(#[case] tag: &str, #[case] expected: Language) {
        assert_eq!(tag.parse::<Language>(), Ok(expected));
        assert_eq!(expected.as_str(), tag);
    }

    #[rstest]
    fn rejects_unknown_tag() {
        assert_eq!(
            "fortran".parse::<Language>(),
            Err(UnknownLanguage("fortran".into()))
        );
    }

    #[rstest]
    fn unknown_tag_error_names_the_tag() {
        let err = "objc".parse::<Language>().expect_err("unknown tag");
        let source: &dyn std::error::Error = &err;
        assert_eq!(
            source.to_string(),
            "unknown language 'objc'; expected one of c, c++, c-header, c++-header"
        );
    }
}
