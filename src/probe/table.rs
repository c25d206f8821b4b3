//! Flag probing decision table.
//!
//! Each entry pairs a [`FlagPattern`] with the [`ProbeStrategy`] used to decide
//! whether a compiler accepts the flag. Adding support for another flag means
//! adding a row; the normalisation loop never changes.

/// How a table row matches a requested flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagPattern {
    /// The flag text must match exactly.
    Exact(&'static str),
    /// The flag must start with the given prefix.
    Prefix(&'static str),
}

impl FlagPattern {
    /// Whether `flag` matches the pattern.
    #[must_use]
    pub fn matches(self, flag: &str) -> bool {
        match self {
            Self::Exact(text) => flag == text,
            Self::Prefix(prefix) => flag.starts_with(prefix),
        }
    }
}

/// How a matched flag is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStrategy {
    /// Trial-compile an empty translation unit in `language`. When the flag
    /// is rejected each fallback spelling is tried in order.
    Dialect {
        /// Source language passed to `-x`.
        language: &'static str,
        /// Older spellings accepted by previous compiler releases.
        fallbacks: &'static [&'static str],
    },
    /// Keep the flag only for the named compiler front ends.
    FrontEnd {
        /// Compiler binary names that understand the flag.
        compilers: &'static [&'static str],
    },
}

/// A row of the probe table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRule {
    /// Flags the row applies to.
    pub pattern: FlagPattern,
    /// Resolution strategy for matching flags.
    pub strategy: ProbeStrategy,
}

const CLANG: &[&str] = &["clang", "clang++"];

/// Built-in probe rules. The first matching row wins; unmatched flags pass
/// through unchanged.
pub const PROBE_TABLE: &[ProbeRule] = &[
    ProbeRule {
        pattern: FlagPattern::Exact("-std=c++11"),
        strategy: ProbeStrategy::Dialect {
            language: "c++",
            fallbacks: &["-std=c++0x"],
        },
    },
    ProbeRule {
        pattern: FlagPattern::Exact("-std=c++0x"),
        strategy: ProbeStrategy::Dialect {
            language: "c++",
            fallbacks: &[],
        },
    },
    ProbeRule {
        pattern: FlagPattern::Exact("-std=c++14"),
        strategy: ProbeStrategy::Dialect {
            language: "c++",
            fallbacks: &["-std=c++1y"],
        },
    },
    ProbeRule {
        pattern: FlagPattern::Exact("-std=c++17"),
        strategy: ProbeStrategy::Dialect {
            language: "c++",
            fallbacks: &["-std=c++1z"],
        },
    },
    ProbeRule {
        pattern: FlagPattern::Exact("-std=c11"),
        strategy: ProbeStrategy::Dialect {
            language: "c",
            fallbacks: &["-std=c1x"],
        },
    },
    ProbeRule {
        pattern: FlagPattern::Prefix("-ferror-limit="),
        strategy: ProbeStrategy::FrontEnd { compilers: CLANG },
    },
    ProbeRule {
        pattern: FlagPattern::Exact("-Weverything"),
        strategy: ProbeStrategy::FrontEnd { compilers: CLANG },
    },
];

/// Find the first rule in `table` matching `flag`.
#[must_use]
pub fn lookup<'t>(table: &'t [ProbeRule], flag: &str) -> Option<&'t ProbeRule> {
    table.iter().find(|rule| rule.pattern.matches(flag))
}

/// Whether the compiler at `compiler` is one of `names`.
///
/// Only the file name is compared, and a trailing `-<version>` suffix such as
/// `clang++-17` is ignored.
#[must_use]
pub fn is_front_end(compiler: &str, names: &[&str]) -> bool {
    let base = compiler.rsplit(['/', '\\']).next().unwrap_or(compiler);
    let base = base.strip_suffix(".exe").unwrap_or(base);
    let unversioned = match base.rsplit_once('-') {
        Some((stem, version))
            if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit() || c == '.') =>
        {
            stem
        }
        _ => base,
    };
    names.contains(&unversioned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("clang++", true)]
    #[case("/usr/bin/clang++", true)]
    #[case("clang++-17", true)]
    #[case("clang-15.0", true)]
    #[case("g++", false)]
    #[case("x86_64-linux-gnu-g++", false)]
    #[case("clang++-wrapper", false)]
    fn front_end_matching(#[case] compiler: &str, #[case] expected: bool) {
        assert_eq!(is_front_end(compiler, CLANG), expected);
    }

    #[rstest]
    fn lookup_prefers_first_matching_row() {
        let rule = lookup(PROBE_TABLE, "-ferror-limit=5").expect("row");
        assert_eq!(rule.pattern, FlagPattern::Prefix("-ferror-limit="));
        assert!(lookup(PROBE_TABLE, "-Wall").is_none());
    }
}
