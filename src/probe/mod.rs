//! Compiler flag compatibility probing.
//!
//! [`FlagProbe`] filters a list of compiler flags down to the ones the
//! configured compiler accepts. Dialect switches are tested with a trial
//! compilation and replaced with an older spelling when necessary;
//! front-end specific switches are dropped for other compilers. Every
//! resolution is cached per compiler and per original flag text.
//!
//! Rejections are advisories, not failures: the flag is dropped, a warning is
//! logged and configuration continues.

mod process;
mod table;

use std::collections::HashMap;

use tracing::{info, warn};

pub use process::ProcessProbe;
pub use table::{FlagPattern, PROBE_TABLE, ProbeRule, ProbeStrategy, is_front_end, lookup};

/// Oracle deciding whether a compiler accepts a flag for a language.
#[cfg_attr(test, mockall::automock)]
pub trait CompileProbe {
    /// Return `true` when `compiler` successfully compiles an empty
    /// translation unit in `language` with `flag`. A compiler that cannot be
    /// started counts as a rejection.
    fn accepts(&self, compiler: &str, flag: &str, language: &str) -> bool;
}

/// Cached flag normaliser.
///
/// # Examples
///
/// ```
/// use kumiki::probe::{CompileProbe, FlagProbe};
///
/// struct AcceptAll;
/// impl CompileProbe for AcceptAll {
///     fn accepts(&self, _: &str, _: &str, _: &str) -> bool { true }
/// }
///
/// let mut probe = FlagProbe::new(AcceptAll);
/// let flags = probe.normalize("g++", &["-std=c++11".into(), "-ferror-limit=3".into()]);
/// assert_eq!(flags, ["-std=c++11"]);
/// ```
#[derive(Debug)]
pub struct FlagProbe<P> {
    oracle: P,
    table: &'static [ProbeRule],
    cache: HashMap<String, HashMap<String, Option<String>>>,
}

impl FlagProbe<ProcessProbe> {
    /// Probe with real compiler processes and the built-in table.
    #[must_use]
    pub fn system() -> Self {
        Self::new(ProcessProbe)
    }
}

impl<P: CompileProbe> FlagProbe<P> {
    /// Create a probe backed by `oracle` using [`PROBE_TABLE`].
    #[must_use]
    pub fn new(oracle: P) -> Self {
        Self::with_table(oracle, PROBE_TABLE)
    }

    /// Create a probe backed by `oracle` using a custom decision table.
    #[must_use]
    pub fn with_table(oracle: P, table: &'static [ProbeRule]) -> Self {
        Self {
            oracle,
            table,
            cache: HashMap::new(),
        }
    }

    /// Return the subset of `flags` accepted by `compiler`, substituting
    /// fallback spellings where the table provides them. Order is preserved.
    pub fn normalize(&mut self, compiler: &str, flags: &[String]) -> Vec<String> {
        flags
            .iter()
            .filter_map(|flag| self.resolve(compiler, flag))
            .collect()
    }

    /// Resolve a single flag, consulting the cache first.
    pub fn resolve(&mut self, compiler: &str, flag: &str) -> Option<String> {
        if let Some(cached) = self.cache.get(compiler).and_then(|known| known.get(flag)) {
            return cached.clone();
        }
        let Some(rule) = lookup(self.table, flag) else {
            return Some(flag.to_owned());
        };
        let resolved = match rule.strategy {
            ProbeStrategy::Dialect {
                language,
                fallbacks,
            } => self.probe_dialect(compiler, flag, language, fallbacks),
            ProbeStrategy::FrontEnd { compilers } => {
                is_front_end(compiler, compilers).then(|| flag.to_owned())
            }
        };
        self.remember(compiler, flag, resolved.clone());
        resolved
    }

    fn probe_dialect(
        &mut self,
        compiler: &str,
        flag: &str,
        language: &str,
        fallbacks: &[&str],
    ) -> Option<String> {
        if self.oracle.accepts(compiler, flag, language) {
            return Some(flag.to_owned());
        }
        for fallback in fallbacks {
            let accepted = self.oracle.accepts(compiler, fallback, language);
            let outcome = accepted.then(|| (*fallback).to_owned());
            self.remember(compiler, fallback, outcome.clone());
            if accepted {
                info!(compiler, flag, fallback, "limited support: using fallback spelling");
                return outcome;
            }
        }
        warn!(compiler, flag, "compiler rejected flag; building without it");
        None
    }

    fn remember(&mut self, compiler: &str, flag: &str, outcome: Option<String>) {
        self.cache
            .entry(compiler.to_owned())
            .or_default()
            .insert(flag.to_owned(), outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use rstest::rstest;

    fn flags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    #[rstest]
    fn accepted_dialect_flag_is_cached() {
        let mut oracle = MockCompileProbe::new();
        oracle
            .expect_accepts()
            .with(eq("g++"), eq("-std=c++11"), eq("c++"))
            .times(1)
            .return_const(true);
        let mut probe = FlagProbe::new(oracle);
        assert_eq!(probe.normalize("g++", &flags(&["-std=c++11"])), ["-std=c++11"]);
        assert_eq!(probe.normalize("g++", &flags(&["-std=c++11"])), ["-std=c++11"]);
    }

    #[rstest]
    fn rejected_dialect_uses_fallback() {
        let mut oracle = MockCompileProbe::new();
        oracle
            .expect_accepts()
            .with(eq("g++-4.6"), eq("-std=c++11"), eq("c++"))
            .times(1)
            .return_const(false);
        oracle
            .expect_accepts()
            .with(eq("g++-4.6"), eq("-std=c++0x"), eq("c++"))
            .times(1)
            .return_const(true);
        let mut probe = FlagProbe::new(oracle);
        let requested = flags(&["-Wall", "-std=c++11", "-std=c++0x"]);
        assert_eq!(probe.normalize("g++-4.6", &requested), ["-Wall", "-std=c++0x", "-std=c++0x"]);
        assert_eq!(probe.normalize("g++-4.6", &requested), ["-Wall", "-std=c++0x", "-std=c++0x"]);
    }

    #[rstest]
    fn fully_rejected_dialect_is_dropped() {
        let mut oracle = MockCompileProbe::new();
        oracle.expect_accepts().times(2).return_const(false);
        let mut probe = FlagProbe::new(oracle);
        assert!(probe.normalize("cc", &flags(&["-std=c++11"])).is_empty());
        assert!(probe.normalize("cc", &flags(&["-std=c++11", "-std=c++0x"])).is_empty());
    }

    #[rstest]
    fn cache_is_per_compiler() {
        let mut oracle = MockCompileProbe::new();
        oracle
            .expect_accepts()
            .with(eq("clang++"), eq("-std=c++14"), eq("c++"))
            .times(1)
            .return_const(true);
        oracle
            .expect_accepts()
            .with(eq("old-g++"), eq("-std=c++14"), eq("c++"))
            .times(1)
            .return_const(false);
        oracle
            .expect_accepts()
            .with(eq("old-g++"), eq("-std=c++1y"), eq("c++"))
            .times(1)
            .return_const(false);
        let mut probe = FlagProbe::new(oracle);
        assert_eq!(probe.resolve("clang++", "-std=c++14").as_deref(), Some("-std=c++14"));
        assert_eq!(probe.resolve("old-g++", "-std=c++14"), None);
    }

    #[rstest]
    #[case("clang++", &["-ferror-limit=5", "-Weverything"])]
    #[case("/opt/llvm/bin/clang", &["-ferror-limit=5", "-Weverything"])]
    #[case("g++", &[])]
    fn front_end_flags_follow_compiler_name(#[case] compiler: &str, #[case] expected: &[&str]) {
        let mut oracle = MockCompileProbe::new();
        oracle.expect_accepts().never();
        let mut probe = FlagProbe::new(oracle);
        assert_eq!(
            probe.normalize(compiler, &flags(&["-ferror-limit=5", "-Weverything"])),
            flags(expected)
        );
    }

    #[rstest]
    fn unknown_flags_pass_through_without_probing() {
        let mut oracle = MockCompileProbe::new();
        oracle.expect_accepts().never();
        let mut probe = FlagProbe::new(oracle);
        let requested = flags(&["-O2", "-Wall", "-fPIC"]);
        assert_eq!(probe.normalize("cc", &requested), requested);
    }

    #[rstest]
    fn custom_table_adds_rules() {
        const TABLE: &[ProbeRule] = &[ProbeRule {
            pattern: FlagPattern::Prefix("-fsanitize="),
            strategy: ProbeStrategy::Dialect {
                language: "c",
                fallbacks: &[],
            },
        }];
        let mut oracle = MockCompileProbe::new();
        oracle
            .expect_accepts()
            .with(eq("cc"), eq("-fsanitize=address"), eq("c"))
            .times(1)
            .return_const(false);
        let mut probe = FlagProbe::with_table(oracle, TABLE);
        assert!(probe.normalize("cc", &flags(&["-fsanitize=address", "-std=c++11"])) == ["-std=c++11"]);
    }
}
