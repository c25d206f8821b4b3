//! Toolchain selection and flag normalisation.
//!
//! Configuration runs between loading the manifest and assembling the graph.
//! It fixes the `CC` and `CXX` macros and filters every compile flag list
//! through a [`FlagProbe`] so the generated Makefile only passes switches the
//! selected compilers accept.

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::ast::{FlagCategory, KumikiManifest, StringOrList};
use crate::probe::{CompileProbe, FlagProbe};

/// Compiler used for C sources when nothing else is configured.
pub const DEFAULT_CC: &str = "cc";
/// Compiler used for C++ sources when nothing else is configured.
pub const DEFAULT_CXX: &str = "c++";

/// Compilers requested on the command line or through the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainOverrides {
    /// C compiler override.
    pub cc: Option<String>,
    /// C++ compiler override.
    pub cxx: Option<String>,
}

/// The compilers the Makefile will invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Value of the `CC` macro.
    pub cc: String,
    /// Value of the `CXX` macro.
    pub cxx: String,
}

impl Toolchain {
    /// Pick each compiler from the overrides, then the manifest macros, then
    /// the built-in default. Empty values are ignored at every step.
    ///
    /// # Examples
    ///
    /// ```
    /// use indexmap::IndexMap;
    /// use kumiki::ast::StringOrList;
    /// use kumiki::configure::{Toolchain, ToolchainOverrides};
    ///
    /// let macros = IndexMap::from([("CXX".to_owned(), StringOrList::String("clang++".into()))]);
    /// let overrides = ToolchainOverrides { cc: Some("gcc-13".into()), cxx: None };
    /// let toolchain = Toolchain::resolve(&overrides, &macros);
    /// assert_eq!(toolchain.cc, "gcc-13");
    /// assert_eq!(toolchain.cxx, "clang++");
    /// ```
    #[must_use]
    pub fn resolve(overrides: &ToolchainOverrides, macros: &IndexMap<String, StringOrList>) -> Self {
        Self {
            cc: pick(overrides.cc.as_deref(), macros.get("CC"), DEFAULT_CC),
            cxx: pick(overrides.cxx.as_deref(), macros.get("CXX"), DEFAULT_CXX),
        }
    }

    /// Compiler that handles `category`, if the category is compiled.
    #[must_use]
    pub fn compiler_for(&self, category: FlagCategory) -> Option<&str> {
        match category {
            FlagCategory::CompileC => Some(self.cc.as_str()),
            FlagCategory::CompileCxx => Some(self.cxx.as_str()),
            FlagCategory::Preprocessor | FlagCategory::Link => None,
        }
    }
}

fn pick(flag: Option<&str>, configured: Option<&StringOrList>, fallback: &str) -> String {
    flag.map(str::to_owned)
        .filter(|value| !value.trim().is_empty())
        .or_else(|| configured.map(StringOrList::joined).filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| fallback.to_owned())
}

/// Macro holding the flags for each compiled category.
const FLAG_MACROS: [(&str, FlagCategory); 2] =
    [("CFLAGS", FlagCategory::CompileC), ("CXXFLAGS", FlagCategory::CompileCxx)];

/// Apply `toolchain` to `manifest` and, when a probe is given, normalise the
/// `CFLAGS`/`CXXFLAGS` macros and every project's compile flags.
///
/// String macros are split into shell words before probing and left
/// byte-for-byte unchanged when every word is accepted.
///
/// Preprocessor and link flags are never probed.
pub fn configure<P: CompileProbe>(
    manifest: &mut KumikiManifest,
    toolchain: &Toolchain,
    probe: Option<&mut FlagProbe<P>>,
) {
    manifest
        .macros
        .insert("CC".to_owned(), StringOrList::String(toolchain.cc.clone()));
    manifest
        .macros
        .insert("CXX".to_owned(), StringOrList::String(toolchain.cxx.clone()));
    info!(cc = %toolchain.cc, cxx = %toolchain.cxx, "selected toolchain");

    let Some(probe) = probe else {
        debug!("flag probing disabled");
        return;
    };

    for (name, category) in FLAG_MACROS {
        let Some(compiler) = toolchain.compiler_for(category) else {
            continue;
        };
        let Some(value) = manifest.macros.get_mut(name) else {
            continue;
        };
        let Some(words) = value.words() else {
            warn!(name, "unbalanced quotes in macro; flags left unprobed");
            continue;
        };
        let flags = probe.normalize(compiler, &words);
        if flags != words {
            debug!(name, ?flags, "normalised macro flags");
            *value = value.with_words(flags);
        }
    }

    for project in &mut manifest.projects {
        for (_, category) in FLAG_MACROS {
            let Some(compiler) = toolchain.compiler_for(category) else {
                continue;
            };
            let flags = project.flags.get_mut(category);
            if !flags.is_empty() {
                *flags = probe.normalize(compiler, flags);
            }
        }
    }
}
