//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use crate::configure::ToolchainOverrides;
use crate::manifest::DEFAULT_MANIFEST;

/// Path argument meaning "write to standard output".
pub const STDOUT_PATH: &str = "-";

/// Generate a Makefile for C and C++ projects from a YAML manifest.
#[derive(Debug, Parser, Clone, PartialEq, Eq)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the Kumiki manifest file to use.
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_MANIFEST)]
    pub file: Utf8PathBuf,

    /// Run as if started in this directory.
    ///
    /// This affects manifest lookup, header scanning and the output path.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<Utf8PathBuf>,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Skip compiler flag probing and emit flags exactly as written.
    #[arg(long)]
    pub no_probe: bool,

    /// C compiler to configure; overrides the manifest's `CC` macro.
    #[arg(long, value_name = "CC", env = "CC")]
    pub cc: Option<String>,

    /// C++ compiler to configure; overrides the manifest's `CXX` macro.
    #[arg(long, value_name = "CXX", env = "CXX")]
    pub cxx: Option<String>,

    /// Optional subcommand to execute; defaults to `emit` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Emit(EmitArgs::default()));
        }
        self
    }

    /// Compiler overrides taken from the flags or environment.
    #[must_use]
    pub fn toolchain_overrides(&self) -> ToolchainOverrides {
        ToolchainOverrides {
            cc: self.cc.clone(),
            cxx: self.cxx.clone(),
        }
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            file: Utf8PathBuf::from(DEFAULT_MANIFEST),
            directory: None,
            verbose: false,
            no_probe: false,
            cc: None,
            cxx: None,
            command: None,
        }
        .with_default_command()
    }
}

/// Arguments accepted by the `emit` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct EmitArgs {
    /// Where to write the Makefile; `-` writes to standard output.
    #[arg(value_name = "OUTPUT", default_value = "Makefile")]
    pub output: Utf8PathBuf,
}

impl Default for EmitArgs {
    fn default() -> Self {
        Self {
            output: Utf8PathBuf::from("Makefile"),
        }
    }
}

impl EmitArgs {
    /// Whether the Makefile goes to standard output.
    #[must_use]
    pub fn to_stdout(&self) -> bool {
        self.output.as_str() == STDOUT_PATH
    }
}

/// Available top-level commands for Kumiki.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Generate the Makefile (default).
    Emit(EmitArgs),

    /// List the generated targets, one per line.
    Targets,
}
