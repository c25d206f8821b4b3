//! Test utilities for Kumiki.
//!
//! This crate provides fake compilers for probe tests and temporary source
//! trees for header scanning and end-to-end Makefile generation.

pub mod exec;
pub mod tree;

pub use exec::{FakeCompiler, make_executable, write_exec};
pub use tree::SourceTree;
