//! Kumiki core library.
//!
//! Kumiki reads a YAML `Kumikifile` describing C and C++ projects and writes
//! a Makefile for them. The pipeline is:
//!
//! 1. [`manifest`] parses the YAML into the [`ast`] types.
//! 2. [`configure`] picks the compilers and filters flags through
//!    [`probe::FlagProbe`].
//! 3. [`ir::GraphAssembler`] turns each project into rules, scanning sources
//!    with [`headers::HeaderResolver`].
//! 4. [`make_gen`] serialises the resulting [`ir::RuleGraph`].
//!
//! [`runner`] wires these stages to the [`cli`].

pub mod ast;
pub mod cli;
pub mod configure;
pub mod headers;
pub mod ir;
pub mod make_gen;
pub mod manifest;
pub mod probe;
pub mod runner;
