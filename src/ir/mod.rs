//! Intermediate Representation of the generated build.
//!
//! This module defines the backend-agnostic rule graph. Projects are
//! translated into [`ProjectFragment`]s by [`ProjectBuilder`] and merged into a
//! [`RuleGraph`] by [`GraphAssembler`]. Serialisation lives in
//! [`crate::make_gen`].
//!
//! # Examples
//!
//! ```
//! use kumiki::ast::Command;
//! use kumiki::ir::{Rule, RuleGraph};
//!
//! let mut graph = RuleGraph::default();
//! graph.rules.insert(
//!     "hello".into(),
//!     Rule::new(["hello.c"], vec![Command::tokens(["cc", "-o", "$@", "hello.c"])]),
//! );
//! graph.default_target = Some("hello".into());
//! ```

mod assemble;
mod cycle;
mod graph;
mod language;
mod project;

pub use assemble::{AssembleError, GraphAssembler};
pub use graph::{GraphError, ProjectFragment, Rule, RuleGraph};
pub use language::{Language, UnknownLanguage};
pub use project::{ProjectBuilder, ProjectError};
