//! Aggregation of project fragments into a single rule graph.

use miette::Diagnostic;
use thiserror::Error;
use tracing::info;

use super::{GraphError, ProjectBuilder, ProjectError, RuleGraph};
use crate::ast::ProjectDecl;
use crate::headers::HeaderResolver;

/// Errors raised while assembling the graph.
#[derive(Debug, Error, Diagnostic)]
pub enum AssembleError {
    /// A project declaration could not be translated.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Project(#[from] ProjectError),
    /// A fragment could not be merged, or the result is cyclic.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Graph(#[from] GraphError),
}

/// Owns the shared [`RuleGraph`] and feeds projects into it one at a time.
///
/// Each project is built against the graph assembled so far, so an
/// intermediate object shared by several projects is registered once.
///
/// # Examples
///
/// ```
/// use kumiki::ast::ProjectDecl;
/// use kumiki::headers::HeaderResolver;
/// use kumiki::ir::GraphAssembler;
///
/// let headers = HeaderResolver::new(".");
/// let mut assembler = GraphAssembler::new(&headers);
/// assembler.add_project(&ProjectDecl::new("docs", Vec::<String>::new())).expect("custom project");
/// let graph = assembler.finish().expect("acyclic");
/// assert_eq!(graph.default_target.as_deref(), Some("docs"));
/// ```
#[derive(Debug)]
pub struct GraphAssembler<'a> {
    builder: ProjectBuilder<'a>,
    graph: RuleGraph,
}

impl<'a> GraphAssembler<'a> {
    /// Start from an empty graph.
    #[must_use]
    pub fn new(headers: &'a HeaderResolver) -> Self {
        Self::with_graph(headers, RuleGraph::default())
    }

    /// Continue assembling on top of an existing graph.
    #[must_use]
    pub const fn with_graph(headers: &'a HeaderResolver, graph: RuleGraph) -> Self {
        Self {
            builder: ProjectBuilder::new(headers),
            graph,
        }
    }

    /// The graph assembled so far.
    #[must_use]
    pub const fn graph(&self) -> &RuleGraph {
        &self.graph
    }

    /// Build `decl` and merge it.
    ///
    /// # Errors
    ///
    /// Returns an [`AssembleError`] when the project is invalid or its rules
    /// conflict with earlier ones. The graph is unchanged in either case.
    pub fn add_project(&mut self, decl: &ProjectDecl) -> Result<(), AssembleError> {
        let fragment = self.builder.build(decl, &self.graph)?;
        self.graph.import_projects([fragment])?;
        Ok(())
    }

    /// Build and merge every project in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// See [`GraphAssembler::add_project`].
    pub fn add_projects<'d, I>(&mut self, decls: I) -> Result<(), AssembleError>
    where
        I: IntoIterator<Item = &'d ProjectDecl>,
    {
        for decl in decls {
            self.add_project(decl)?;
        }
        Ok(())
    }

    /// Validate the graph and return it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CircularDependency`] when rules depend on
    /// themselves.
    pub fn finish(self) -> Result<RuleGraph, AssembleError> {
        self.graph.check_cycles()?;
        info!(
            targets = self.graph.rules.len(),
            cleans = self.graph.cleans.len(),
            "assembled rule graph"
        );
        Ok(self.graph)
    }
}
