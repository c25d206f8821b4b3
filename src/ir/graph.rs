//! Rule graph data structures and merge semantics.

use std::collections::{BTreeSet, HashMap};

use miette::Diagnostic;
use thiserror::Error;

use crate::ast::Command;

/// Prerequisites and recipe for a single target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    /// Files or targets that must be up to date first.
    pub prerequisites: BTreeSet<String>,
    /// Recipe lines, in order.
    pub commands: Vec<Command>,
}

impl Rule {
    /// Create a rule from prerequisites and commands.
    #[must_use]
    pub fn new<I, S>(prerequisites: I, commands: Vec<Command>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prerequisites: prerequisites.into_iter().map(Into::into).collect(),
            commands,
        }
    }
}

/// Rules and bookkeeping produced by building a single project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFragment {
    /// Caller-facing project name.
    pub name: String,
    /// Target that builds the project: the alias when one exists, otherwise
    /// the output path.
    pub entry: String,
    /// Rules registered by the project, keyed by target.
    pub rules: HashMap<String, Rule>,
    /// Generated files removed by `make clean`.
    pub outs: BTreeSet<String>,
    /// Targets without a file behind them.
    pub phonys: BTreeSet<String>,
}

impl ProjectFragment {
    /// Register `rule` under `target` unless a rule already exists there.
    ///
    /// Returns `true` when the rule was inserted.
    pub fn insert_if_absent(&mut self, target: &str, rule: Rule) -> bool {
        if self.rules.contains_key(target) {
            return false;
        }
        self.rules.insert(target.to_owned(), rule);
        true
    }
}

/// Errors raised while merging fragments into a [`RuleGraph`].
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// Two different rules were registered for one target.
    #[error("target '{target}' from project '{project}' conflicts with an existing rule")]
    #[diagnostic(
        code(kumiki::graph::rule_conflict),
        help("give the projects distinct output or intermediate directories")
    )]
    RuleConflict {
        /// Target with divergent rules.
        target: String,
        /// Project whose merge was rejected.
        project: String,
    },

    /// The assembled rules depend on themselves.
    #[error("circular dependency detected: {}", .cycle.join(" -> "))]
    #[diagnostic(code(kumiki::graph::circular_dependency))]
    CircularDependency {
        /// Targets forming the cycle, first repeated at the end.
        cycle: Vec<String>,
    },
}

/// Complete mapping from targets to rules plus the Makefile bookkeeping.
///
/// # Examples
///
/// ```
/// use kumiki::ast::Command;
/// use kumiki::ir::{ProjectFragment, Rule, RuleGraph};
///
/// let mut fragment = ProjectFragment {
///     name: "hello".into(),
///     entry: "hello".into(),
///     ..ProjectFragment::default()
/// };
/// fragment.rules.insert("hello".into(), Rule::new(["hello.c"], vec![Command::Literal("cc hello.c".into())]));
///
/// let mut graph = RuleGraph::default();
/// graph.import_projects(vec![fragment]).expect("merge");
/// assert_eq!(graph.default_target.as_deref(), Some("hello"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleGraph {
    /// Rules keyed by target.
    pub rules: HashMap<String, Rule>,
    /// Files removed by the synthesised `clean` rule.
    pub cleans: BTreeSet<String>,
    /// Targets declared `.PHONY`.
    pub phonys: BTreeSet<String>,
    /// Goal built when `make` runs without arguments. Set at most once.
    pub default_target: Option<String>,
}

impl RuleGraph {
    /// Whether a rule exists for `target`.
    #[must_use]
    pub fn contains(&self, target: &str) -> bool {
        self.rules.contains_key(target)
    }

    /// Look up the rule for `target`.
    #[must_use]
    pub fn rule(&self, target: &str) -> Option<&Rule> {
        self.rules.get(target)
    }

    /// Merge a fragment into the graph.
    ///
    /// Identical rules under one target collapse into one. A different rule
    /// under an existing target is rejected and the graph is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::RuleConflict`] when a target would be redefined.
    pub fn merge(&mut self, fragment: ProjectFragment) -> Result<(), GraphError> {
        let mut targets: Vec<&String> = fragment.rules.keys().collect();
        targets.sort();
        for target in targets {
            if let (Some(existing), Some(incoming)) =
                (self.rules.get(target), fragment.rules.get(target))
                && existing != incoming
            {
                return Err(GraphError::RuleConflict {
                    target: target.clone(),
                    project: fragment.name.clone(),
                });
            }
        }

        let ProjectFragment {
            name,
            rules,
            outs,
            phonys,
            ..
        } = fragment;
        tracing::debug!(project = %name, rules = rules.len(), "merging project rules");
        for (target, rule) in rules {
            self.rules.entry(target).or_insert(rule);
        }
        self.cleans.extend(outs);
        self.phonys.extend(phonys);
        Ok(())
    }

    /// Import a batch of project fragments.
    ///
    /// The first call with a non-empty batch makes the first fragment's entry
    /// target the default goal; later imports never change it.
    ///
    /// # Errors
    ///
    /// Propagates the first [`GraphError`] from [`RuleGraph::merge`]. Fragments
    /// before the failing one stay merged.
    pub fn import_projects<I>(&mut self, fragments: I) -> Result<(), GraphError>
    where
        I: IntoIterator<Item = ProjectFragment>,
    {
        for fragment in fragments {
            let entry = fragment.entry.clone();
            self.merge(fragment)?;
            if self.default_target.is_none() {
                self.default_target = Some(entry);
            }
        }
        Ok(())
    }

    /// Reject graphs whose rules depend on themselves.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::CircularDependency`] describing the first cycle.
    pub fn check_cycles(&self) -> Result<(), GraphError> {
        let report = super::cycle::analyse(&self.rules);
        tracing::debug!(
            external = report.external_prerequisites,
            "prerequisites without rules treated as source files",
        );
        report
            .cycle
            .map_or(Ok(()), |cycle| Err(GraphError::CircularDependency { cycle }))
    }
}
