//! Makefile generator.
//!
//! This module converts a [`crate::ir::RuleGraph`] into the text of a POSIX
//! Makefile. The default goal comes first; every other collection is sorted
//! so identical graphs always produce identical files.

use std::fmt::{self, Display, Formatter};

use indexmap::IndexMap;
use itertools::Itertools;

use crate::ast::StringOrList;
use crate::ir::{Rule, RuleGraph};

const HEADER: &str = concat!(
    "#!/usr/bin/env make\n",
    "# Autogenerated by kumiki.\n",
    "MAKEFLAGS+=--no-builtin-rules",
);

/// Everything that ends up in a generated Makefile.
#[derive(Debug, Clone, Copy)]
pub struct Makefile<'a> {
    /// Rules, cleanup and phony sets.
    pub graph: &'a RuleGraph,
    /// Macro assignments.
    pub macros: &'a IndexMap<String, StringOrList>,
    /// Special targets appended after `.PHONY`.
    pub specials: SpecialTargets<'a>,
}

/// Optional special targets. `None` omits a rule; an empty list emits it
/// without prerequisites.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecialTargets<'a> {
    /// Prerequisites of `.SILENT`.
    pub silent: Option<&'a [String]>,
    /// Prerequisites of `.SUFFIXES`.
    pub suffixes: Option<&'a [String]>,
}

/// Render a Makefile as a string.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use kumiki::ast::Command;
/// use kumiki::ir::{Rule, RuleGraph};
/// use kumiki::make_gen::{SpecialTargets, generate};
///
/// let mut graph = RuleGraph::default();
/// graph.rules.insert("hello".into(), Rule::new(["hello.c"], vec![Command::tokens(["cc", "-o", "$@", "hello.c"])]));
/// graph.default_target = Some("hello".into());
///
/// let text = generate(&graph, &IndexMap::new(), SpecialTargets::default());
/// assert!(text.ends_with("hello: hello.c\n\tcc -o $@ hello.c\n"));
/// ```
#[must_use]
pub fn generate(
    graph: &RuleGraph,
    macros: &IndexMap<String, StringOrList>,
    specials: SpecialTargets<'_>,
) -> String {
    Makefile {
        graph,
        macros,
        specials,
    }
    .to_string()
}

impl Display for Makefile<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut blocks = vec![HEADER.to_owned()];
        if !self.macros.is_empty() {
            blocks.push(
                self.macros
                    .iter()
                    .sorted_by(|a, b| a.0.cmp(b.0))
                    .map(|(name, value)| format!("{name}={}", value.joined()))
                    .join("\n"),
            );
        }

        let graph = self.graph;
        for target in ordered_targets(graph) {
            if let Some(rule) = graph.rule(target) {
                blocks.push(DisplayRule::new(target, rule).to_string());
            }
        }

        let mut phonys: Vec<&str> = graph.phonys.iter().map(String::as_str).collect();
        if !graph.cleans.is_empty() {
            let mut recipe = String::from("rm -rf");
            for path in &graph.cleans {
                recipe.push(' ');
                recipe.push_str(path);
            }
            blocks.push(format!("clean:\n\t{recipe}"));
            phonys.push("clean");
        }
        if !phonys.is_empty() {
            phonys.sort_unstable();
            phonys.dedup();
            blocks.push(rule_line(".PHONY", phonys));
        }
        let specials = [
            (".SILENT", self.specials.silent),
            (".SUFFIXES", self.specials.suffixes),
        ];
        for (target, names) in specials {
            if let Some(names) = names {
                blocks.push(rule_line(target, names.iter().map(String::as_str).sorted()));
            }
        }

        writeln!(f, "{}", blocks.join("\n\n"))
    }
}

/// Rule targets in output order: the default goal, then the rest sorted.
///
/// A default goal without a rule is skipped.
#[must_use]
pub fn ordered_targets(graph: &RuleGraph) -> Vec<&str> {
    let first = graph
        .default_target
        .as_deref()
        .filter(|target| graph.contains(target));
    first
        .into_iter()
        .chain(
            graph
                .rules
                .keys()
                .map(String::as_str)
                .filter(|target| Some(*target) != first)
                .sorted(),
        )
        .collect()
}

/// `target: prereqs`, with the trailing space dropped when there are none.
fn rule_line<'p>(target: &str, prerequisites: impl IntoIterator<Item = &'p str>) -> String {
    format!("{target}: {}", prerequisites.into_iter().join(" "))
        .trim_end()
        .to_owned()
}

/// Wrapper struct to display a rule with its target.
struct DisplayRule<'a> {
    target: &'a str,
    rule: &'a Rule,
}

impl<'a> DisplayRule<'a> {
    const fn new(target: &'a str, rule: &'a Rule) -> Self {
        Self { target, rule }
    }
}

impl Display for DisplayRule<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let deps = self.rule.prerequisites.iter().map(String::as_str);
        f.write_str(&rule_line(self.target, deps))?;
        for command in &self.rule.commands {
            write!(f, "\n\t{}", command.render())?;
        }
        Ok(())
    }
}
