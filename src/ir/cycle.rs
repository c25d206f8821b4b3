//! Cycle detection over the assembled rule graph.
//!
//! Prerequisites without a rule are source files (or otherwise external) and
//! terminate the walk.

use std::collections::HashMap;

use super::Rule;

/// Tracks the visitation state of a node during cycle detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

pub(crate) struct CycleDetectionReport {
    pub(crate) cycle: Option<Vec<String>>,
    pub(crate) external_prerequisites: usize,
}

pub(crate) fn analyse(rules: &HashMap<String, Rule>) -> CycleDetectionReport {
    let mut detector = CycleDetector::new(rules);
    let mut roots: Vec<&String> = rules.keys().collect();
    roots.sort();
    let mut cycle = None;
    for node in roots {
        if detector.is_visited(node) {
            continue;
        }
        if let Some(found) = detector.visit(node) {
            cycle = Some(found);
            break;
        }
    }
    CycleDetectionReport {
        cycle,
        external_prerequisites: detector.external_prerequisites,
    }
}

struct CycleDetector<'a> {
    rules: &'a HashMap<String, Rule>,
    stack: Vec<&'a str>,
    states: HashMap<&'a str, VisitState>,
    external_prerequisites: usize,
}

impl<'a> CycleDetector<'a> {
    fn new(rules: &'a HashMap<String, Rule>) -> Self {
        Self {
            rules,
            stack: Vec::new(),
            states: HashMap::new(),
            external_prerequisites: 0,
        }
    }

    fn is_visited(&self, node: &str) -> bool {
        matches!(self.states.get(node), Some(VisitState::Visited))
    }

    fn visit(&mut self, node: &'a str) -> Option<Vec<String>> {
        match self.states.get(node) {
            Some(VisitState::Visited) => return None,
            Some(VisitState::Visiting) => {
                let idx = self.stack.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> =
                    self.stack.iter().skip(idx).map(|n| (*n).to_owned()).collect();
                cycle.push(node.to_owned());
                return Some(canonicalize_cycle(cycle));
            }
            None => {
                self.states.insert(node, VisitState::Visiting);
            }
        }

        self.stack.push(node);

        let rules = self.rules;
        if let Some(rule) = rules.get(node) {
            for dep in &rule.prerequisites {
                if !rules.contains_key(dep) {
                    self.external_prerequisites += 1;
                    continue;
                }
                if let Some(cycle) = self.visit(dep) {
                    return Some(cycle);
                }
            }
        }

        self.stack.pop();
        self.states.insert(node, VisitState::Visited);
        None
    }
}

/// Rotate a cycle so it starts at its smallest node, keeping the closing
/// repetition in sync.
fn canonicalize_cycle(mut cycle: Vec<String>) -> Vec<String> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        *slot = first;
    }
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(edges: &[(&str, &[&str])]) -> HashMap<String, Rule> {
        edges
            .iter()
            .map(|(target, deps)| ((*target).to_owned(), Rule::new(deps.iter().copied(), Vec::new())))
            .collect()
    }

    #[test]
    fn detects_self_edge() {
        let graph = rules(&[("a", &["a"])]);
        assert_eq!(analyse(&graph).cycle, Some(vec!["a".into(), "a".into()]));
    }

    #[test]
    fn marks_nodes_visited_after_traversal() {
        let graph = rules(&[("a", &["b"]), ("b", &[])]);
        let mut detector = CycleDetector::new(&graph);
        assert!(detector.visit("a").is_none());
        assert!(detector.is_visited("a"));
        assert!(detector.is_visited("b"));
        assert!(detector.stack.is_empty());
    }

    #[test]
    fn counts_external_prerequisites() {
        let graph = rules(&[("app", &["main.o", "libm.a"]), ("main.o", &["main.c"])]);
        let report = analyse(&graph);
        assert!(report.cycle.is_none());
        assert_eq!(report.external_prerequisites, 2);
    }

    #[test]
    fn canonicalize_cycle_rotates_smallest_node() {
        let cycle = vec!["c".into(), "a".into(), "b".into(), "c".into()];
        let expected: Vec<String> = vec!["a".into(), "b".into(), "c".into(), "a".into()];
        assert_eq!(canonicalize_cycle(cycle), expected);
    }
}
