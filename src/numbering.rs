//! Branch-reset-aware capture numbering.
//!
//! PCRE numbers capturing groups left to right in a pre-order walk, except
//! inside a `(?|...)` branch-reset group: every alternative restarts
//! numbering from the count in effect when the group opened, and the
//! group's contribution to the running total afterwards is the highest
//! number any alternative reached.

use crate::ast::{GroupKind, GroupNumbering, Node};

struct Collector {
    next_number: usize,
    numbering: GroupNumbering,
}

/// Walk `pattern` and compute the [`GroupNumbering`] PCRE would assign.
pub fn collect(pattern: &Node) -> GroupNumbering {
    let mut collector = Collector {
        next_number: 1,
        numbering: GroupNumbering::default(),
    };
    collector.walk(pattern);
    collector.numbering.max_group_number = collector.next_number.saturating_sub(1);
    collector.numbering
}

impl Collector {
    fn walk(&mut self, node: &Node) {
        match node {
            Node::Group(g) => self.walk_group(g),
            Node::Regex(r) => self.walk(&r.pattern),
            Node::Sequence(s) => s.children.iter().for_each(|c| self.walk(c)),
            Node::Alternation(a) => a.alternatives.iter().for_each(|c| self.walk(c)),
            Node::Quantifier(q) => self.walk(&q.child),
            Node::Assertion(a) => {
                if let Some(child) = &a.child {
                    self.walk(child);
                }
            }
            Node::Conditional(c) => {
                if let crate::ast::ConditionKind::Lookaround(inner) = &c.condition {
                    self.walk(inner);
                }
                self.walk(&c.yes);
                if let Some(no) = &c.no {
                    self.walk(no);
                }
            }
            Node::Define(d) => self.walk(&d.content),
            _ => {}
        }
    }

    fn walk_group(&mut self, g: &crate::ast::Group) {
        if g.kind == GroupKind::BranchReset {
            self.walk_branch_reset(g);
            return;
        }

        let number = self.assign_number_if_capturing(g);
        self.walk(&g.child);
        if let (Some(n), Some(name)) = (number, &g.name) {
            self.numbering
                .named_groups
                .entry(name.clone())
                .or_default()
                .push(n);
        }
    }

    /// Each top-level alternative of a branch-reset group starts numbering
    /// from the same value; the group's exit value is the highest any
    /// alternative reached.
    fn walk_branch_reset(&mut self, g: &crate::ast::Group) {
        let reset_point = self.next_number;
        let mut high_water = reset_point;

        let alternatives: Vec<&Node> = match g.child.as_ref() {
            Node::Alternation(a) => a.alternatives.iter().collect(),
            other => vec![other],
        };

        for alt in alternatives {
            self.next_number = reset_point;
            self.walk(alt);
            high_water = high_water.max(self.next_number);
        }

        self.next_number = high_water;
    }

    fn assign_number_if_capturing(&mut self, g: &crate::ast::Group) -> Option<usize> {
        match g.kind {
            GroupKind::Capturing | GroupKind::Named => {
                let n = self.next_number;
                self.next_number += 1;
                self.numbering.capture_sequence.push(n);
                Some(n)
            }
            _ => None,
        }
    }
}
