//! Structural complexity scoring: a single numeric score plus
//! the counts it was built from, so a caller can reject or flag patterns
//! that are needlessly elaborate without needing to re-walk the tree
//! themselves.

use crate::ast::{ClassExpr, GroupKind, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ComplexityReport {
    pub score: u64,
    pub depth: u32,
    pub atom_count: u32,
    pub group_count: u32,
    pub alternation_count: u32,
    pub quantifier_count: u32,
    pub nested_quantifier_count: u32,
    pub char_class_part_count: u32,
    pub backref_count: u32,
    pub subroutine_count: u32,
    pub assertion_count: u32,
    pub lookaround_count: u32,
}

struct Scorer {
    report: ComplexityReport,
}

/// Score `pattern`'s structural complexity: each atom contributes 1, each
/// group 2, each character-class part 1, each assertion/backreference/
/// subroutine call 2, and each quantifier 3 (doubled when its upper bound
/// is unbounded). Quantifiers nested inside another quantifier compound
/// multiplicatively rather than adding, since that's the shape that
/// actually makes backtracking blow up — `(a+)+` is far worse than `a+b+`
/// even though both have two quantifiers.
pub fn score(pattern: &Node) -> ComplexityReport {
    let mut scorer = Scorer {
        report: ComplexityReport::default(),
    };
    scorer.walk(pattern, 0, 0);
    scorer.report.score = quantifier_score(pattern)
        + u64::from(scorer.report.atom_count)
        + 2 * u64::from(scorer.report.group_count)
        + u64::from(scorer.report.char_class_part_count)
        + 2 * u64::from(scorer.report.assertion_count)
        + 2 * u64::from(scorer.report.backref_count)
        + 2 * u64::from(scorer.report.subroutine_count);
    scorer.report
}

impl Scorer {
    fn walk(&mut self, node: &Node, depth: u32, quantifier_depth: u32) {
        self.report.depth = self.report.depth.max(depth);
        match node {
            Node::Regex(r) => self.walk(&r.pattern, depth, quantifier_depth),
            Node::Sequence(s) => s
                .children
                .iter()
                .for_each(|c| self.walk(c, depth + 1, quantifier_depth)),
            Node::Alternation(a) => {
                self.report.alternation_count += 1;
                a.alternatives
                    .iter()
                    .for_each(|c| self.walk(c, depth + 1, quantifier_depth));
            }
            Node::Quantifier(q) => {
                self.report.quantifier_count += 1;
                if quantifier_depth > 0 {
                    self.report.nested_quantifier_count += 1;
                }
                self.walk(&q.child, depth + 1, quantifier_depth + 1);
            }
            Node::Group(g) => {
                self.report.group_count += 1;
                if matches!(
                    g.kind,
                    GroupKind::LookaheadPositive
                        | GroupKind::LookaheadNegative
                        | GroupKind::LookbehindPositive
                        | GroupKind::LookbehindNegative
                ) {
                    self.report.lookaround_count += 1;
                }
                self.walk(&g.child, depth + 1, quantifier_depth);
            }
            Node::Conditional(c) => {
                self.report.group_count += 1;
                if let crate::ast::ConditionKind::Lookaround(inner) = &c.condition {
                    self.report.lookaround_count += 1;
                    self.walk(inner, depth + 1, quantifier_depth);
                }
                self.walk(&c.yes, depth + 1, quantifier_depth);
                if let Some(no) = &c.no {
                    self.walk(no, depth + 1, quantifier_depth);
                }
            }
            Node::Define(d) => self.walk(&d.content, depth + 1, quantifier_depth),
            Node::Assertion(a) => {
                self.report.assertion_count += 1;
                if let Some(child) = &a.child {
                    self.walk(child, depth + 1, quantifier_depth);
                }
            }
            Node::Backref(_) => self.report.backref_count += 1,
            Node::Subroutine(_) => self.report.subroutine_count += 1,
            Node::CharClass(cc) => {
                self.report.char_class_part_count += count_class_parts(&cc.body);
            }
            Node::Literal(l) => self.report.atom_count += l.value.chars().count() as u32,
            Node::Dot(_)
            | Node::CharType(_)
            | Node::PosixClass(_)
            | Node::UnicodeProp(_)
            | Node::CharLiteral(_)
            | Node::ControlChar(_) => self.report.atom_count += 1,
            _ => {}
        }
    }
}

fn count_class_parts(expr: &ClassExpr) -> u32 {
    match expr {
        ClassExpr::Parts(parts) => parts.len() as u32,
        ClassExpr::Operation { left, right, .. } => count_class_parts(left) + count_class_parts(right),
    }
}

/// Quantifiers nested inside one another multiply their weights together;
/// sibling quantifiers (neither containing the other) just add, the way
/// any other construct does.
fn quantifier_score(node: &Node) -> u64 {
    match node {
        Node::Regex(r) => quantifier_score(&r.pattern),
        Node::Sequence(s) => s.children.iter().map(quantifier_score).sum(),
        Node::Alternation(a) => a.alternatives.iter().map(quantifier_score).sum(),
        Node::Quantifier(q) => {
            let weight = if q.is_unbounded() { 6 } else { 3 };
            let nested = quantifier_score(&q.child);
            if nested > 0 {
                weight * nested
            } else {
                weight
            }
        }
        Node::Group(g) => quantifier_score(&g.child),
        Node::Conditional(c) => {
            let cond = match &c.condition {
                crate::ast::ConditionKind::Lookaround(inner) => quantifier_score(inner),
                _ => 0,
            };
            let no = c.no.as_deref().map(quantifier_score).unwrap_or(0);
            cond + quantifier_score(&c.yes) + no
        }
        Node::Define(d) => quantifier_score(&d.content),
        Node::Assertion(a) => a.child.as_deref().map(quantifier_score).unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::parser;

    fn report_for(body: &str) -> ComplexityReport {
        let node = parser::parse_body(body, &Config::default()).unwrap();
        score(&node)
    }

    #[test]
    fn plain_literal_has_minimal_score() {
        let r = report_for("abc");
        assert_eq!(r.group_count, 0);
        assert_eq!(r.quantifier_count, 0);
    }

    #[test]
    fn nested_quantifiers_are_flagged() {
        let r = report_for("(a+)+");
        assert_eq!(r.quantifier_count, 2);
        assert_eq!(r.nested_quantifier_count, 1);
    }

    #[test]
    fn sibling_quantifiers_are_not_nested() {
        let r = report_for("a+b+");
        assert_eq!(r.quantifier_count, 2);
        assert_eq!(r.nested_quantifier_count, 0);
    }

    #[test]
    fn lookaround_increments_its_counter() {
        let r = report_for("(?=foo)bar");
        assert_eq!(r.lookaround_count, 1);
    }

    #[test]
    fn backreference_increments_its_counter() {
        let r = report_for(r"(a)\1");
        assert_eq!(r.backref_count, 1);
    }

    #[test]
    fn more_complex_pattern_scores_higher_than_simple_one() {
        let simple = report_for("abc");
        let complex = report_for(r"(a+)+b|(?=x)\1");
        assert!(complex.score > simple.score);
    }

    #[test]
    fn literal_chars_are_counted_as_atoms() {
        let r = report_for("abc");
        assert_eq!(r.atom_count, 3);
    }

    #[test]
    fn char_class_parts_are_counted() {
        let r = report_for("[a-z0-9_]");
        assert_eq!(r.char_class_part_count, 3);
    }

    #[test]
    fn nested_quantifiers_compound_multiplicatively_not_additively() {
        let nested = report_for("(a+)+");
        let siblings = report_for("a+b+");
        // Two unbounded quantifiers either way, but nesting must score far
        // higher than two independent ones scored side by side.
        assert_eq!(nested.quantifier_count, siblings.quantifier_count);
        assert!(nested.score > siblings.score * 2);
    }
}
