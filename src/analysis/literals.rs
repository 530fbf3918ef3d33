//! Literal prefix/suffix extraction: fold the tree down to the
//! [`LiteralSet`] algebra already defined on the AST, so a caller can pull
//! a literal prefix out of a pattern for fast-path substring pre-filtering
//! without running the regex engine at all.

use crate::ast::{GroupKind, LiteralSet, Node};

/// Compute the [`LiteralSet`] of literal text `pattern` is guaranteed to
/// start and end with.
pub fn extract(pattern: &Node) -> LiteralSet {
    walk(pattern)
}

fn walk(node: &Node) -> LiteralSet {
    match node {
        Node::Regex(r) => walk(&r.pattern),
        Node::Literal(l) => LiteralSet::from_string(l.value.clone()),
        Node::Sequence(s) => sequence_literals(&s.children),
        Node::Alternation(a) => a
            .alternatives
            .iter()
            .map(walk)
            .reduce(|acc, next| LiteralSet::unite(&acc, &next))
            .unwrap_or_else(LiteralSet::empty),
        Node::Group(g) => match g.kind {
            GroupKind::LookaheadPositive
            | GroupKind::LookaheadNegative
            | GroupKind::LookbehindPositive
            | GroupKind::LookbehindNegative
            | GroupKind::InlineFlags => LiteralSet::from_string(""),
            _ => walk(&g.child),
        },
        Node::Conditional(c) => {
            let yes = walk(&c.yes);
            let no = c.no.as_deref().map(walk).unwrap_or_else(|| LiteralSet::from_string(""));
            LiteralSet::unite(&yes, &no)
        }
        Node::Quantifier(q) => {
            let inner = walk(&q.child);
            if q.min == 0 {
                LiteralSet::empty()
            } else if q.min == 1 && q.max == 1 {
                inner
            } else {
                // Repeated more than once: only the first copy's prefix and
                // the last copy's suffix survive, so the literal is no
                // longer guaranteed complete across the whole span.
                LiteralSet {
                    prefixes: inner.prefixes.clone(),
                    suffixes: inner.suffixes.clone(),
                    complete: false,
                }
            }
        }
        // Assertions, anchors, comments and verbs are zero-width and
        // contribute no text; everything else (dot, char classes, escapes,
        // backreferences, subroutine calls) isn't a fixed literal.
        Node::Anchor(_) | Node::Assertion(_) | Node::Comment(_) | Node::PcreVerb(_) | Node::Keep(_) | Node::Callout(_) => {
            LiteralSet::from_string("")
        }
        Node::Define(_) => LiteralSet::from_string(""),
        Node::Dot(_)
        | Node::CharType(_)
        | Node::CharClass(_)
        | Node::PosixClass(_)
        | Node::UnicodeProp(_)
        | Node::CharLiteral(_)
        | Node::ControlChar(_)
        | Node::Backref(_)
        | Node::Subroutine(_) => LiteralSet::empty(),
    }
}

/// Compose a sequence's children into one [`LiteralSet`], but stop folding
/// each side as soon as it crosses a genuine branch point (a child whose
/// own prefix or suffix set already has more than one member, e.g. an
/// alternation). Past that point the branches haven't converged back to a
/// single string, so absorbing any further sibling into the cross product
/// would silently merge per-branch literals that don't actually share a
/// common continuation.
fn sequence_literals(children: &[Node]) -> LiteralSet {
    let sets: Vec<LiteralSet> = children.iter().map(walk).collect();
    let (prefixes, prefix_complete) = fold_prefixes(&sets);
    let (suffixes, suffix_complete) = fold_suffixes(&sets);
    LiteralSet {
        prefixes,
        suffixes,
        complete: prefix_complete && suffix_complete,
    }
}

fn fold_prefixes(sets: &[LiteralSet]) -> (Vec<String>, bool) {
    let mut acc = LiteralSet::from_string("");
    for set in sets {
        let at_branch_point = set.prefixes.len() > 1;
        acc = LiteralSet::concat(&acc, set);
        if at_branch_point {
            break;
        }
    }
    (acc.prefixes, acc.complete)
}

fn fold_suffixes(sets: &[LiteralSet]) -> (Vec<String>, bool) {
    let mut acc = LiteralSet::from_string("");
    for set in sets.iter().rev() {
        let at_branch_point = set.suffixes.len() > 1;
        acc = LiteralSet::concat(set, &acc);
        if at_branch_point {
            break;
        }
    }
    (acc.suffixes, acc.complete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::parser;

    fn literals_of(body: &str) -> LiteralSet {
        let node = parser::parse_body(body, &Config::default()).unwrap();
        extract(&node)
    }

    #[test]
    fn plain_literal_is_complete() {
        let set = literals_of("hello");
        assert_eq!(set.prefixes, vec!["hello"]);
        assert_eq!(set.suffixes, vec!["hello"]);
        assert!(set.complete);
    }

    #[test]
    fn dot_breaks_completeness_between_literals() {
        let set = literals_of("foo.bar");
        assert_eq!(set.prefixes, vec!["foo"]);
        assert_eq!(set.suffixes, vec!["bar"]);
        assert!(!set.complete);
    }

    #[test]
    fn alternation_unites_both_branches() {
        let set = literals_of("cat|dog");
        assert_eq!(set.prefixes, vec!["cat", "dog"]);
        assert_eq!(set.suffixes, vec!["cat", "dog"]);
    }

    #[test]
    fn optional_literal_voids_the_set() {
        let set = literals_of("abc?");
        // `ab` is definite, `c?` is optional: prefix survives, the
        // optional atom does not extend suffix completeness.
        assert!(set.prefixes.contains(&"ab".to_string()) || set.prefixes.contains(&"abc".to_string()));
    }

    #[test]
    fn lookahead_contributes_no_text() {
        let set = literals_of("foo(?=bar)");
        assert_eq!(set.prefixes, vec!["foo"]);
    }

    #[test]
    fn alternation_inside_sequence_freezes_at_the_branch_point() {
        let set = literals_of("foo(bar|baz)qux");
        assert_eq!(set.prefixes, vec!["foobar", "foobaz"]);
        assert_eq!(set.suffixes, vec!["barqux", "bazqux"]);
        assert!(set.complete);
    }

    #[test]
    fn anchors_do_not_affect_literal_text() {
        let set = literals_of("^abc$");
        assert_eq!(set.prefixes, vec!["abc"]);
        assert_eq!(set.suffixes, vec!["abc"]);
        assert!(set.complete);
    }
}
