//! ReDoS risk profiling: a heuristic sweep for the two
//! constructs responsible for almost all catastrophic-backtracking
//! reports in the wild — a quantifier repeating another quantifier's
//! match, and an alternation whose branches overlap while sitting inside
//! a repeated group. Neither heuristic proves exponential behavior; both
//! are cheap, sound-enough signals to surface for a human to look at.

use crate::ast::{Node, Span};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RedosRisk {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedosFinding {
    pub risk: RedosRisk,
    pub code: &'static str,
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedosReport {
    pub risk: RedosRisk,
    /// `risk` collapsed onto a 0..=10 scale, for callers that want a single
    /// sortable number rather than the five-way enum.
    pub score: u8,
    /// The span the single riskiest finding points at, if any finding was
    /// raised at all.
    pub vulnerable_part: Option<Span>,
    /// Plain-language mitigation, one per finding code present in
    /// `findings` (deduplicated, in first-seen order).
    pub recommendations: Vec<String>,
    pub findings: Vec<RedosFinding>,
}

fn risk_score(risk: RedosRisk) -> u8 {
    match risk {
        RedosRisk::Safe => 0,
        RedosRisk::Low => 2,
        RedosRisk::Medium => 4,
        RedosRisk::High => 7,
        RedosRisk::Critical => 10,
    }
}

fn recommendation_for(code: &str) -> &'static str {
    match code {
        "nested-repetition" => {
            "rewrite the inner quantifier as a possessive or atomic group so the \
             outer one can't re-try the same text, e.g. `(?>a+)+`"
        }
        "alternation-under-repetition" => {
            "make the alternatives mutually exclusive, or hoist the repetition \
             outside the alternation so branches aren't retried per position"
        }
        _ => "review this construct for catastrophic-backtracking potential",
    }
}

/// Profile `pattern` (the original source text, as written between the
/// delimiters) and its parsed tree for ReDoS risk. `source` is checked
/// against [`Config::redos_ignored_patterns`] first, since that list is a
/// literal-text allowlist rather than a structural one.
pub fn profile(pattern: &Node, source: &str, config: &Config) -> RedosReport {
    if config.redos_ignored_patterns.iter().any(|p| p == source) {
        return RedosReport {
            risk: RedosRisk::Safe,
            score: 0,
            vulnerable_part: None,
            recommendations: Vec::new(),
            findings: Vec::new(),
        };
    }

    let mut findings = Vec::new();
    walk(pattern, false, 0, &mut findings);
    let risk = findings
        .iter()
        .map(|f| f.risk)
        .max()
        .unwrap_or(RedosRisk::Safe);
    let vulnerable_part = findings
        .iter()
        .max_by_key(|f| f.risk)
        .map(|f| f.span);
    let mut recommendations = Vec::new();
    for finding in &findings {
        let rec = recommendation_for(finding.code).to_string();
        if !recommendations.contains(&rec) {
            recommendations.push(rec);
        }
    }
    RedosReport {
        risk,
        score: risk_score(risk),
        vulnerable_part,
        recommendations,
        findings,
    }
}

fn repeats(q: &crate::ast::Quantifier) -> bool {
    q.is_unbounded() || q.max > 1
}

fn walk(node: &Node, under_repetition: bool, repetition_depth: u32, out: &mut Vec<RedosFinding>) {
    match node {
        Node::Regex(r) => walk(&r.pattern, under_repetition, repetition_depth, out),
        Node::Sequence(s) => s
            .children
            .iter()
            .for_each(|c| walk(c, under_repetition, repetition_depth, out)),
        Node::Alternation(a) => {
            if under_repetition && a.alternatives.len() > 1 {
                out.push(RedosFinding {
                    risk: RedosRisk::Medium,
                    code: "alternation-under-repetition",
                    message: "alternation inside a repeated group can force the engine to try \
                              every branch at every position before backtracking"
                        .to_string(),
                    span: a.span,
                });
            }
            a.alternatives
                .iter()
                .for_each(|c| walk(c, under_repetition, repetition_depth, out));
        }
        Node::Quantifier(q) => {
            let this_repeats = repeats(q);
            if this_repeats && under_repetition {
                let risk = if repetition_depth >= 2 {
                    RedosRisk::Critical
                } else {
                    RedosRisk::High
                };
                out.push(RedosFinding {
                    risk,
                    code: "nested-repetition",
                    message: "a quantifier repeating another quantifier's match is the classic \
                              catastrophic-backtracking shape"
                        .to_string(),
                    span: q.span,
                });
            }
            let next_under = under_repetition || this_repeats;
            let next_depth = if this_repeats { repetition_depth + 1 } else { repetition_depth };
            walk(&q.child, next_under, next_depth, out);
        }
        Node::Group(g) => walk(&g.child, under_repetition, repetition_depth, out),
        Node::Conditional(c) => {
            if let crate::ast::ConditionKind::Lookaround(inner) = &c.condition {
                walk(inner, under_repetition, repetition_depth, out);
            }
            walk(&c.yes, under_repetition, repetition_depth, out);
            if let Some(no) = &c.no {
                walk(no, under_repetition, repetition_depth, out);
            }
        }
        Node::Assertion(a) => {
            if let Some(child) = &a.child {
                walk(child, under_repetition, repetition_depth, out);
            }
        }
        Node::Define(d) => walk(&d.content, false, 0, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    fn report_for(body: &str) -> RedosReport {
        let config = Config::default();
        let node = parser::parse_body(body, &config).unwrap();
        profile(&node, body, &config)
    }

    #[test]
    fn plain_literal_is_safe() {
        let r = report_for("hello");
        assert_eq!(r.risk, RedosRisk::Safe);
        assert!(r.findings.is_empty());
    }

    #[test]
    fn nested_unbounded_quantifiers_are_high_risk() {
        let r = report_for("(a+)+");
        assert!(r.findings.iter().any(|f| f.code == "nested-repetition"));
        assert!(r.risk >= RedosRisk::High);
        assert!(r.score >= risk_score(RedosRisk::High));
        // The inner `a+`, the quantifier actually repeating under the
        // outer one, is what the finding's span points at.
        assert_eq!(r.vulnerable_part, Some(Span::new(1, 3)));
        assert!(!r.recommendations.is_empty());
    }

    #[test]
    fn safe_pattern_has_zero_score_and_no_recommendations() {
        let r = report_for("hello");
        assert_eq!(r.score, 0);
        assert!(r.vulnerable_part.is_none());
        assert!(r.recommendations.is_empty());
    }

    #[test]
    fn deeply_nested_quantifiers_escalate_to_critical() {
        let r = report_for("((a+)+)+");
        assert_eq!(r.risk, RedosRisk::Critical);
    }

    #[test]
    fn sibling_quantifiers_are_not_flagged() {
        let r = report_for("a+b+");
        assert!(!r.findings.iter().any(|f| f.code == "nested-repetition"));
    }

    #[test]
    fn alternation_inside_repeated_group_is_medium_risk() {
        let r = report_for("(a|ab)*");
        assert!(r.findings.iter().any(|f| f.code == "alternation-under-repetition"));
    }

    #[test]
    fn ignored_pattern_list_overrides_detection() {
        let config = Config::default().with_redos_ignored_patterns(vec!["(a+)+".to_string()]);
        let node = parser::parse_body("(a+)+", &config).unwrap();
        let r = profile(&node, "(a+)+", &config);
        assert_eq!(r.risk, RedosRisk::Safe);
        assert!(r.findings.is_empty());
    }
}
