//! Grammar and cross-reference validation over an already-parsed tree.
//! Syntax errors are caught by the parser; this module
//! catches the errors that only become visible once the whole tree and
//! its [`GroupNumbering`] are available: dangling backreferences, bad
//! quantifier ranges, and lookbehinds PCRE itself would refuse to
//! compile because their matched length isn't bounded tightly enough.

use crate::ast::*;
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub span: Span,
    /// A mechanically-derived fix, populated only for the handful of
    /// problems where one can be proposed with confidence (a misspelled
    /// verb name, a duplicate group name missing the `J` flag).
    pub suggestion: Option<String>,
}

impl Problem {
    fn new(severity: Severity, code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Problem {
            severity,
            code,
            message: message.into(),
            span,
            suggestion: None,
        }
    }

    fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

const KNOWN_VERBS: &[&str] = &[
    "ACCEPT", "FAIL", "F", "MARK", "COMMIT", "PRUNE", "SKIP", "THEN",
];

/// Validate `pattern` against the capture numbering already computed for
/// it, returning every problem found (empty if the pattern is clean).
pub fn validate(pattern: &Node, numbering: &GroupNumbering, config: &Config) -> Vec<Problem> {
    let mut problems = Vec::new();
    walk(pattern, numbering, config, &mut problems);
    check_duplicate_names(pattern, numbering, &mut problems);
    problems
}

fn pattern_flags(pattern: &Node) -> Flags {
    match pattern {
        Node::Regex(r) => r.flags,
        _ => Flags::default(),
    }
}

fn check_duplicate_names(pattern: &Node, numbering: &GroupNumbering, out: &mut Vec<Problem>) {
    if pattern_flags(pattern).j {
        return;
    }
    for (name, occurrences) in &numbering.named_groups {
        if occurrences.len() > 1 {
            out.push(
                Problem::new(
                    Severity::Warning,
                    "duplicate-group-name",
                    format!("group name '{name}' is used {} times", occurrences.len()),
                    Span::point(0),
                )
                .with_suggestion("set the J flag to allow duplicate group names, or rename one of the groups"),
            );
        }
    }
}

/// Levenshtein distance, used only to suggest a fix for a misspelled verb
/// name against the small, fixed [`KNOWN_VERBS`] table.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut prev_diag = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let temp = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev_diag
            } else {
                1 + prev_diag.min(row[j]).min(row[j - 1])
            };
            prev_diag = temp;
        }
    }
    row[b.len()]
}

fn walk(node: &Node, numbering: &GroupNumbering, config: &Config, out: &mut Vec<Problem>) {
    match node {
        Node::Regex(r) => walk(&r.pattern, numbering, config, out),
        Node::Sequence(s) => s.children.iter().for_each(|c| walk(c, numbering, config, out)),
        Node::Alternation(a) => a
            .alternatives
            .iter()
            .for_each(|c| walk(c, numbering, config, out)),
        Node::Quantifier(q) => {
            check_quantifier(q, out);
            walk(&q.child, numbering, config, out);
        }
        Node::Assertion(a) => {
            if let Some(child) = &a.child {
                walk(child, numbering, config, out);
            }
        }
        Node::Backref(b) => check_backref(b, numbering, out),
        Node::Subroutine(s) => check_subroutine(s, numbering, out),
        Node::PcreVerb(v) => check_verb(v, out),
        Node::Group(g) => {
            check_group(g, numbering, config, out);
            walk(&g.child, numbering, config, out);
        }
        Node::Conditional(c) => {
            check_conditional(c, numbering, out);
            if let ConditionKind::Lookaround(inner) = &c.condition {
                walk(inner, numbering, config, out);
            }
            walk(&c.yes, numbering, config, out);
            if let Some(no) = &c.no {
                walk(no, numbering, config, out);
            }
        }
        Node::Define(d) => walk(&d.content, numbering, config, out),
        Node::CharClass(cc) => check_char_class(cc, out),
        _ => {}
    }
}

fn check_quantifier(q: &Quantifier, out: &mut Vec<Problem>) {
    if !q.is_unbounded() && q.max < q.min {
        out.push(Problem::new(
            Severity::Error,
            "quantifier-range",
            format!("quantifier upper bound {} is less than lower bound {}", q.max, q.min),
            q.span,
        ));
    }
    if q.min < 0 {
        out.push(Problem::new(
            Severity::Error,
            "quantifier-range",
            "quantifier lower bound cannot be negative".to_string(),
            q.span,
        ));
    }
}

fn check_backref(b: &Backref, numbering: &GroupNumbering, out: &mut Vec<Problem>) {
    match &b.reference {
        BackrefRef::Index(n) => {
            if *n <= 0 || *n as usize > numbering.max_group_number {
                out.push(Problem::new(
                    Severity::Error,
                    "unknown-group-reference",
                    format!("backreference to non-existent group {n}"),
                    b.span,
                ));
            }
        }
        BackrefRef::Name(name) => {
            if !numbering.named_groups.contains_key(name) {
                out.push(Problem::new(
                    Severity::Error,
                    "unknown-group-reference",
                    format!("backreference to non-existent named group '{name}'"),
                    b.span,
                ));
            }
        }
    }
}

fn check_subroutine(s: &Subroutine, numbering: &GroupNumbering, out: &mut Vec<Problem>) {
    match &s.reference {
        SubroutineRef::Index(n) => {
            if *n != 0 && (*n < 0 || *n as usize > numbering.max_group_number) {
                out.push(Problem::new(
                    Severity::Error,
                    "unknown-group-reference",
                    format!("subroutine call to non-existent group {n}"),
                    s.span,
                ));
            }
        }
        SubroutineRef::Name(name) => {
            if !numbering.named_groups.contains_key(name) {
                out.push(Problem::new(
                    Severity::Error,
                    "unknown-group-reference",
                    format!("subroutine call to non-existent named group '{name}'"),
                    s.span,
                ));
            }
        }
        SubroutineRef::WholePattern => {}
    }
}

fn check_conditional(c: &Conditional, numbering: &GroupNumbering, out: &mut Vec<Problem>) {
    match &c.condition {
        ConditionKind::GroupIndex(n) => {
            if *n <= 0 || *n as usize > numbering.max_group_number {
                out.push(Problem::new(
                    Severity::Error,
                    "unknown-group-reference",
                    format!("conditional tests non-existent group {n}"),
                    c.span,
                ));
            }
        }
        ConditionKind::GroupName(name) => {
            if !numbering.named_groups.contains_key(name) {
                out.push(Problem::new(
                    Severity::Error,
                    "unknown-group-reference",
                    format!("conditional tests non-existent named group '{name}'"),
                    c.span,
                ));
            }
        }
        ConditionKind::Recursion(_) | ConditionKind::Define | ConditionKind::Lookaround(_) => {}
    }
}

fn check_verb(v: &PcreVerb, out: &mut Vec<Problem>) {
    if KNOWN_VERBS.contains(&v.name()) {
        return;
    }
    let mut problem = Problem::new(
        Severity::Warning,
        "unknown-verb",
        format!("'(*{})' is not a recognized PCRE verb", v.name()),
        v.span,
    );
    if let Some(closest) = KNOWN_VERBS
        .iter()
        .map(|known| (*known, edit_distance(v.name(), known)))
        .filter(|(_, dist)| *dist <= 2)
        .min_by_key(|(_, dist)| *dist)
    {
        problem = problem.with_suggestion(format!("did you mean '(*{})'?", closest.0));
    }
    out.push(problem);
}

fn check_group(g: &Group, _numbering: &GroupNumbering, config: &Config, out: &mut Vec<Problem>) {
    if matches!(g.kind, GroupKind::InlineFlags | GroupKind::ModifierSpan) {
        if let Some(flags) = &g.flags {
            for ch in flags.set.chars() {
                if flags.unset.contains(ch) {
                    out.push(Problem::new(
                        Severity::Error,
                        "conflicting-inline-flags",
                        format!("flag '{ch}' is both set and unset in the same group"),
                        g.span,
                    ));
                }
            }
        }
    }
    if matches!(g.kind, GroupKind::LookbehindPositive | GroupKind::LookbehindNegative) {
        let (_, max) = match_length(&g.child);
        match max {
            Some(len) if len > config.max_lookbehind_length => {
                out.push(Problem::new(
                    Severity::Error,
                    "lookbehind-too-long",
                    format!(
                        "lookbehind can match up to {len} characters, exceeding max_lookbehind_length ({})",
                        config.max_lookbehind_length
                    ),
                    g.span,
                ));
            }
            None => {
                out.push(Problem::new(
                    Severity::Error,
                    "lookbehind-unbounded",
                    "lookbehind does not have a bounded maximum length".to_string(),
                    g.span,
                ));
            }
            _ => {}
        }
    }
}

fn check_char_class(cc: &CharClass, out: &mut Vec<Problem>) {
    walk_class_expr(&cc.body, out);
}

fn walk_class_expr(expr: &ClassExpr, out: &mut Vec<Problem>) {
    match expr {
        ClassExpr::Parts(parts) => {
            for part in parts {
                if let ClassPart::Range(r) = part {
                    if let (Some(a), Some(b)) = (r.start.single_codepoint(), r.end.single_codepoint()) {
                        if a > b {
                            out.push(Problem::new(
                                Severity::Error,
                                "reversed-char-range",
                                format!("character range is reversed (start {a:#x} > end {b:#x})"),
                                r.span,
                            ));
                        }
                    }
                }
            }
        }
        ClassExpr::Operation { left, right, .. } => {
            walk_class_expr(left, out);
            walk_class_expr(right, out);
        }
    }
}

/// A conservative `(min, max)` matched-length estimate; `max = None`
/// means unbounded. Backreferences and subroutine calls are treated as
/// unbounded since their length depends on what was actually captured.
fn match_length(node: &Node) -> (usize, Option<usize>) {
    match node {
        Node::Literal(l) => {
            let n = l.value.chars().count();
            (n, Some(n))
        }
        Node::Dot(_)
        | Node::CharType(_)
        | Node::CharClass(_)
        | Node::PosixClass(_)
        | Node::UnicodeProp(_)
        | Node::CharLiteral(_)
        | Node::ControlChar(_) => (1, Some(1)),
        Node::Anchor(_)
        | Node::Assertion(_)
        | Node::Keep(_)
        | Node::Comment(_)
        | Node::PcreVerb(_)
        | Node::Callout(_)
        | Node::Define(_) => (0, Some(0)),
        Node::Backref(_) | Node::Subroutine(_) => (0, None),
        Node::Sequence(s) => s.children.iter().fold((0, Some(0)), |acc, c| {
            combine_sequential(acc, match_length(c))
        }),
        Node::Alternation(a) => a
            .alternatives
            .iter()
            .map(match_length)
            .reduce(combine_choice)
            .unwrap_or((0, Some(0))),
        Node::Group(g) => match g.kind {
            GroupKind::LookaheadPositive
            | GroupKind::LookaheadNegative
            | GroupKind::LookbehindPositive
            | GroupKind::LookbehindNegative
            | GroupKind::InlineFlags => (0, Some(0)),
            _ => match_length(&g.child),
        },
        Node::Conditional(c) => {
            let yes = match_length(&c.yes);
            let no = c.no.as_deref().map(match_length).unwrap_or((0, Some(0)));
            combine_choice(yes, no)
        }
        Node::Quantifier(q) => {
            let (cmin, cmax) = match_length(&q.child);
            let min = cmin * (q.min.max(0) as usize);
            let max = if q.is_unbounded() {
                None
            } else {
                cmax.map(|m| m * (q.max.max(0) as usize))
            };
            (min, max)
        }
        Node::Regex(r) => match_length(&r.pattern),
    }
}

fn combine_sequential(a: (usize, Option<usize>), b: (usize, Option<usize>)) -> (usize, Option<usize>) {
    let min = a.0 + b.0;
    let max = match (a.1, b.1) {
        (Some(x), Some(y)) => Some(x + y),
        _ => None,
    };
    (min, max)
}

fn combine_choice(a: (usize, Option<usize>), b: (usize, Option<usize>)) -> (usize, Option<usize>) {
    let min = a.0.min(b.0);
    let max = match (a.1, b.1) {
        (Some(x), Some(y)) => Some(x.max(y)),
        _ => None,
    };
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{numbering, parser};

    fn problems_for(body: &str) -> Vec<Problem> {
        let config = Config::default();
        let node = parser::parse_body(body, &config).unwrap();
        let numbering = numbering::collect(&node);
        validate(&node, &numbering, &config)
    }

    #[test]
    fn clean_pattern_has_no_problems() {
        assert!(problems_for(r"(\d+)-\1").is_empty());
    }

    #[test]
    fn dangling_numeric_backref_is_an_error() {
        let problems = problems_for(r"\1");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].severity, Severity::Error);
        assert_eq!(problems[0].code, "unknown-group-reference");
    }

    #[test]
    fn dangling_named_backref_is_an_error() {
        let problems = problems_for(r"\k<missing>");
        assert_eq!(problems[0].code, "unknown-group-reference");
    }

    #[test]
    fn reversed_quantifier_range_is_an_error() {
        let problems = problems_for("a{5,2}");
        assert!(problems.iter().any(|p| p.code == "quantifier-range"));
    }

    #[test]
    fn unknown_pcre_verb_is_a_warning() {
        let problems = problems_for("(*NOTAVERB)");
        assert_eq!(problems[0].severity, Severity::Warning);
        assert_eq!(problems[0].code, "unknown-verb");
    }

    #[test]
    fn unbounded_lookbehind_is_an_error() {
        let problems = problems_for(r"(?<=a*)b");
        assert!(problems.iter().any(|p| p.code == "lookbehind-unbounded"));
    }

    #[test]
    fn lookbehind_exceeding_max_length_is_an_error() {
        let config = Config::default().with_max_lookbehind_length(2);
        let node = parser::parse_body(r"(?<=abc)x", &config).unwrap();
        let numbering = numbering::collect(&node);
        let problems = validate(&node, &numbering, &config);
        assert!(problems.iter().any(|p| p.code == "lookbehind-too-long"));
    }

    #[test]
    fn reversed_char_range_is_an_error() {
        let problems = problems_for("[z-a]");
        assert!(problems.iter().any(|p| p.code == "reversed-char-range"));
    }

    #[test]
    fn misspelled_verb_gets_a_suggestion() {
        let problems = problems_for("(*FAILL)");
        let p = problems.iter().find(|p| p.code == "unknown-verb").unwrap();
        assert_eq!(p.suggestion.as_deref(), Some("did you mean '(*FAIL)'?"));
    }

    #[test]
    fn conflicting_inline_flags_are_an_error() {
        let problems = problems_for("(?i-i:a)");
        let p = problems.iter().find(|p| p.code == "conflicting-inline-flags").unwrap();
        assert_eq!(p.severity, Severity::Error);
    }

    #[test]
    fn non_conflicting_inline_flags_are_clean() {
        let problems = problems_for("(?i-s:a)");
        assert!(!problems.iter().any(|p| p.code == "conflicting-inline-flags"));
    }

    #[test]
    fn duplicate_group_names_without_j_flag_are_a_warning() {
        let problems = problems_for("(?<x>a)(?<x>b)");
        let p = problems.iter().find(|p| p.code == "duplicate-group-name").unwrap();
        assert_eq!(p.severity, Severity::Warning);
        assert!(p.suggestion.is_some());
    }
}
