//! The typed PCRE syntax tree, plus the two small value types derived from
//! it: [`GroupNumbering`] and [`LiteralSet`].
//!
//! Every node carries a [`Span`] (`[start, end)` byte offsets into the
//! pattern body). The node set is a closed sum, represented as one
//! `#[serde(tag = "type")]` enum over small payload structs, so any node is
//! independently serializable for the layer-2 cache payload or a
//! downstream collaborator.
//!
//! Nodes are built once by the parser and never mutated afterwards;
//! transformations (none live in this crate) would produce new trees.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A half-open `[start, end)` byte range into the pattern body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Span { start, end }
    }

    pub fn point(at: usize) -> Self {
        Span { start: at, end: at }
    }

    /// The smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Regex flags parsed from the trailing flag string (`imsxADSUXJunr`, the
/// exact allowed alphabet is a [`crate::config::Config`] concern).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Flags {
    pub i: bool,
    pub m: bool,
    pub s: bool,
    pub x: bool,
    pub a: bool,
    pub d: bool,
    pub u: bool,
    pub big_u: bool,
    pub j: bool,
    pub n: bool,
    pub r: bool,
}

impl Flags {
    pub fn from_letters(letters: &str) -> Self {
        let mut f = Flags::default();
        for ch in letters.chars() {
            match ch {
                'i' => f.i = true,
                'm' => f.m = true,
                's' => f.s = true,
                'x' => f.x = true,
                'A' => f.a = true,
                'D' => f.d = true,
                'u' => f.u = true,
                'U' => f.big_u = true,
                'J' => f.j = true,
                'n' => f.n = true,
                'r' => f.r = true,
                _ => {}
            }
        }
        f
    }
}

/// The closed set of AST node kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Regex(Regex),
    Sequence(Sequence),
    Alternation(Alternation),
    Literal(Literal),
    Dot(Dot),
    Anchor(Anchor),
    Assertion(Assertion),
    CharType(CharType),
    CharClass(CharClass),
    PosixClass(PosixClass),
    UnicodeProp(UnicodeProp),
    CharLiteral(CharLiteral),
    ControlChar(ControlChar),
    Backref(Backref),
    Subroutine(Subroutine),
    Group(Group),
    Conditional(Conditional),
    Define(Define),
    Quantifier(Quantifier),
    Comment(Comment),
    PcreVerb(PcreVerb),
    Keep(Keep),
    Callout(Callout),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Regex(n) => n.span,
            Node::Sequence(n) => n.span,
            Node::Alternation(n) => n.span,
            Node::Literal(n) => n.span,
            Node::Dot(n) => n.span,
            Node::Anchor(n) => n.span,
            Node::Assertion(n) => n.span,
            Node::CharType(n) => n.span,
            Node::CharClass(n) => n.span,
            Node::PosixClass(n) => n.span,
            Node::UnicodeProp(n) => n.span,
            Node::CharLiteral(n) => n.span,
            Node::ControlChar(n) => n.span,
            Node::Backref(n) => n.span,
            Node::Subroutine(n) => n.span,
            Node::Group(n) => n.span,
            Node::Conditional(n) => n.span,
            Node::Define(n) => n.span,
            Node::Quantifier(n) => n.span,
            Node::Comment(n) => n.span,
            Node::PcreVerb(n) => n.span,
            Node::Keep(n) => n.span,
            Node::Callout(n) => n.span,
        }
    }

    /// True for an epsilon literal: an empty `Literal("")`.
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Node::Literal(l) if l.value.is_empty())
    }

    /// Construct a literal spanning `[start, end)` with `value`.
    pub fn literal(value: impl Into<String>, span: Span) -> Node {
        Node::Literal(Literal {
            value: value.into(),
            span,
        })
    }

    /// Wrap `children` into a Sequence, collapsing to the single child (or
    /// an epsilon literal) per the invariant that a Sequence always has >=2
    /// children.
    pub fn sequence(children: Vec<Node>, span: Span) -> Node {
        match children.len() {
            0 => Node::literal("", span),
            1 => children.into_iter().next().unwrap(),
            _ => Node::Sequence(Sequence { children, span }),
        }
    }

    /// Wrap `alternatives` into an Alternation, collapsing to the single
    /// alternative when there is only one.
    pub fn alternation(alternatives: Vec<Node>, span: Span) -> Node {
        if alternatives.len() == 1 {
            alternatives.into_iter().next().unwrap()
        } else {
            Node::Alternation(Alternation { alternatives, span })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regex {
    pub pattern: Box<Node>,
    pub flags: Flags,
    pub delimiter: char,
    pub length: usize,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub children: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternation {
    pub alternatives: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dot {
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnchorKind {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    pub at: AnchorKind,
    pub span: Span,
}

/// `\A \z \Z \G \b \B` and `(?(DEFINE)...)`'s condition marker. A lookaround
/// is represented by [`Group`]'s `GroupKind`, not by this node; `child` here
/// is reserved for the rare case an assertion wraps a sub-expression (none
/// of the closed grammar productions currently populate it, but the slot
/// exists for completeness).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssertionKind {
    A,
    Z,
    BigZ,
    G,
    B,
    BigB,
    Define,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub kind: AssertionKind,
    pub child: Option<Box<Node>>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharTypeKind {
    D,
    BigD,
    S,
    BigS,
    W,
    BigW,
    H,
    V,
    R,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharType {
    pub kind: CharTypeKind,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharLiteralKind {
    Unicode,
    UnicodeNamed,
    Octal,
    OctalLegacy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharLiteral {
    pub representation: String,
    pub code_point: u32,
    pub kind: CharLiteralKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlChar {
    pub ch: char,
    pub code_point: u32,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosixClass {
    pub name: String,
    pub negated: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnicodeProp {
    pub name: String,
    pub braced: bool,
    pub negated: bool,
    pub span: Span,
}

/// A range endpoint: one of the node kinds permitted as a Range's
/// `start`/`end` (single-codepoint-yielding parts only — never a Range
/// itself, never a nested class operation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClassAtom {
    Literal(Literal),
    CharType(CharType),
    CharLiteral(CharLiteral),
    ControlChar(ControlChar),
    UnicodeProp(UnicodeProp),
    PosixClass(PosixClass),
}

impl ClassAtom {
    pub fn span(&self) -> Span {
        match self {
            ClassAtom::Literal(n) => n.span,
            ClassAtom::CharType(n) => n.span,
            ClassAtom::CharLiteral(n) => n.span,
            ClassAtom::ControlChar(n) => n.span,
            ClassAtom::UnicodeProp(n) => n.span,
            ClassAtom::PosixClass(n) => n.span,
        }
    }

    /// The single codepoint this atom yields, if it unambiguously yields
    /// one (a literal of length 1, a char-literal escape, a control char).
    /// Shorthand classes, unicode properties, and POSIX classes do not
    /// yield a single codepoint and return `None`.
    pub fn single_codepoint(&self) -> Option<u32> {
        match self {
            ClassAtom::Literal(l) => {
                let mut chars = l.value.chars();
                let c = chars.next()?;
                if chars.next().is_none() {
                    Some(c as u32)
                } else {
                    None
                }
            }
            ClassAtom::CharLiteral(c) => Some(c.code_point),
            ClassAtom::ControlChar(c) => Some(c.code_point),
            ClassAtom::CharType(_) | ClassAtom::UnicodeProp(_) | ClassAtom::PosixClass(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: ClassAtom,
    pub end: ClassAtom,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassOpKind {
    Intersection,
    Subtraction,
}

/// A character class's body: an optional binary operation (`&&`/`--`, left
/// associative) over alternated parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClassExpr {
    Parts(Vec<ClassPart>),
    Operation {
        kind: ClassOpKind,
        left: Box<ClassExpr>,
        right: Box<ClassExpr>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClassPart {
    Range(Range),
    Atom(ClassAtom),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharClass {
    pub negated: bool,
    pub body: ClassExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BackrefRef {
    Name(String),
    Index(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backref {
    pub reference: BackrefRef,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SubroutineRef {
    Name(String),
    Index(i64),
    /// `(?R)` / `(?0)`: recurse into the whole pattern.
    WholePattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subroutine {
    pub reference: SubroutineRef,
    /// The literal syntax used, e.g. `"(?1)"`, `"(?&n)"`, `"\\g<n>"`, `"(?R)"`.
    pub syntax: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    Capturing,
    Named,
    NonCapturing,
    Atomic,
    LookaheadPositive,
    LookaheadNegative,
    LookbehindPositive,
    LookbehindNegative,
    BranchReset,
    /// `(?flags)` or `(?flags-flags)` with no `:` — affects the remainder
    /// of the enclosing alternation-sequence rather than wrapping a body.
    InlineFlags,
    /// `(?flags:...)` — a scoped span of flags wrapping `child`.
    ModifierSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub child: Box<Node>,
    pub kind: GroupKind,
    pub name: Option<String>,
    pub flags: Option<InlineFlagChange>,
    pub span: Span,
}

/// The flags an `(?flags)`/`(?flags-flags)`/`(?flags:...)` construct sets
/// and unsets, expressed as letters from the configured inline-flag
/// alphabet (`imsxUJnr` by default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InlineFlagChange {
    pub set: String,
    pub unset: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ConditionKind {
    GroupIndex(i64),
    GroupName(String),
    Recursion(Option<i64>),
    Define,
    /// The condition is itself a lookaround; it is represented inline as a
    /// boxed [`Node::Group`] with a lookaround `GroupKind`.
    Lookaround(Box<Node>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditional {
    pub condition: ConditionKind,
    pub yes: Box<Node>,
    pub no: Option<Box<Node>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Define {
    pub content: Box<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantifierKind {
    Greedy,
    Lazy,
    Possessive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quantifier {
    pub child: Box<Node>,
    pub token: String,
    pub kind: QuantifierKind,
    pub min: i64,
    /// `-1` means unbounded (`∞`).
    pub max: i64,
    pub span: Span,
}

impl Quantifier {
    pub fn is_unbounded(&self) -> bool {
        self.max == -1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcreVerb {
    /// Either `NAME` or `NAME:ARG`.
    pub verb: String,
    pub span: Span,
}

impl PcreVerb {
    pub fn name(&self) -> &str {
        self.verb.split(':').next().unwrap_or(&self.verb)
    }

    pub fn arg(&self) -> Option<&str> {
        self.verb.split_once(':').map(|(_, a)| a)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keep {
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum CalloutId {
    Int(i64),
    Str(String),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callout {
    pub identifier: CalloutId,
    pub is_string: bool,
    pub span: Span,
}

// ---------------------------------------------------------------------
// GroupNumbering
// ---------------------------------------------------------------------

/// PCRE capture numbering for a parsed pattern, branch-reset aware.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GroupNumbering {
    pub max_group_number: usize,
    pub capture_sequence: Vec<usize>,
    pub named_groups: HashMap<String, Vec<usize>>,
}

// ---------------------------------------------------------------------
// LiteralSet
// ---------------------------------------------------------------------

/// An immutable pair of prefix/suffix string sets with a `complete` flag,
/// and the small algebra (`concat`, `unite`) used to derive one across an
/// AST. Sets are vectors, not `HashSet`s: insertion-order dedup is
/// required, so order is part of the observable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralSet {
    pub prefixes: Vec<String>,
    pub suffixes: Vec<String>,
    pub complete: bool,
}

fn dedup_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|s| seen.insert(s.clone())).collect()
}

impl LiteralSet {
    pub fn empty() -> Self {
        LiteralSet {
            prefixes: Vec::new(),
            suffixes: Vec::new(),
            complete: false,
        }
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        let s = s.into();
        LiteralSet {
            prefixes: vec![s.clone()],
            suffixes: vec![s],
            complete: true,
        }
    }

    pub fn is_void(&self) -> bool {
        self.prefixes.is_empty() && self.suffixes.is_empty()
    }

    /// Sequential composition: `A` followed by `B`.
    pub fn concat(a: &LiteralSet, b: &LiteralSet) -> LiteralSet {
        let prefixes = if a.complete && !b.prefixes.is_empty() {
            let mut out = Vec::new();
            for pa in &a.prefixes {
                for pb in &b.prefixes {
                    out.push(format!("{pa}{pb}"));
                }
            }
            out
        } else {
            a.prefixes.clone()
        };

        let suffixes = if b.complete && !a.suffixes.is_empty() {
            let mut out = Vec::new();
            for sb in &b.suffixes {
                for sa in &a.suffixes {
                    out.push(format!("{sa}{sb}"));
                }
            }
            out
        } else {
            b.suffixes.clone()
        };

        LiteralSet {
            prefixes: dedup_preserve_order(prefixes),
            suffixes: dedup_preserve_order(suffixes),
            complete: a.complete && b.complete,
        }
    }

    /// Choice: either `A` or `B`.
    pub fn unite(a: &LiteralSet, b: &LiteralSet) -> LiteralSet {
        let mut prefixes = a.prefixes.clone();
        prefixes.extend(b.prefixes.clone());
        let mut suffixes = a.suffixes.clone();
        suffixes.extend(b.suffixes.clone());
        // A void side contributes no branch to choose between, so it must
        // not drag completeness down: `unite(empty(), A) == A`.
        let complete = if a.is_void() {
            b.complete
        } else if b.is_void() {
            a.complete
        } else {
            a.complete && b.complete
        };
        LiteralSet {
            prefixes: dedup_preserve_order(prefixes),
            suffixes: dedup_preserve_order(suffixes),
            complete,
        }
    }

    /// The longest prefix, ties broken by first insertion.
    pub fn longest_prefix(&self) -> Option<&str> {
        self.prefixes
            .iter()
            .fold(None::<&str>, |best, cur| match best {
                Some(b) if b.len() >= cur.len() => Some(b),
                _ => Some(cur),
            })
    }

    /// The longest suffix, ties broken by first insertion.
    pub fn longest_suffix(&self) -> Option<&str> {
        self.suffixes
            .iter()
            .fold(None::<&str>, |best, cur| match best {
                Some(b) if b.len() >= cur.len() => Some(b),
                _ => Some(cur),
            })
    }
}
