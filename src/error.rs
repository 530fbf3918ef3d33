//! Typed errors surfaced at every public boundary of the core.
//!
//! Every lexical or syntactic failure is a [`PcreError`] variant carrying a
//! message, an optional byte offset into the pattern body, and (on request)
//! a single-line excerpt with a caret pointing at the offending byte, so a
//! caller can render a precise diagnostic without re-deriving position
//! information itself.
//!
//! Analyzers never raise: a malformed AST produces a [`crate::analysis::Problem`]
//! report instead. Only [`crate::splitter`], [`crate::lexer`], and
//! [`crate::parser`] construct `PcreError` values.

use std::fmt;

/// The closed set of error kinds this core can raise.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PcreError {
    #[error("{0}")]
    Delimiter(String),
    #[error("{0}")]
    Flag(String),
    #[error("{0}")]
    Encoding(String),
    #[error("{0}")]
    TrailingEscape(String),
    #[error("{0}")]
    UnterminatedClass(String),
    #[error("{0}")]
    QuantifierSyntax(String),
    #[error("{0}")]
    QuantifierTarget(String),
    #[error("{0}")]
    Name(String),
    #[error("{0}")]
    CharClassRange(String),
    #[error("{0}")]
    ConditionalSyntax(String),
    #[error("{0}")]
    UnknownGroupModifier(String),
    #[error("{0}")]
    RecursionLimit(String),
    #[error("{0}")]
    ResourceLimit(String),
    #[error("{0}")]
    Parser(String),
}

impl PcreError {
    /// The message text, independent of which variant this is.
    pub fn message(&self) -> &str {
        match self {
            PcreError::Delimiter(m)
            | PcreError::Flag(m)
            | PcreError::Encoding(m)
            | PcreError::TrailingEscape(m)
            | PcreError::UnterminatedClass(m)
            | PcreError::QuantifierSyntax(m)
            | PcreError::QuantifierTarget(m)
            | PcreError::Name(m)
            | PcreError::CharClassRange(m)
            | PcreError::ConditionalSyntax(m)
            | PcreError::UnknownGroupModifier(m)
            | PcreError::RecursionLimit(m)
            | PcreError::ResourceLimit(m)
            | PcreError::Parser(m) => m,
        }
    }

    /// A short, stable name for the variant, used by LSP-style diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PcreError::Delimiter(_) => "DelimiterError",
            PcreError::Flag(_) => "FlagError",
            PcreError::Encoding(_) => "EncodingError",
            PcreError::TrailingEscape(_) => "TrailingEscapeError",
            PcreError::UnterminatedClass(_) => "UnterminatedClassError",
            PcreError::QuantifierSyntax(_) => "QuantifierSyntaxError",
            PcreError::QuantifierTarget(_) => "QuantifierTargetError",
            PcreError::Name(_) => "NameError",
            PcreError::CharClassRange(_) => "CharClassRangeError",
            PcreError::ConditionalSyntax(_) => "ConditionalSyntaxError",
            PcreError::UnknownGroupModifier(_) => "UnknownGroupModifierError",
            PcreError::RecursionLimit(_) => "RecursionLimitError",
            PcreError::ResourceLimit(_) => "ResourceLimitError",
            PcreError::Parser(_) => "ParserError",
        }
    }
}

/// A `PcreError` bundled with the location it occurred at and (optionally)
/// a caret snippet over the original pattern body.
///
/// This is the value type every public entry point in [`crate::facade`]
/// actually returns on failure; `PcreError` alone carries no position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    pub error: PcreError,
    pub offset: Option<usize>,
    pub snippet: Option<String>,
}

impl SourceError {
    pub fn new(error: PcreError, offset: Option<usize>, source: &str) -> Self {
        let snippet = offset.map(|pos| render_snippet(source, pos));
        SourceError {
            error,
            offset,
            snippet,
        }
    }

    pub fn without_source(error: PcreError, offset: Option<usize>) -> Self {
        SourceError {
            error,
            offset,
            snippet: None,
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(pos) = self.offset {
            write!(f, " at position {pos}")?;
        }
        if let Some(ref snippet) = self.snippet {
            write!(f, "\n{snippet}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SourceError {}

/// Render a single-line excerpt of `source` around byte offset `pos`, with a
/// caret line under the offending byte. Byte offsets that land outside the
/// source are clamped to the nearest valid boundary.
pub fn render_snippet(source: &str, pos: usize) -> String {
    let pos = pos.min(source.len());
    let line_start = source[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = source[pos..]
        .find('\n')
        .map(|i| pos + i)
        .unwrap_or(source.len());
    let line = &source[line_start..line_end];
    let col = pos - line_start;
    format!("{line}\n{}^", " ".repeat(col))
}
