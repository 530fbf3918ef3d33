//! Recursive-descent parser turning a token sequence into a [`Node`] tree.
//!
//! Grammar, roughly: `alternation := sequence ('|' sequence)*`,
//! `sequence := quantified_atom*`, `quantified_atom := atom quantifier?`.
//! Groups opened with a plain `(` are ordinary [`GroupKind::Capturing`];
//! everything behind `(?` is disambiguated here, token by token, since the
//! lexer has no notion of group syntax beyond the raw character stream.
//! A conditional's test clause and most single-shot constructs (`\g`-style
//! subroutine calls, callouts, `(?R)`, `(?DEFINE)`) never contain nested
//! parentheses, so they're read as raw text up to the next unconsumed
//! `T_GROUP_CLOSE` rather than re-entering the grammar.
//!
//! Two resource limits guard against pathological input: `max_recursion_depth`
//! bounds how deep `parse_alternation` may re-enter itself, and `max_nodes`
//! bounds how many AST nodes may be constructed in total.

use crate::ast::*;
use crate::config::Config;
use crate::error::{PcreError, SourceError};
use crate::lexer::{self, Token, TokenKind};
use crate::token_stream::TokenStream;

struct Parser<'a> {
    tokens: TokenStream,
    source: &'a str,
    config: &'a Config,
    depth: usize,
    node_count: usize,
}

/// Parse a pattern body (already separated from its delimiters and flag
/// string by [`crate::splitter::split`]) into a [`Node::Regex`].
pub fn parse(body: &str, flags: &str, delimiter: char, config: &Config) -> Result<Node, SourceError> {
    if body.len() > config.max_pattern_length {
        return Err(SourceError::without_source(
            PcreError::ResourceLimit(format!(
                "pattern body of {} bytes exceeds max_pattern_length ({})",
                body.len(),
                config.max_pattern_length
            )),
            Some(body.len()),
        ));
    }

    let tokens = lexer::tokenize(body)?;
    let mut parser = Parser {
        tokens: TokenStream::new(tokens),
        source: body,
        config,
        depth: 0,
        node_count: 0,
    };

    let pattern = parser.parse_alternation()?;
    if !parser.tokens.at_eof() {
        return Err(parser.err_here(PcreError::Parser(
            "unexpected trailing content after pattern".to_string(),
        )));
    }

    let span = Span::new(0, body.len());
    Ok(Node::Regex(Regex {
        pattern: Box::new(pattern),
        flags: Flags::from_letters(flags),
        delimiter,
        length: body.len(),
        span,
    }))
}

/// Parse a pattern body on its own (no surrounding `Regex` wrapper),
/// for callers that already know flags don't matter to them — the
/// facade's `parsePattern`/`tokenize` entry points.
pub fn parse_body(body: &str, config: &Config) -> Result<Node, SourceError> {
    let tokens = lexer::tokenize(body)?;
    let mut parser = Parser {
        tokens: TokenStream::new(tokens),
        source: body,
        config,
        depth: 0,
        node_count: 0,
    };
    let pattern = parser.parse_alternation()?;
    if !parser.tokens.at_eof() {
        return Err(parser.err_here(PcreError::Parser(
            "unexpected trailing content after pattern".to_string(),
        )));
    }
    Ok(pattern)
}

impl<'a> Parser<'a> {
    fn err_here(&self, error: PcreError) -> SourceError {
        SourceError::new(error, Some(self.tokens.peek().position), self.source)
    }

    fn err_at(&self, error: PcreError, pos: usize) -> SourceError {
        SourceError::new(error, Some(pos), self.source)
    }

    fn bump_node_count(&mut self) -> Result<(), SourceError> {
        self.node_count += 1;
        if self.node_count > self.config.max_nodes {
            return Err(self.err_here(PcreError::ResourceLimit(format!(
                "pattern constructs more than max_nodes ({}) AST nodes",
                self.config.max_nodes
            ))));
        }
        Ok(())
    }

    /// Consume the current token and return it along with the span it
    /// covers (its start, through the byte position the *next* token
    /// begins at).
    fn advance_with_span(&mut self) -> (Token, Span) {
        let tok = self.tokens.advance().clone();
        let end = self.tokens.peek().position;
        let span = Span::new(tok.position, end);
        (tok, span)
    }

    fn expect_group_close(&mut self, open_pos: usize) -> Result<(), SourceError> {
        if self.tokens.peek().kind != TokenKind::GroupClose {
            return Err(self.err_at(
                PcreError::Parser("unterminated group: missing ')'".to_string()),
                open_pos,
            ));
        }
        self.tokens.advance();
        Ok(())
    }

    /// Read raw value text up to (and consuming) the next `T_GROUP_CLOSE`.
    /// Used for constructs that cannot themselves contain nested
    /// parentheses: numbered/named subroutine calls, callouts, bare
    /// conditional test references.
    fn read_name_until_group_close(&mut self) -> Result<String, SourceError> {
        let mut s = String::new();
        loop {
            let tok = self.tokens.peek().clone();
            match tok.kind {
                TokenKind::GroupClose => {
                    self.tokens.advance();
                    return Ok(s);
                }
                TokenKind::Eof => {
                    return Err(self.err_at(
                        PcreError::Name("unterminated construct: missing ')'".to_string()),
                        tok.position,
                    ));
                }
                _ => {
                    s.push_str(&tok.value);
                    self.tokens.advance();
                }
            }
        }
    }

    /// Read raw value text up to (and consuming) a single-character
    /// literal token equal to `stop` — used for `<name>` and `'name'`
    /// headers, whose terminator isn't `)`.
    fn read_name_until(&mut self, stop: char) -> Result<String, SourceError> {
        let stop_s = stop.to_string();
        let mut s = String::new();
        loop {
            let tok = self.tokens.peek().clone();
            if tok.kind == TokenKind::Eof {
                return Err(self.err_at(
                    PcreError::Name("unterminated group name".to_string()),
                    tok.position,
                ));
            }
            if tok.kind == TokenKind::Literal && tok.value == stop_s {
                self.tokens.advance();
                return Ok(s);
            }
            s.push_str(&tok.value);
            self.tokens.advance();
        }
    }

    // -----------------------------------------------------------------
    // alternation / sequence / quantified atom
    // -----------------------------------------------------------------

    fn parse_alternation(&mut self) -> Result<Node, SourceError> {
        self.depth += 1;
        let result = (|| {
            if self.depth > self.config.max_recursion_depth {
                return Err(self.err_here(PcreError::RecursionLimit(format!(
                    "pattern nests more than max_recursion_depth ({}) levels deep",
                    self.config.max_recursion_depth
                ))));
            }
            let start = self.tokens.peek().position;
            let mut alternatives = vec![self.parse_sequence()?];
            while self.tokens.peek().kind == TokenKind::Alternation {
                self.tokens.advance();
                alternatives.push(self.parse_sequence()?);
            }
            let end = self.tokens.peek().position;
            self.bump_node_count()?;
            Ok(Node::alternation(alternatives, Span::new(start, end)))
        })();
        self.depth -= 1;
        result
    }

    fn parse_sequence(&mut self) -> Result<Node, SourceError> {
        let start = self.tokens.peek().position;
        let mut children = Vec::new();
        loop {
            match self.tokens.peek().kind {
                TokenKind::Alternation | TokenKind::GroupClose | TokenKind::Eof => break,
                TokenKind::Quantifier => {
                    return Err(self.err_here(PcreError::QuantifierTarget(
                        "quantifier has nothing to repeat".to_string(),
                    )));
                }
                _ => children.push(self.parse_quantified_atom()?),
            }
        }
        let end = self.tokens.peek().position;
        self.bump_node_count()?;
        Ok(Node::sequence(children, Span::new(start, end)))
    }

    fn parse_quantified_atom(&mut self) -> Result<Node, SourceError> {
        let atom = self.parse_atom()?;
        if self.tokens.peek().kind != TokenKind::Quantifier {
            return Ok(atom);
        }
        if !is_quantifiable(&atom) {
            return Err(self.err_here(PcreError::QuantifierTarget(
                "quantifier cannot apply to an empty atom, an assertion, or a verb".to_string(),
            )));
        }
        let tok = self.tokens.advance().clone();
        let (kind, min, max) = parse_quantifier_text(&tok.value)
            .map_err(|msg| self.err_at(PcreError::QuantifierSyntax(msg), tok.position))?;
        let end = self.tokens.peek().position;
        let span = Span::new(atom.span().start, end);
        self.bump_node_count()?;
        let quantified = Node::Quantifier(Quantifier {
            child: Box::new(atom),
            token: tok.value,
            kind,
            min,
            max,
            span,
        });
        if self.tokens.peek().kind == TokenKind::Quantifier {
            return Err(self.err_here(PcreError::QuantifierTarget(
                "a quantifier cannot itself be quantified".to_string(),
            )));
        }
        Ok(quantified)
    }

    // -----------------------------------------------------------------
    // atoms
    // -----------------------------------------------------------------

    fn parse_atom(&mut self) -> Result<Node, SourceError> {
        self.bump_node_count()?;
        match self.tokens.peek().kind {
            TokenKind::Literal => self.parse_literal_run(),
            TokenKind::LiteralEscaped => {
                let (tok, span) = self.advance_with_span();
                Ok(Node::literal(tok.value, span))
            }
            TokenKind::Dot => {
                let (_, span) = self.advance_with_span();
                Ok(Node::Dot(Dot { span }))
            }
            TokenKind::Anchor => {
                let (tok, span) = self.advance_with_span();
                let at = if tok.value == "^" {
                    AnchorKind::Start
                } else {
                    AnchorKind::End
                };
                Ok(Node::Anchor(Anchor { at, span }))
            }
            TokenKind::Assertion => self.parse_assertion(),
            TokenKind::Keep => {
                let (_, span) = self.advance_with_span();
                Ok(Node::Keep(Keep { span }))
            }
            TokenKind::CharType => {
                let (tok, span) = self.advance_with_span();
                let kind = char_type_kind(&tok.value)
                    .map_err(|m| self.err_at(PcreError::Parser(m), span.start))?;
                Ok(Node::CharType(CharType { kind, span }))
            }
            TokenKind::Backref => self.parse_numeric_or_named_backref(),
            TokenKind::GReference => self.parse_g_reference(),
            TokenKind::Unicode | TokenKind::UnicodeNamed | TokenKind::Octal | TokenKind::OctalLegacy => {
                self.parse_char_literal()
            }
            TokenKind::ControlChar => self.parse_control_char(),
            TokenKind::UnicodeProp => self.parse_unicode_prop(),
            TokenKind::CharClassOpen => self.parse_char_class(),
            TokenKind::GroupOpen | TokenKind::GroupModifierOpen => self.parse_group(),
            TokenKind::CommentOpen => {
                let (tok, span) = self.advance_with_span();
                Ok(Node::Comment(Comment {
                    text: tok.value,
                    span,
                }))
            }
            TokenKind::PcreVerb => {
                let (tok, span) = self.advance_with_span();
                Ok(Node::PcreVerb(PcreVerb {
                    verb: tok.value,
                    span,
                }))
            }
            other => Err(self.err_here(PcreError::Parser(format!(
                "unexpected token while parsing an atom: {other:?}"
            )))),
        }
    }

    /// Coalesce a run of single-character literals into one `Literal`
    /// node, except the last character of the run must stay a separate
    /// one-character node if a quantifier immediately follows it — a
    /// quantifier binds to the single atom before it, never to a run.
    fn parse_literal_run(&mut self) -> Result<Node, SourceError> {
        let start = self.tokens.peek().position;
        if self.tokens.peek_at(1).kind == TokenKind::Quantifier {
            let (tok, span) = self.advance_with_span();
            return Ok(Node::literal(tok.value, span));
        }
        let mut value = String::new();
        loop {
            if self.tokens.peek().kind != TokenKind::Literal {
                break;
            }
            if self.tokens.peek_at(1).kind == TokenKind::Quantifier {
                break;
            }
            let tok = self.tokens.advance().clone();
            value.push_str(&tok.value);
        }
        let end = self.tokens.peek().position;
        Ok(Node::literal(value, Span::new(start, end)))
    }

    fn parse_assertion(&mut self) -> Result<Node, SourceError> {
        let (tok, span) = self.advance_with_span();
        let kind = match tok.value.as_str() {
            "A" => AssertionKind::A,
            "z" => AssertionKind::Z,
            "Z" => AssertionKind::BigZ,
            "G" => AssertionKind::G,
            "b" => AssertionKind::B,
            "B" => AssertionKind::BigB,
            other => {
                return Err(self.err_at(
                    PcreError::Parser(format!("unknown assertion '\\{other}'")),
                    span.start,
                ))
            }
        };
        Ok(Node::Assertion(Assertion {
            kind,
            child: None,
            span,
        }))
    }

    fn parse_numeric_or_named_backref(&mut self) -> Result<Node, SourceError> {
        let (tok, span) = self.advance_with_span();
        let reference = if !tok.value.is_empty() && tok.value.chars().all(|c| c.is_ascii_digit()) {
            BackrefRef::Index(tok.value.parse().unwrap_or(0))
        } else {
            BackrefRef::Name(strip_outer_delims(&tok.value, 2))
        };
        Ok(Node::Backref(Backref { reference, span }))
    }

    /// `\g{n}`/`\g{name}` is a backreference; `\g<n>`/`\g'n'` (and their
    /// name variants) are subroutine calls — PCRE's own split between the
    /// two delimiter styles.
    fn parse_g_reference(&mut self) -> Result<Node, SourceError> {
        let (tok, span) = self.advance_with_span();
        let rest = &tok.value[2..];
        if let Some(inner) = rest.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            return Ok(Node::Subroutine(Subroutine {
                reference: numbered_or_named_subroutine(inner),
                syntax: tok.value.clone(),
                span,
            }));
        }
        if let Some(inner) = rest.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
            return Ok(Node::Subroutine(Subroutine {
                reference: numbered_or_named_subroutine(inner),
                syntax: tok.value.clone(),
                span,
            }));
        }
        if let Some(inner) = rest.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            let reference = match inner.parse::<i64>() {
                Ok(n) => BackrefRef::Index(n),
                Err(_) => BackrefRef::Name(inner.to_string()),
            };
            return Ok(Node::Backref(Backref { reference, span }));
        }
        let reference = BackrefRef::Index(rest.parse().unwrap_or(0));
        Ok(Node::Backref(Backref { reference, span }))
    }

    fn parse_char_literal(&mut self) -> Result<Node, SourceError> {
        let (tok, span) = self.advance_with_span();
        let (code_point, kind) = decode_char_literal(&tok)
            .map_err(|m| self.err_at(PcreError::Encoding(m), span.start))?;
        Ok(Node::CharLiteral(CharLiteral {
            representation: tok.value,
            code_point,
            kind,
            span,
        }))
    }

    fn parse_control_char(&mut self) -> Result<Node, SourceError> {
        let (tok, span) = self.advance_with_span();
        let ch = tok.value.chars().last().ok_or_else(|| {
            self.err_at(
                PcreError::Parser("empty \\c control-character escape".to_string()),
                span.start,
            )
        })?;
        let code_point = (ch.to_ascii_uppercase() as u32) ^ 0x40;
        Ok(Node::ControlChar(ControlChar {
            ch,
            code_point,
            span,
        }))
    }

    fn parse_unicode_prop(&mut self) -> Result<Node, SourceError> {
        let (tok, span) = self.advance_with_span();
        Ok(Node::UnicodeProp(decode_unicode_prop(&tok, span)))
    }

    // -----------------------------------------------------------------
    // character classes
    // -----------------------------------------------------------------

    fn parse_char_class(&mut self) -> Result<Node, SourceError> {
        let open = self.tokens.advance().clone();
        let start = open.position;
        let negated = if self.tokens.peek().kind == TokenKind::Negation {
            self.tokens.advance();
            true
        } else {
            false
        };
        let body = self.parse_class_body()?;
        if self.tokens.peek().kind != TokenKind::CharClassClose {
            return Err(self.err_at(
                PcreError::UnterminatedClass("unterminated character class: missing ']'".to_string()),
                start,
            ));
        }
        let (_, close_span) = self.advance_with_span();
        Ok(Node::CharClass(CharClass {
            negated,
            body,
            span: Span::new(start, close_span.end),
        }))
    }

    fn parse_class_body(&mut self) -> Result<ClassExpr, SourceError> {
        let mut left = self.parse_class_parts()?;
        loop {
            let kind = match self.tokens.peek().kind {
                TokenKind::ClassIntersection => ClassOpKind::Intersection,
                TokenKind::ClassSubtraction => ClassOpKind::Subtraction,
                _ => break,
            };
            self.tokens.advance();
            let right = self.parse_class_parts()?;
            left = ClassExpr::Operation {
                kind,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_class_parts(&mut self) -> Result<ClassExpr, SourceError> {
        let mut parts = Vec::new();
        loop {
            match self.tokens.peek().kind {
                TokenKind::CharClassClose
                | TokenKind::ClassIntersection
                | TokenKind::ClassSubtraction
                | TokenKind::Eof => break,
                _ => parts.push(self.parse_class_part()?),
            }
        }
        Ok(ClassExpr::Parts(parts))
    }

    fn parse_class_part(&mut self) -> Result<ClassPart, SourceError> {
        let atom = self.parse_class_atom()?;
        if self.tokens.peek().kind == TokenKind::Range {
            let range_start = atom.span().start;
            self.tokens.advance();
            let end_atom = self.parse_class_atom()?;
            let span = Span::new(range_start, end_atom.span().end);
            return Ok(ClassPart::Range(Range {
                start: atom,
                end: end_atom,
                span,
            }));
        }
        Ok(ClassPart::Atom(atom))
    }

    fn parse_class_atom(&mut self) -> Result<ClassAtom, SourceError> {
        let (tok, span) = self.advance_with_span();
        match tok.kind {
            TokenKind::Literal | TokenKind::LiteralEscaped => {
                Ok(ClassAtom::Literal(Literal {
                    value: tok.value,
                    span,
                }))
            }
            TokenKind::CharType => {
                let kind = char_type_kind(&tok.value)
                    .map_err(|m| self.err_at(PcreError::CharClassRange(m), span.start))?;
                Ok(ClassAtom::CharType(CharType { kind, span }))
            }
            TokenKind::Unicode | TokenKind::UnicodeNamed | TokenKind::Octal | TokenKind::OctalLegacy => {
                let (code_point, kind) = decode_char_literal(&tok)
                    .map_err(|m| self.err_at(PcreError::CharClassRange(m), span.start))?;
                Ok(ClassAtom::CharLiteral(CharLiteral {
                    representation: tok.value,
                    code_point,
                    kind,
                    span,
                }))
            }
            TokenKind::ControlChar => {
                let ch = tok.value.chars().last().ok_or_else(|| {
                    self.err_at(
                        PcreError::CharClassRange("empty \\c control-character escape".to_string()),
                        span.start,
                    )
                })?;
                let code_point = (ch.to_ascii_uppercase() as u32) ^ 0x40;
                Ok(ClassAtom::ControlChar(ControlChar {
                    ch,
                    code_point,
                    span,
                }))
            }
            TokenKind::UnicodeProp => Ok(ClassAtom::UnicodeProp(decode_unicode_prop(&tok, span))),
            TokenKind::PosixClass => {
                let (name, negated) = decode_posix_class(&tok.value);
                Ok(ClassAtom::PosixClass(PosixClass {
                    name,
                    negated,
                    span,
                }))
            }
            other => Err(self.err_at(
                PcreError::CharClassRange(format!(
                    "unexpected token inside character class: {other:?}"
                )),
                span.start,
            )),
        }
    }

    // -----------------------------------------------------------------
    // groups
    // -----------------------------------------------------------------

    fn parse_group(&mut self) -> Result<Node, SourceError> {
        let open = self.tokens.advance().clone();
        match open.kind {
            TokenKind::GroupOpen => {
                let child = self.parse_alternation()?;
                self.expect_group_close(open.position)?;
                let end = self.tokens.peek().position;
                Ok(Node::Group(Group {
                    child: Box::new(child),
                    kind: GroupKind::Capturing,
                    name: None,
                    flags: None,
                    span: Span::new(open.position, end),
                }))
            }
            TokenKind::GroupModifierOpen => self.parse_group_modifier(open.position),
            _ => unreachable!("parse_group called on a non-group token"),
        }
    }

    fn parse_wrapped_body(
        &mut self,
        open_pos: usize,
        kind: GroupKind,
        name: Option<String>,
        flags: Option<InlineFlagChange>,
    ) -> Result<Node, SourceError> {
        let child = self.parse_alternation()?;
        self.expect_group_close(open_pos)?;
        let end = self.tokens.peek().position;
        Ok(Node::Group(Group {
            child: Box::new(child),
            kind,
            name,
            flags,
            span: Span::new(open_pos, end),
        }))
    }

    /// Dispatch on whatever immediately follows `(?` — the lexer hands us
    /// the raw character stream from here on, so every group-modifier
    /// syntax form (named groups, lookaround, atomic, branch-reset,
    /// conditionals, inline flags, subroutine calls, callouts) is
    /// distinguished right here.
    fn parse_group_modifier(&mut self, open_pos: usize) -> Result<Node, SourceError> {
        let next = self.tokens.peek().clone();

        if next.kind == TokenKind::GroupOpen || next.kind == TokenKind::GroupModifierOpen {
            return self.parse_conditional(open_pos);
        }

        if next.kind == TokenKind::Alternation {
            self.tokens.advance();
            return self.parse_wrapped_body(open_pos, GroupKind::BranchReset, None, None);
        }

        if next.kind == TokenKind::Quantifier && next.value == "+" {
            return self.parse_numbered_subroutine_head(open_pos);
        }

        if next.kind != TokenKind::Literal {
            return Err(self.err_at(
                PcreError::UnknownGroupModifier("malformed group modifier after '(?'".to_string()),
                open_pos,
            ));
        }

        match next.value.as_str() {
            "=" => {
                self.tokens.advance();
                self.parse_wrapped_body(open_pos, GroupKind::LookaheadPositive, None, None)
            }
            "!" => {
                self.tokens.advance();
                self.parse_wrapped_body(open_pos, GroupKind::LookaheadNegative, None, None)
            }
            ":" => {
                self.tokens.advance();
                self.parse_wrapped_body(open_pos, GroupKind::NonCapturing, None, None)
            }
            ">" => {
                self.tokens.advance();
                self.parse_wrapped_body(open_pos, GroupKind::Atomic, None, None)
            }
            "<" => self.parse_angle_head(open_pos),
            "'" => {
                self.tokens.advance();
                let name = self.read_name_until('\'')?;
                self.parse_wrapped_body(open_pos, GroupKind::Named, Some(name), None)
            }
            "P" => self.parse_p_head(open_pos),
            "R" => self.parse_recursion_head(open_pos),
            "&" => self.parse_named_subroutine_head(open_pos),
            "C" => self.parse_callout_head(open_pos),
            "-" => {
                let after = self.tokens.peek_at(1).clone();
                let after_is_digit = after.value.chars().next().is_some_and(|c| c.is_ascii_digit());
                if after_is_digit {
                    self.parse_numbered_subroutine_head(open_pos)
                } else {
                    self.parse_inline_flags_head(open_pos)
                }
            }
            v if v.chars().next().is_some_and(|c| c.is_ascii_digit()) => {
                self.parse_numbered_subroutine_head(open_pos)
            }
            v if v.chars().next().is_some_and(|c| self.config.allowed_inline_flags.contains(c)) => {
                self.parse_inline_flags_head(open_pos)
            }
            other => Err(self.err_at(
                PcreError::UnknownGroupModifier(format!(
                    "unrecognized group modifier starting with '{other}'"
                )),
                open_pos,
            )),
        }
    }

    fn parse_angle_head(&mut self, open_pos: usize) -> Result<Node, SourceError> {
        self.tokens.advance(); // '<'
        let nxt = self.tokens.peek().clone();
        if nxt.kind == TokenKind::Literal && nxt.value == "=" {
            self.tokens.advance();
            return self.parse_wrapped_body(open_pos, GroupKind::LookbehindPositive, None, None);
        }
        if nxt.kind == TokenKind::Literal && nxt.value == "!" {
            self.tokens.advance();
            return self.parse_wrapped_body(open_pos, GroupKind::LookbehindNegative, None, None);
        }
        let name = self.read_name_until('>')?;
        self.parse_wrapped_body(open_pos, GroupKind::Named, Some(name), None)
    }

    fn parse_p_head(&mut self, open_pos: usize) -> Result<Node, SourceError> {
        self.tokens.advance(); // 'P'
        let nxt = self.tokens.peek().clone();
        match nxt.value.as_str() {
            "<" => {
                self.tokens.advance();
                let name = self.read_name_until('>')?;
                self.parse_wrapped_body(open_pos, GroupKind::Named, Some(name), None)
            }
            "=" => {
                self.tokens.advance();
                let name = self.read_name_until_group_close()?;
                let end = self.tokens.peek().position;
                Ok(Node::Backref(Backref {
                    reference: BackrefRef::Name(name),
                    span: Span::new(open_pos, end),
                }))
            }
            ">" => {
                self.tokens.advance();
                let name = self.read_name_until_group_close()?;
                let end = self.tokens.peek().position;
                Ok(Node::Subroutine(Subroutine {
                    reference: SubroutineRef::Name(name.clone()),
                    syntax: format!("(?P>{name})"),
                    span: Span::new(open_pos, end),
                }))
            }
            _ => Err(self.err_at(
                PcreError::UnknownGroupModifier("unknown '(?P...)' construct".to_string()),
                open_pos,
            )),
        }
    }

    fn parse_recursion_head(&mut self, open_pos: usize) -> Result<Node, SourceError> {
        self.tokens.advance(); // 'R'
        if self.tokens.peek().kind == TokenKind::GroupClose {
            self.tokens.advance();
            let end = self.tokens.peek().position;
            return Ok(Node::Subroutine(Subroutine {
                reference: SubroutineRef::WholePattern,
                syntax: "(?R)".to_string(),
                span: Span::new(open_pos, end),
            }));
        }
        Err(self.err_at(
            PcreError::Parser("expected ')' after '(?R'".to_string()),
            open_pos,
        ))
    }

    fn parse_named_subroutine_head(&mut self, open_pos: usize) -> Result<Node, SourceError> {
        self.tokens.advance(); // '&'
        let name = self.read_name_until_group_close()?;
        let end = self.tokens.peek().position;
        Ok(Node::Subroutine(Subroutine {
            reference: SubroutineRef::Name(name.clone()),
            syntax: format!("(?&{name})"),
            span: Span::new(open_pos, end),
        }))
    }

    fn parse_numbered_subroutine_head(&mut self, open_pos: usize) -> Result<Node, SourceError> {
        let text = self.read_name_until_group_close()?;
        let n: i64 = text.parse().map_err(|_| {
            self.err_at(
                PcreError::Name(format!("invalid subroutine reference '(?{text})'")),
                open_pos,
            )
        })?;
        let end = self.tokens.peek().position;
        Ok(Node::Subroutine(Subroutine {
            reference: SubroutineRef::Index(n),
            syntax: format!("(?{text})"),
            span: Span::new(open_pos, end),
        }))
    }

    fn parse_callout_head(&mut self, open_pos: usize) -> Result<Node, SourceError> {
        self.tokens.advance(); // 'C'
        let text = self.read_name_until_group_close()?;
        let end = self.tokens.peek().position;
        let identifier = if text.is_empty() {
            CalloutId::Int(0)
        } else if let Ok(n) = text.parse::<i64>() {
            CalloutId::Int(n)
        } else if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
            CalloutId::Str(text[1..text.len() - 1].to_string())
        } else {
            CalloutId::Name(text)
        };
        let is_string = matches!(identifier, CalloutId::Str(_));
        Ok(Node::Callout(Callout {
            identifier,
            is_string,
            span: Span::new(open_pos, end),
        }))
    }

    fn parse_inline_flags_head(&mut self, open_pos: usize) -> Result<Node, SourceError> {
        let mut set = String::new();
        let mut unset = String::new();
        let mut in_unset = false;
        let mut saw_colon = false;
        loop {
            let tok = self.tokens.peek().clone();
            match tok.kind {
                TokenKind::Literal if tok.value == "-" => {
                    in_unset = true;
                    self.tokens.advance();
                }
                TokenKind::Literal if tok.value == ":" => {
                    self.tokens.advance();
                    saw_colon = true;
                    break;
                }
                TokenKind::GroupClose => break,
                TokenKind::Literal => {
                    let ch = tok.value.chars().next().unwrap();
                    if !self.config.allowed_inline_flags.contains(ch) {
                        return Err(self.err_at(
                            PcreError::UnknownGroupModifier(format!(
                                "'{ch}' is not a recognized inline flag"
                            )),
                            tok.position,
                        ));
                    }
                    if ch == 'r' && !self.config.feature_version.allows_inline_r_modifier() {
                        return Err(self.err_at(
                            PcreError::UnknownGroupModifier(
                                "the inline 'r' modifier requires a newer target runtime".to_string(),
                            ),
                            tok.position,
                        ));
                    }
                    if in_unset {
                        unset.push(ch);
                    } else {
                        set.push(ch);
                    }
                    self.tokens.advance();
                }
                _ => {
                    return Err(self.err_at(
                        PcreError::UnknownGroupModifier("malformed inline flags".to_string()),
                        tok.position,
                    ))
                }
            }
        }
        let flags = InlineFlagChange { set, unset };
        if saw_colon {
            return self.parse_wrapped_body(open_pos, GroupKind::ModifierSpan, None, Some(flags));
        }
        self.expect_group_close(open_pos)?;
        let end = self.tokens.peek().position;
        // No scoped body: this construct sets the flags for the remainder
        // of the enclosing sequence, so its own `child` is an empty match.
        let child = Node::literal("", Span::new(end, end));
        Ok(Node::Group(Group {
            child: Box::new(child),
            kind: GroupKind::InlineFlags,
            name: None,
            flags: Some(flags),
            span: Span::new(open_pos, end),
        }))
    }

    // -----------------------------------------------------------------
    // conditionals
    // -----------------------------------------------------------------

    fn parse_conditional(&mut self, open_pos: usize) -> Result<Node, SourceError> {
        let condition = self.parse_condition_test()?;
        if let ConditionKind::Define = condition {
            let content = self.parse_alternation()?;
            self.expect_group_close(open_pos)?;
            let end = self.tokens.peek().position;
            return Ok(Node::Define(Define {
                content: Box::new(content),
                span: Span::new(open_pos, end),
            }));
        }

        let yes = self.parse_sequence()?;
        let no = if self.tokens.peek().kind == TokenKind::Alternation {
            self.tokens.advance();
            Some(Box::new(self.parse_sequence()?))
        } else {
            None
        };
        self.expect_group_close(open_pos)?;
        let end = self.tokens.peek().position;
        Ok(Node::Conditional(Conditional {
            condition,
            yes: Box::new(yes),
            no,
            span: Span::new(open_pos, end),
        }))
    }

    fn parse_condition_test(&mut self) -> Result<ConditionKind, SourceError> {
        if self.tokens.peek().kind == TokenKind::GroupModifierOpen {
            let node = self.parse_group()?;
            return Ok(ConditionKind::Lookaround(Box::new(node)));
        }
        if self.tokens.peek().kind != TokenKind::GroupOpen {
            return Err(self.err_here(PcreError::ConditionalSyntax(
                "expected a condition test after '(?'".to_string(),
            )));
        }
        self.tokens.advance();
        let text = self.read_name_until_group_close()?;
        Ok(classify_condition_text(&text))
    }
}

// -----------------------------------------------------------------------
// free functions shared between atom-level and class-level parsing
// -----------------------------------------------------------------------

fn strip_outer_delims(text: &str, skip: usize) -> String {
    let body = &text[skip..];
    if body.len() >= 2 {
        body[1..body.len() - 1].to_string()
    } else {
        body.to_string()
    }
}

fn numbered_or_named_subroutine(inner: &str) -> SubroutineRef {
    match inner.parse::<i64>() {
        Ok(n) => SubroutineRef::Index(n),
        Err(_) => SubroutineRef::Name(inner.to_string()),
    }
}

fn classify_condition_text(text: &str) -> ConditionKind {
    if text == "DEFINE" {
        return ConditionKind::Define;
    }
    if text == "R" {
        return ConditionKind::Recursion(None);
    }
    if let Some(rest) = text.strip_prefix('R') {
        if let Ok(n) = rest.parse::<i64>() {
            return ConditionKind::Recursion(Some(n));
        }
    }
    if let Some(inner) = text.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
        return ConditionKind::GroupName(inner.to_string());
    }
    if let Some(inner) = text.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return ConditionKind::GroupName(inner.to_string());
    }
    if let Ok(n) = text.parse::<i64>() {
        return ConditionKind::GroupIndex(n);
    }
    ConditionKind::GroupName(text.to_string())
}

fn char_type_kind(letter: &str) -> Result<CharTypeKind, String> {
    match letter {
        "d" => Ok(CharTypeKind::D),
        "D" => Ok(CharTypeKind::BigD),
        "s" => Ok(CharTypeKind::S),
        "S" => Ok(CharTypeKind::BigS),
        "w" => Ok(CharTypeKind::W),
        "W" => Ok(CharTypeKind::BigW),
        "h" => Ok(CharTypeKind::H),
        "v" => Ok(CharTypeKind::V),
        "R" => Ok(CharTypeKind::R),
        other => Err(format!("unknown character type '\\{other}'")),
    }
}

fn decode_char_literal(tok: &Token) -> Result<(u32, CharLiteralKind), String> {
    match tok.kind {
        TokenKind::Unicode => {
            if let Some(inner) = tok.value.strip_prefix("\\x{").and_then(|s| s.strip_suffix('}')) {
                let cp = u32::from_str_radix(inner, 16)
                    .map_err(|_| format!("invalid '\\x{{...}}' escape '{}'", tok.value))?;
                Ok((cp, CharLiteralKind::Unicode))
            } else {
                let hex = tok.value.trim_start_matches("\\x");
                let cp = if hex.is_empty() {
                    0
                } else {
                    u32::from_str_radix(hex, 16)
                        .map_err(|_| format!("invalid '\\x' escape '{}'", tok.value))?
                };
                Ok((cp, CharLiteralKind::Unicode))
            }
        }
        TokenKind::UnicodeNamed => {
            let inner = tok
                .value
                .trim_start_matches("\\N{")
                .trim_end_matches('}');
            let cp = inner
                .strip_prefix("U+")
                .and_then(|h| u32::from_str_radix(h, 16).ok())
                .unwrap_or(0xFFFD);
            Ok((cp, CharLiteralKind::UnicodeNamed))
        }
        TokenKind::Octal => {
            let inner = tok.value.trim_start_matches("\\o{").trim_end_matches('}');
            let cp = if inner.is_empty() {
                0
            } else {
                u32::from_str_radix(inner, 8)
                    .map_err(|_| format!("invalid '\\o{{...}}' escape '{}'", tok.value))?
            };
            Ok((cp, CharLiteralKind::Octal))
        }
        TokenKind::OctalLegacy => {
            let digits = tok.value.trim_start_matches('\\');
            let cp = if digits.is_empty() {
                0
            } else {
                u32::from_str_radix(digits, 8)
                    .map_err(|_| format!("invalid octal escape '{}'", tok.value))?
            };
            Ok((cp, CharLiteralKind::OctalLegacy))
        }
        _ => unreachable!("decode_char_literal called on a non character-literal token"),
    }
}

fn decode_unicode_prop(tok: &Token, span: Span) -> UnicodeProp {
    let negated = tok.value.starts_with('P');
    let rest = &tok.value[1..];
    if let Some(stripped) = rest.strip_prefix('{') {
        let name = stripped.trim_end_matches('}').to_string();
        UnicodeProp {
            name,
            braced: true,
            negated,
            span,
        }
    } else {
        UnicodeProp {
            name: rest.to_string(),
            braced: false,
            negated,
            span,
        }
    }
}

fn decode_posix_class(value: &str) -> (String, bool) {
    if let Some(stripped) = value.strip_prefix('^') {
        (stripped.to_string(), true)
    } else {
        (value.to_string(), false)
    }
}

/// Epsilon exclusion: a quantifier's child may never be an epsilon
/// Literal, an empty Group, or a zero-width assertion/anchor/verb/keep —
/// there is nothing for repetition to act on.
fn is_quantifiable(atom: &Node) -> bool {
    match atom {
        Node::Literal(l) => !l.value.is_empty(),
        Node::Anchor(_) | Node::Assertion(_) | Node::PcreVerb(_) | Node::Keep(_) => false,
        Node::Group(g) => !g.child.is_epsilon(),
        _ => true,
    }
}

fn parse_quantifier_text(text: &str) -> Result<(QuantifierKind, i64, i64), String> {
    let (base, suffix) = if let Some(pos) = text.find('}') {
        (&text[..=pos], text[pos + 1..].chars().next())
    } else {
        (&text[..1], text[1..].chars().next())
    };

    let kind = match suffix {
        Some('?') => QuantifierKind::Lazy,
        Some('+') => QuantifierKind::Possessive,
        _ => QuantifierKind::Greedy,
    };

    let (min, max) = match base {
        "*" => (0, -1),
        "+" => (1, -1),
        "?" => (0, 1),
        b if b.starts_with('{') && b.ends_with('}') => {
            let inner = &b[1..b.len() - 1];
            if let Some((m, n)) = inner.split_once(',') {
                let m: i64 = m
                    .parse()
                    .map_err(|_| format!("invalid quantifier lower bound in '{{{inner}}}'"))?;
                if n.is_empty() {
                    (m, -1)
                } else {
                    let n: i64 = n
                        .parse()
                        .map_err(|_| format!("invalid quantifier upper bound in '{{{inner}}}'"))?;
                    (m, n)
                }
            } else {
                let m: i64 = inner
                    .parse()
                    .map_err(|_| format!("invalid quantifier bound in '{{{inner}}}'"))?;
                (m, m)
            }
        }
        other => return Err(format!("unrecognized quantifier '{other}'")),
    };

    Ok((kind, min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_default(body: &str) -> Node {
        parse_body(body, &Config::default()).unwrap()
    }

    #[test]
    fn literal_sequence_coalesces() {
        let node = parse_default("abc");
        match node {
            Node::Literal(l) => assert_eq!(l.value, "abc"),
            other => panic!("expected Literal, got {other:?}"),
        }
    }

    #[test]
    fn quantifier_binds_to_trailing_char_only() {
        let node = parse_default("abc*");
        let Node::Sequence(seq) = node else {
            panic!("expected Sequence");
        };
        assert_eq!(seq.children.len(), 2);
        match &seq.children[0] {
            Node::Literal(l) => assert_eq!(l.value, "ab"),
            other => panic!("expected Literal, got {other:?}"),
        }
        match &seq.children[1] {
            Node::Quantifier(q) => {
                assert_eq!(q.kind, QuantifierKind::Greedy);
                assert_eq!((q.min, q.max), (0, -1));
                match q.child.as_ref() {
                    Node::Literal(l) => assert_eq!(l.value, "c"),
                    other => panic!("expected Literal, got {other:?}"),
                }
            }
            other => panic!("expected Quantifier, got {other:?}"),
        }
    }

    #[test]
    fn lazy_and_possessive_suffixes() {
        let node = parse_default("a+?");
        let Node::Quantifier(q) = node else {
            panic!("expected Quantifier");
        };
        assert_eq!(q.kind, QuantifierKind::Lazy);
        assert_eq!((q.min, q.max), (1, -1));

        let node = parse_default("a*+");
        let Node::Quantifier(q) = node else {
            panic!("expected Quantifier");
        };
        assert_eq!(q.kind, QuantifierKind::Possessive);
    }

    #[test]
    fn brace_quantifier_bounds() {
        let node = parse_default("a{2,5}");
        let Node::Quantifier(q) = node else {
            panic!("expected Quantifier");
        };
        assert_eq!((q.min, q.max), (2, 5));
    }

    #[test]
    fn dangling_quantifier_is_an_error() {
        let err = parse_body("*abc", &Config::default()).unwrap_err();
        assert!(matches!(err.error, PcreError::QuantifierTarget(_)));
    }

    #[test]
    fn quantifier_on_word_boundary_is_rejected() {
        let err = parse_body(r"\b*", &Config::default()).unwrap_err();
        assert!(matches!(err.error, PcreError::QuantifierTarget(_)));
    }

    #[test]
    fn quantifier_on_anchor_is_rejected() {
        let err = parse_body("^*", &Config::default()).unwrap_err();
        assert!(matches!(err.error, PcreError::QuantifierTarget(_)));
    }

    #[test]
    fn quantifier_on_pcre_verb_is_rejected() {
        let err = parse_body("(*FAIL)*", &Config::default()).unwrap_err();
        assert!(matches!(err.error, PcreError::QuantifierTarget(_)));
    }

    #[test]
    fn quantifier_on_keep_is_rejected() {
        let err = parse_body(r"\K*", &Config::default()).unwrap_err();
        assert!(matches!(err.error, PcreError::QuantifierTarget(_)));
    }

    #[test]
    fn quantifier_on_empty_group_is_rejected() {
        let err = parse_body("()*", &Config::default()).unwrap_err();
        assert!(matches!(err.error, PcreError::QuantifierTarget(_)));
    }

    #[test]
    fn inline_r_modifier_is_accepted_by_default() {
        parse_body("(?r)a", &Config::default()).unwrap();
    }

    #[test]
    fn inline_r_modifier_is_rejected_on_older_target_runtime() {
        let config = Config::default()
            .with_feature_version(crate::config::FeatureVersion::Pcre2Before10_43);
        let err = parse_body("(?r)a", &config).unwrap_err();
        assert!(matches!(err.error, PcreError::UnknownGroupModifier(_)));
    }

    #[test]
    fn alternation_produces_alternatives() {
        let node = parse_default("a|b|c");
        let Node::Alternation(alt) = node else {
            panic!("expected Alternation");
        };
        assert_eq!(alt.alternatives.len(), 3);
    }

    #[test]
    fn plain_group_is_capturing() {
        let node = parse_default("(ab)");
        let Node::Group(g) = node else {
            panic!("expected Group");
        };
        assert_eq!(g.kind, GroupKind::Capturing);
    }

    #[test]
    fn named_group_angle_syntax() {
        let node = parse_default("(?<name>ab)");
        let Node::Group(g) = node else {
            panic!("expected Group");
        };
        assert_eq!(g.kind, GroupKind::Named);
        assert_eq!(g.name.as_deref(), Some("name"));
    }

    #[test]
    fn named_group_python_syntax() {
        let node = parse_default("(?P<name>ab)");
        let Node::Group(g) = node else {
            panic!("expected Group");
        };
        assert_eq!(g.kind, GroupKind::Named);
        assert_eq!(g.name.as_deref(), Some("name"));
    }

    #[test]
    fn non_capturing_and_atomic_groups() {
        let node = parse_default("(?:ab)");
        assert!(matches!(node, Node::Group(g) if g.kind == GroupKind::NonCapturing));
        let node = parse_default("(?>ab)");
        assert!(matches!(node, Node::Group(g) if g.kind == GroupKind::Atomic));
    }

    #[test]
    fn lookaround_variants() {
        assert!(matches!(
            parse_default("(?=ab)"),
            Node::Group(g) if g.kind == GroupKind::LookaheadPositive
        ));
        assert!(matches!(
            parse_default("(?!ab)"),
            Node::Group(g) if g.kind == GroupKind::LookaheadNegative
        ));
        assert!(matches!(
            parse_default("(?<=ab)"),
            Node::Group(g) if g.kind == GroupKind::LookbehindPositive
        ));
        assert!(matches!(
            parse_default("(?<!ab)"),
            Node::Group(g) if g.kind == GroupKind::LookbehindNegative
        ));
    }

    #[test]
    fn branch_reset_group() {
        let node = parse_default("(?|(a)|(b))");
        assert!(matches!(node, Node::Group(g) if g.kind == GroupKind::BranchReset));
    }

    #[test]
    fn inline_flags_with_no_body() {
        let node = parse_default("(?i)a");
        let Node::Sequence(seq) = node else {
            panic!("expected Sequence");
        };
        let Node::Group(g) = &seq.children[0] else {
            panic!("expected Group");
        };
        assert_eq!(g.kind, GroupKind::InlineFlags);
        assert_eq!(g.flags.as_ref().unwrap().set, "i");
    }

    #[test]
    fn modifier_span_sets_and_unsets() {
        let node = parse_default("(?i-m:ab)");
        let Node::Group(g) = node else {
            panic!("expected Group");
        };
        assert_eq!(g.kind, GroupKind::ModifierSpan);
        let flags = g.flags.unwrap();
        assert_eq!(flags.set, "i");
        assert_eq!(flags.unset, "m");
    }

    #[test]
    fn numeric_and_named_backreferences() {
        assert!(matches!(
            parse_default(r"(a)\1"),
            Node::Sequence(_)
        ));
        let node = parse_default(r"(?<n>a)\k<n>");
        let Node::Sequence(seq) = node else {
            panic!("expected Sequence");
        };
        let Node::Backref(b) = &seq.children[1] else {
            panic!("expected Backref");
        };
        assert_eq!(b.reference, BackrefRef::Name("n".to_string()));
    }

    #[test]
    fn g_reference_disambiguates_backref_vs_subroutine() {
        let node = parse_default(r"\g{1}");
        assert!(matches!(node, Node::Backref(b) if b.reference == BackrefRef::Index(1)));

        let node = parse_default(r"\g<1>");
        assert!(matches!(node, Node::Subroutine(s) if s.reference == SubroutineRef::Index(1)));
    }

    #[test]
    fn whole_pattern_recursion() {
        let node = parse_default("(?R)");
        assert!(matches!(
            node,
            Node::Subroutine(s) if s.reference == SubroutineRef::WholePattern
        ));
    }

    #[test]
    fn numbered_subroutine_call() {
        let node = parse_default("(?1)");
        assert!(matches!(node, Node::Subroutine(s) if s.reference == SubroutineRef::Index(1)));
        let node = parse_default("(?-1)");
        assert!(matches!(node, Node::Subroutine(s) if s.reference == SubroutineRef::Index(-1)));
    }

    #[test]
    fn conditional_on_group_index() {
        let node = parse_default("(?(1)a|b)");
        let Node::Conditional(c) = node else {
            panic!("expected Conditional");
        };
        assert_eq!(c.condition, ConditionKind::GroupIndex(1));
        assert!(c.no.is_some());
    }

    #[test]
    fn conditional_on_lookaround() {
        let node = parse_default("(?(?=a)b|c)");
        let Node::Conditional(c) = node else {
            panic!("expected Conditional");
        };
        assert!(matches!(c.condition, ConditionKind::Lookaround(_)));
    }

    #[test]
    fn define_group() {
        let node = parse_default("(?(DEFINE)(?<n>a))a");
        let Node::Sequence(seq) = node else {
            panic!("expected Sequence");
        };
        assert!(matches!(seq.children[0], Node::Define(_)));
    }

    #[test]
    fn callout_with_numeric_id() {
        let node = parse_default("(?C1)");
        assert!(matches!(node, Node::Callout(c) if c.identifier == CalloutId::Int(1)));
    }

    #[test]
    fn character_class_with_range_and_negation() {
        let node = parse_default("[^a-z0-9]");
        let Node::CharClass(cc) = node else {
            panic!("expected CharClass");
        };
        assert!(cc.negated);
        let ClassExpr::Parts(parts) = cc.body else {
            panic!("expected Parts");
        };
        assert_eq!(parts.len(), 2);
        assert!(matches!(parts[0], ClassPart::Range(_)));
    }

    #[test]
    fn character_class_intersection_and_subtraction() {
        let node = parse_default("[a-z&&aeiou]");
        let Node::CharClass(cc) = node else {
            panic!("expected CharClass");
        };
        assert!(matches!(
            cc.body,
            ClassExpr::Operation {
                kind: ClassOpKind::Intersection,
                ..
            }
        ));

        let node = parse_default("[a-z--aeiou]");
        let Node::CharClass(cc) = node else {
            panic!("expected CharClass");
        };
        assert!(matches!(cc.body, ClassExpr::Operation { kind: ClassOpKind::Subtraction, .. }));
    }

    #[test]
    fn posix_class_inside_brackets() {
        let node = parse_default("[[:alpha:]]");
        let Node::CharClass(cc) = node else {
            panic!("expected CharClass");
        };
        let ClassExpr::Parts(parts) = cc.body else {
            panic!("expected Parts");
        };
        assert!(matches!(&parts[0], ClassPart::Atom(ClassAtom::PosixClass(p)) if p.name == "alpha"));
    }

    #[test]
    fn pcre_verb_and_comment() {
        let node = parse_default("(*FAIL)");
        assert!(matches!(node, Node::PcreVerb(v) if v.name() == "FAIL"));

        let node = parse_default("(?#hello)a");
        let Node::Sequence(seq) = node else {
            panic!("expected Sequence");
        };
        assert!(matches!(&seq.children[0], Node::Comment(c) if c.text == "hello"));
    }

    #[test]
    fn comment_containing_brackets_does_not_corrupt_tokenization() {
        let node = parse_default("(?#a(b[c)d");
        let Node::Sequence(seq) = node else {
            panic!("expected Sequence");
        };
        assert!(matches!(&seq.children[0], Node::Comment(c) if c.text == "a(b[c"));
    }

    #[test]
    fn unterminated_group_is_an_error() {
        let err = parse_body("(ab", &Config::default()).unwrap_err();
        assert!(matches!(err.error, PcreError::Parser(_)));
    }

    #[test]
    fn recursion_limit_is_enforced() {
        let config = Config::default().with_max_recursion_depth(5);
        let deeply_nested = "(".repeat(10) + &")".repeat(10);
        let err = parse_body(&deeply_nested, &config).unwrap_err();
        assert!(matches!(err.error, PcreError::RecursionLimit(_)));
    }

    #[test]
    fn node_count_limit_is_enforced() {
        let config = Config::default().with_max_nodes(2);
        let err = parse_body("abcdef", &config).unwrap_err();
        assert!(matches!(err.error, PcreError::ResourceLimit(_)));
    }
}
