//! The single entry point downstream collaborators are expected to use:
//! split, parse, number, and analyze a delimited PCRE source string, with
//! the two-layer cache transparently in front of the expensive
//! parse/number step.

use crate::analysis::{self, ComplexityReport, Problem, RedosReport};
use crate::ast::{GroupNumbering, LiteralSet, Node, Span};
use crate::cache::{ParseCache, ParsedEntry};
use crate::config::Config;
use crate::error::{PcreError, SourceError};
use crate::lexer::{self, Token};
use crate::numbering;
use crate::parser;
use crate::splitter;
use std::sync::Arc;

/// A fully parsed source string: the `Regex` tree, its capture numbering,
/// and the exact flag/delimiter/body triple it was split into.
pub struct Parsed {
    pub pattern: Arc<Node>,
    pub numbering: Arc<GroupNumbering>,
    pub body: String,
    pub flags: String,
    pub delimiter: char,
}

/// The result of [`Facade::parse_tolerant`]: a best-effort AST plus every
/// error encountered. On a clean parse `pattern` is the ordinary
/// `Regex`-wrapped tree and `errors` is empty; on failure `pattern` is a
/// single `Literal` holding the valid prefix up to the first error's
/// offset, and `errors` holds that one captured error.
pub struct TolerantParse {
    pub pattern: Node,
    pub errors: Vec<SourceError>,
    /// Set when the failure was a recursion- or node-count limit rather
    /// than a syntax error, so a caller can tell "this pattern is fine,
    /// just too large for the configured limits" apart from "this
    /// pattern is malformed".
    pub truncating_limit: Option<PcreError>,
}

pub struct Facade {
    config: Config,
    cache: ParseCache,
}

impl Facade {
    pub fn new(config: Config) -> Self {
        let cache = ParseCache::new(&config.cache);
        Facade { config, cache }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache_stats(&self) -> crate::cache::CacheStats {
        self.cache.stats()
    }

    /// Split, parse, and number a delimited source string (`/pattern/flags`),
    /// consulting the cache first.
    pub fn parse(&self, source: &str) -> Result<Parsed, SourceError> {
        let (body, flags, delimiter) = splitter::split(source, self.config.allowed_flags)?;
        self.parse_split(body, flags, delimiter)
    }

    /// Never fails: a bad delimiter, an unsupported flag, or a syntax or
    /// resource-limit error all fall back to a single `Literal` of the
    /// valid prefix, with the triggering error captured rather than
    /// propagated. The only surface in this crate that returns a partial
    /// result instead of `Result<_, SourceError>`.
    pub fn parse_tolerant(&self, source: &str) -> TolerantParse {
        match splitter::split(source, self.config.allowed_flags) {
            Err(err) => {
                let cut = err.offset.unwrap_or(0).min(source.len());
                TolerantParse {
                    pattern: Node::literal(&source[..cut], Span::new(0, cut)),
                    truncating_limit: None,
                    errors: vec![err],
                }
            }
            Ok((body, flags, delimiter)) => match self.parse_split(body.clone(), flags, delimiter) {
                Ok(parsed) => TolerantParse {
                    pattern: (*parsed.pattern).clone(),
                    errors: Vec::new(),
                    truncating_limit: None,
                },
                Err(err) => {
                    let cut = err.offset.unwrap_or(0).min(body.len());
                    let truncating_limit = match &err.error {
                        PcreError::RecursionLimit(_) | PcreError::ResourceLimit(_) => Some(err.error.clone()),
                        _ => None,
                    };
                    TolerantParse {
                        pattern: Node::literal(&body[..cut], Span::new(0, cut)),
                        errors: vec![err],
                        truncating_limit,
                    }
                }
            },
        }
    }

    fn parse_split(&self, body: String, flags: String, delimiter: char) -> Result<Parsed, SourceError> {
        let key = ParseCache::compute_key(&body, &flags, delimiter);
        if let Some(ParsedEntry { pattern, numbering }) = self.cache.get(key) {
            return Ok(Parsed {
                pattern,
                numbering,
                body,
                flags,
                delimiter,
            });
        }

        let pattern = parser::parse(&body, &flags, delimiter, &self.config)?;
        let numbering = numbering::collect(&pattern);
        self.cache.insert(key, pattern.clone(), numbering.clone());

        Ok(Parsed {
            pattern: Arc::new(pattern),
            numbering: Arc::new(numbering),
            body,
            flags,
            delimiter,
        })
    }

    /// Parse a bare pattern body with no surrounding delimiters or flags.
    pub fn parse_pattern(&self, body: &str) -> Result<Node, SourceError> {
        parser::parse_body(body, &self.config)
    }

    /// Tokenize a bare pattern body without building an AST.
    pub fn tokenize(&self, body: &str) -> Result<Vec<Token>, SourceError> {
        lexer::tokenize(body)
    }

    pub fn validate(&self, source: &str) -> Result<Vec<Problem>, SourceError> {
        let parsed = self.parse(source)?;
        let mut problems = analysis::validate(&parsed.pattern, &parsed.numbering, &self.config);
        if let Some(hook) = &self.config.runtime_pcre_validation {
            if let Err(message) = hook.check(&parsed.body, &parsed.flags) {
                problems.push(Problem {
                    severity: analysis::Severity::Warning,
                    code: "runtime-validation-failed",
                    message,
                    span: Span::point(0),
                    suggestion: None,
                });
            }
        }
        Ok(problems)
    }

    pub fn complexity(&self, source: &str) -> Result<ComplexityReport, SourceError> {
        let parsed = self.parse(source)?;
        Ok(analysis::complexity_score(&parsed.pattern))
    }

    pub fn literals(&self, source: &str) -> Result<LiteralSet, SourceError> {
        let parsed = self.parse(source)?;
        Ok(analysis::extract_literals(&parsed.pattern))
    }

    pub fn redos(&self, source: &str) -> Result<RedosReport, SourceError> {
        let parsed = self.parse(source)?;
        Ok(analysis::profile(&parsed.pattern, &parsed.body, &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_caches_on_second_call() {
        let facade = Facade::new(Config::default());
        facade.parse("/a+b/i").unwrap();
        facade.parse("/a+b/i").unwrap();
        assert_eq!(facade.cache_stats().layer1_hits, 1);
    }

    #[test]
    fn validate_flags_unknown_backref() {
        let facade = Facade::new(Config::default());
        let problems = facade.validate(r"/\1/").unwrap();
        assert!(problems.iter().any(|p| p.code == "unknown-group-reference"));
    }

    struct AlwaysFailsHook;
    impl crate::config::RuntimeValidationHook for AlwaysFailsHook {
        fn check(&self, _pattern: &str, _flags: &str) -> Result<(), String> {
            Err("runtime rejected this pattern".to_string())
        }
    }

    #[test]
    fn validate_surfaces_runtime_hook_failures() {
        let config = Config::default();
        let config = Config {
            runtime_pcre_validation: Some(Arc::new(AlwaysFailsHook)),
            ..config
        };
        let facade = Facade::new(config);
        let problems = facade.validate("/abc/").unwrap();
        assert!(problems.iter().any(|p| p.code == "runtime-validation-failed"));
    }

    #[test]
    fn literals_extracts_prefix() {
        let facade = Facade::new(Config::default());
        let set = facade.literals("/hello.*/").unwrap();
        assert_eq!(set.prefixes, vec!["hello"]);
    }

    #[test]
    fn redos_flags_nested_quantifiers() {
        let facade = Facade::new(Config::default());
        let report = facade.redos("/(a+)+/").unwrap();
        assert!(report.findings.iter().any(|f| f.code == "nested-repetition"));
    }

    #[test]
    fn parse_pattern_skips_delimiters() {
        let facade = Facade::new(Config::default());
        facade.parse_pattern("a+b").unwrap();
    }

    #[test]
    fn tokenize_returns_raw_tokens() {
        let facade = Facade::new(Config::default());
        let tokens = facade.tokenize("a+").unwrap();
        assert!(!tokens.is_empty());
    }

    #[test]
    fn tolerant_parse_of_clean_pattern_has_no_errors() {
        let facade = Facade::new(Config::default());
        let result = facade.parse_tolerant("/abc/");
        assert!(result.errors.is_empty());
        assert!(result.truncating_limit.is_none());
    }

    #[test]
    fn tolerant_parse_truncates_at_the_first_error() {
        let facade = Facade::new(Config::default());
        // Unterminated character class: the error lands right after "ab".
        let result = facade.parse_tolerant("/ab[cd/");
        assert_eq!(result.errors.len(), 1);
        match &result.pattern {
            Node::Literal(l) => assert_eq!(l.value, "ab"),
            other => panic!("expected a fallback Literal, got {other:?}"),
        }
    }

    #[test]
    fn tolerant_parse_reports_node_limit_as_truncating() {
        let config = Config::default().with_max_nodes(2);
        let facade = Facade::new(config);
        let result = facade.parse_tolerant("/abcdef/");
        assert!(result.truncating_limit.is_some());
    }
}
