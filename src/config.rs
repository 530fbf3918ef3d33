//! Configuration surface consumed at [`crate::facade::Facade`] construction.

use crate::cache::PersistentStore;
use std::sync::Arc;

/// Gates grammar features that differ across PCRE/PHP runtime versions.
/// Named after PHP's own `phpVersionId`-style target identifier, the
/// concrete version axis this crate's feature gating tracks; `AcceptAll`
/// gates nothing and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureVersion {
    /// Accept every grammar feature this core knows how to parse.
    AcceptAll,
    /// Mimic a PCRE2 release older than 10.43: the inline `r` modifier is
    /// rejected as an unknown group modifier, and bare `\N` never widens to
    /// single-character negation semantics.
    Pcre2Before10_43,
}

impl Default for FeatureVersion {
    fn default() -> Self {
        FeatureVersion::AcceptAll
    }
}

impl FeatureVersion {
    pub fn allows_inline_r_modifier(self) -> bool {
        matches!(self, FeatureVersion::AcceptAll)
    }
}

/// How the [`crate::cache::ParseCache`] is backed.
pub enum CacheKind {
    /// Every `parse` reparses; no state is retained.
    NoOp,
    /// Layer-1 only: an in-process map, no layer-2 store.
    InMemory,
    /// Layer-1 plus a pluggable layer-2 persistent store.
    Persistent(Arc<dyn PersistentStore>),
}

impl Default for CacheKind {
    fn default() -> Self {
        CacheKind::InMemory
    }
}

/// A side-channel hook an implementer may wire up to sanity-check a parsed
/// pattern by actually running it against the target runtime. The core
/// never calls this itself outside of [`crate::facade::Facade::validate`],
/// which treats a positive result purely as additional validator evidence.
pub trait RuntimeValidationHook: Send + Sync {
    fn check(&self, pattern: &str, flags: &str) -> Result<(), String>;
}

/// Construction-time options for the facade and its parser/validator.
pub struct Config {
    /// Hard cap, in bytes, on an incoming delimited source string.
    pub max_pattern_length: usize,
    /// Validator cap, in codepoints, on a single lookbehind alternative.
    pub max_lookbehind_length: usize,
    /// Parser cap on recursive-descent depth.
    pub max_recursion_depth: usize,
    /// Parser cap on constructed AST node count.
    pub max_nodes: usize,
    /// Flag letters accepted by [`crate::splitter::split`].
    pub allowed_flags: &'static str,
    /// Flag letters accepted by inline `(?flags)` / `(?flags:...)`.
    pub allowed_inline_flags: &'static str,
    pub cache: CacheKind,
    /// Source strings the ReDoS profiler always reports as `Safe`.
    pub redos_ignored_patterns: Vec<String>,
    pub runtime_pcre_validation: Option<Arc<dyn RuntimeValidationHook>>,
    pub feature_version: FeatureVersion,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_pattern_length: 100_000,
            max_lookbehind_length: 255,
            max_recursion_depth: 200,
            max_nodes: 10_000,
            allowed_flags: "imsxADSUXJunr",
            allowed_inline_flags: "imsxUJnr",
            cache: CacheKind::default(),
            redos_ignored_patterns: Vec::new(),
            runtime_pcre_validation: None,
            feature_version: FeatureVersion::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pattern_length(mut self, n: usize) -> Self {
        self.max_pattern_length = n;
        self
    }

    pub fn with_max_lookbehind_length(mut self, n: usize) -> Self {
        self.max_lookbehind_length = n;
        self
    }

    pub fn with_max_recursion_depth(mut self, n: usize) -> Self {
        self.max_recursion_depth = n;
        self
    }

    pub fn with_max_nodes(mut self, n: usize) -> Self {
        self.max_nodes = n;
        self
    }

    pub fn with_cache(mut self, cache: CacheKind) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_redos_ignored_patterns(mut self, patterns: Vec<String>) -> Self {
        self.redos_ignored_patterns = patterns;
        self
    }

    pub fn with_feature_version(mut self, version: FeatureVersion) -> Self {
        self.feature_version = version;
        self
    }
}
