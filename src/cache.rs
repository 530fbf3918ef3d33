//! Two-layer parse cache: layer 1 is an in-process map guarded
//! by [`parking_lot::RwLock`], keyed by a fast non-cryptographic hash of the
//! pattern source, flags, and delimiter; layer 2 is an optional pluggable
//! [`PersistentStore`] for results that should survive past this process,
//! addressed by the same key and version-tagged so a store built by an
//! older release of this crate is never deserialized into the current
//! [`crate::ast::Node`] shape.

use crate::ast::{GroupNumbering, Node};
use crate::config::CacheKind;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The schema version stamped on every layer-2 payload. Bumped whenever
/// [`Node`] or [`GroupNumbering`] change shape in a way `serde` can't
/// paper over, so stale persisted entries are discarded instead of
/// failing to deserialize (or worse, deserializing into garbage).
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// A pluggable layer-2 store. Implementers own durability, eviction, and
/// cross-process sharing; this crate only ever calls `get`/`put` with an
/// opaque key and an opaque, already-serialized payload.
pub trait PersistentStore: Send + Sync {
    fn get(&self, key: u64) -> Option<Vec<u8>>;
    fn put(&self, key: u64, payload: Vec<u8>);
}

#[derive(Serialize, Deserialize)]
struct CachePayload {
    version: u32,
    pattern: Node,
    numbering: GroupNumbering,
}

/// A cached parse result, shared cheaply via `Arc` since both the pattern
/// tree and its numbering are immutable once computed.
#[derive(Clone)]
pub struct ParsedEntry {
    pub pattern: Arc<Node>,
    pub numbering: Arc<GroupNumbering>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWriteOutcome {
    Inserted,
    Replaced,
    /// The cache is [`CacheKind::NoOp`]; nothing was stored.
    Skipped,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub layer1_hits: u64,
    pub layer2_hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Default)]
struct Counters {
    layer1_hits: AtomicU64,
    layer2_hits: AtomicU64,
    misses: AtomicU64,
}

enum Backing {
    NoOp,
    Layered {
        layer1: RwLock<FxHashMap<u64, ParsedEntry>>,
        layer2: Option<Arc<dyn PersistentStore>>,
    },
}

pub struct ParseCache {
    backing: Backing,
    counters: Counters,
}

impl ParseCache {
    pub fn new(kind: &CacheKind) -> Self {
        let backing = match kind {
            CacheKind::NoOp => Backing::NoOp,
            CacheKind::InMemory => Backing::Layered {
                layer1: RwLock::new(FxHashMap::default()),
                layer2: None,
            },
            CacheKind::Persistent(store) => Backing::Layered {
                layer1: RwLock::new(FxHashMap::default()),
                layer2: Some(Arc::clone(store)),
            },
        };
        ParseCache {
            backing,
            counters: Counters::default(),
        }
    }

    /// Derive the cache key for a delimited pattern. `flags` and
    /// `delimiter` are folded in since the same body parses differently
    /// under different flags or delimiters (the `x` flag changes
    /// whitespace handling upstream in the splitter, for instance).
    pub fn compute_key(source: &str, flags: &str, delimiter: char) -> u64 {
        let mut hasher = FxHasher::default();
        source.hash(&mut hasher);
        flags.hash(&mut hasher);
        delimiter.hash(&mut hasher);
        hasher.finish()
    }

    pub fn get(&self, key: u64) -> Option<ParsedEntry> {
        let Backing::Layered { layer1, layer2 } = &self.backing else {
            return None;
        };

        if let Some(entry) = layer1.read().get(&key).cloned() {
            self.counters.layer1_hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry);
        }

        if let Some(store) = layer2 {
            if let Some(bytes) = store.get(key) {
                if let Ok(payload) = serde_json::from_slice::<CachePayload>(&bytes) {
                    if payload.version == CACHE_FORMAT_VERSION {
                        let entry = ParsedEntry {
                            pattern: Arc::new(payload.pattern),
                            numbering: Arc::new(payload.numbering),
                        };
                        layer1.write().insert(key, entry.clone());
                        self.counters.layer2_hits.fetch_add(1, Ordering::Relaxed);
                        return Some(entry);
                    }
                }
            }
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: u64, pattern: Node, numbering: GroupNumbering) -> CacheWriteOutcome {
        let Backing::Layered { layer1, layer2 } = &self.backing else {
            return CacheWriteOutcome::Skipped;
        };

        let entry = ParsedEntry {
            pattern: Arc::new(pattern),
            numbering: Arc::new(numbering),
        };

        if let Some(store) = layer2 {
            if let Ok(bytes) = serde_json::to_vec(&CachePayload {
                version: CACHE_FORMAT_VERSION,
                pattern: (*entry.pattern).clone(),
                numbering: (*entry.numbering).clone(),
            }) {
                store.put(key, bytes);
            }
        }

        let existed = layer1.write().insert(key, entry).is_some();
        if existed {
            CacheWriteOutcome::Replaced
        } else {
            CacheWriteOutcome::Inserted
        }
    }

    pub fn stats(&self) -> CacheStats {
        let entries = match &self.backing {
            Backing::NoOp => 0,
            Backing::Layered { layer1, .. } => layer1.read().len(),
        };
        CacheStats {
            layer1_hits: self.counters.layer1_hits.load(Ordering::Relaxed),
            layer2_hits: self.counters.layer2_hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            entries,
        }
    }

    pub fn clear(&self) {
        if let Backing::Layered { layer1, .. } = &self.backing {
            layer1.write().clear();
        }
    }
}
