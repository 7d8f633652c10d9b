use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::cache::hash::FrameHash;
use crate::foundation::rational::Rational;
use crate::render::params::PixelFormat;

/// The set of hashes whose artifacts are being produced right now.
///
/// This is the one structure touched from worker threads (a worker must claim
/// a hash *before* doing the expensive render, and release it after), so it
/// lives behind its own mutex, isolated from the scheduler's single-threaded
/// state. `try_cache` is the atomic test-and-insert that guarantees at most
/// one concurrent producer per content hash.
#[derive(Debug, Default)]
pub struct CachingClaims {
    inner: Mutex<HashSet<FrameHash>>,
}

impl CachingClaims {
    /// Create an empty claim set.
    pub fn new() -> CachingClaims {
        CachingClaims::default()
    }

    /// Atomically test-and-insert. Returns true iff the caller is now
    /// responsible for producing `hash`.
    pub fn try_cache(&self, hash: FrameHash) -> bool {
        self.lock().insert(hash)
    }

    /// Release the production claim on `hash`. Called on completion, success
    /// or failure.
    pub fn release(&self, hash: FrameHash) {
        self.lock().remove(&hash);
    }

    /// True iff some worker currently holds the claim on `hash`.
    pub fn is_caching(&self, hash: FrameHash) -> bool {
        self.lock().contains(&hash)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<FrameHash>> {
        // A poisoned lock only means a worker panicked mid-claim; the set
        // itself is still coherent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Deterministic content-addressed artifact path:
/// `cache_root/<first byte hex>/<remaining bytes hex>.<ext>`.
///
/// Performs no IO; directory creation happens at artifact write time.
pub fn cache_path_name(cache_root: &Path, hash: FrameHash, format: PixelFormat) -> PathBuf {
    cache_root
        .join(hash.shard_hex())
        .join(format!("{}.{}", hash.tail_hex(), format.cache_ext()))
}

/// Bidirectional index between timeline instants and content hashes, plus
/// the in-flight claim set and disk path derivation.
///
/// The time→hash map is owned by the scheduler thread and never locked; only
/// [`CachingClaims`] is shared with workers.
#[derive(Debug)]
pub struct FrameHashCache {
    cache_root: PathBuf,
    cache_id: String,
    time_hash_map: BTreeMap<Rational, FrameHash>,
    claims: Arc<CachingClaims>,
}

impl FrameHashCache {
    /// Create an empty cache rooted at `cache_root`.
    pub fn new(cache_root: impl Into<PathBuf>) -> FrameHashCache {
        FrameHashCache {
            cache_root: cache_root.into(),
            cache_id: String::new(),
            time_hash_map: BTreeMap::new(),
            claims: Arc::new(CachingClaims::new()),
        }
    }

    /// Root directory of the on-disk cache.
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Identity of the current render configuration. Empty when invalid.
    pub fn cache_id(&self) -> &str {
        &self.cache_id
    }

    /// Swap the cache identity. Any change invalidates the whole index, so
    /// the cache is cleared first.
    pub fn set_cache_id(&mut self, id: impl Into<String>) {
        self.clear();
        self.cache_id = id.into();
    }

    /// Wipe the time index and the identity. In-flight claims stay put:
    /// a worker may still be writing its artifact, and dropping its claim
    /// here would let a second producer open the same path. Workers release
    /// their own claims on completion.
    pub fn clear(&mut self) {
        self.time_hash_map.clear();
        self.cache_id.clear();
    }

    /// Shared handle to the claim set, for handing to workers.
    pub fn claims(&self) -> Arc<CachingClaims> {
        Arc::clone(&self.claims)
    }

    /// Hash recorded for `time`, if any.
    pub fn time_to_hash(&self, time: Rational) -> Option<FrameHash> {
        self.time_hash_map.get(&time).copied()
    }

    /// Record `time → hash`. Last write wins.
    pub fn set_hash(&mut self, time: Rational, hash: FrameHash) {
        self.time_hash_map.insert(time, hash);
    }

    /// Drop every entry with `time >= at`. The sequence was shortened; disk
    /// artifacts are untouched, only the time index shrinks.
    pub fn truncate(&mut self, at: Rational) {
        let _ = self.time_hash_map.split_off(&at);
    }

    /// Atomically claim the right to produce `hash`.
    pub fn try_cache(&self, hash: FrameHash) -> bool {
        self.claims.try_cache(hash)
    }

    /// Release the production claim on `hash`.
    pub fn release(&self, hash: FrameHash) {
        self.claims.release(hash)
    }

    /// True iff `hash` is currently being produced by some worker.
    pub fn is_caching(&self, hash: FrameHash) -> bool {
        self.claims.is_caching(hash)
    }

    /// True iff a durable artifact for `hash` exists on disk and nobody is
    /// currently (re)producing it. A partial write is never reported as
    /// present.
    pub fn has_hash(&self, hash: FrameHash, format: PixelFormat) -> bool {
        self.cache_path_name(hash, format).exists() && !self.is_caching(hash)
    }

    /// Artifact path for `hash` under this cache's root.
    pub fn cache_path_name(&self, hash: FrameHash, format: PixelFormat) -> PathBuf {
        cache_path_name(&self.cache_root, hash, format)
    }

    /// Every timeline instant currently mapped to `hash`, ascending.
    pub fn frames_with_hash(&self, hash: FrameHash) -> Vec<Rational> {
        self.time_hash_map
            .iter()
            .filter(|(_, h)| **h == hash)
            .map(|(t, _)| *t)
            .collect()
    }

    /// Remove and return every timeline instant mapped to `hash`. Used when
    /// the artifact for `hash` is evicted and those instants must be
    /// re-rendered.
    pub fn take_frames_with_hash(&mut self, hash: FrameHash) -> Vec<Rational> {
        let times: Vec<Rational> = self.frames_with_hash(hash);
        for t in &times {
            self.time_hash_map.remove(t);
        }
        times
    }

    /// Number of indexed frames.
    pub fn len(&self) -> usize {
        self.time_hash_map.len()
    }

    /// True iff no frame is indexed.
    pub fn is_empty(&self) -> bool {
        self.time_hash_map.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/frame_cache.rs"]
mod tests;
