use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::mpsc::Sender;

use tracing::warn;

use crate::cache::hash::FrameHash;
use crate::render::job::SchedulerMsg;

/// The narrow disk-cache surface the scheduler depends on.
///
/// The scheduler only ever touches artifacts it knows about ("this hash was
/// just read", "this artifact was just written"); it never deletes. Eviction
/// is entirely the manager's decision and flows back into the scheduler as a
/// [`SchedulerMsg::Evicted`] message.
pub trait DiskCache: Send + Sync {
    /// Mark the artifact for `hash` as most recently used.
    fn accessed(&self, hash: FrameHash);

    /// Register a newly written artifact so it participates in eviction.
    fn created_file(&self, path: PathBuf, hash: FrameHash);
}

struct DiskEntry {
    path: PathBuf,
    hash: FrameHash,
    size: u64,
}

struct DiskState {
    // Ordered least- to most-recently used; `accessed` moves entries to the
    // back, eviction takes from the front.
    entries: Vec<DiskEntry>,
    consumption: u64,
}

/// Byte-budgeted LRU over cached artifacts.
///
/// Shared between the scheduler (registration, touch) and any other consumer
/// of the cache directory, so all state sits behind one mutex. Eviction
/// notifications are sent after the lock is released.
pub struct DiskCacheManager {
    limit_bytes: u64,
    notify: Mutex<Sender<SchedulerMsg>>,
    state: Mutex<DiskState>,
}

impl DiskCacheManager {
    /// Create a manager with a total byte budget. `notify` is the scheduler
    /// inbox that receives eviction messages.
    pub fn new(limit_bytes: u64, notify: Sender<SchedulerMsg>) -> DiskCacheManager {
        DiskCacheManager {
            limit_bytes,
            notify: Mutex::new(notify),
            state: Mutex::new(DiskState {
                entries: Vec::new(),
                consumption: 0,
            }),
        }
    }

    /// Bytes currently attributed to tracked artifacts.
    pub fn consumption(&self) -> u64 {
        self.lock_state().consumption
    }

    /// Delete every tracked artifact, notifying an eviction for each.
    pub fn clear_disk_cache(&self) -> bool {
        let mut evicted = Vec::new();
        let mut all_deleted = true;

        {
            let mut state = self.lock_state();
            let mut kept = Vec::new();

            for entry in state.entries.drain(..) {
                match fs::remove_file(&entry.path) {
                    Ok(()) => evicted.push(entry.hash),
                    Err(e) => {
                        warn!(path = %entry.path.display(), error = %e, "failed to delete cached frame");
                        all_deleted = false;
                        kept.push(entry);
                    }
                }
            }

            state.consumption = kept.iter().map(|e| e.size).sum();
            state.entries = kept;
        }

        self.send_evictions(evicted);
        all_deleted
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, DiskState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn send_evictions(&self, hashes: Vec<FrameHash>) {
        let notify = self.notify.lock().unwrap_or_else(|e| e.into_inner());
        for hash in hashes {
            let _ = notify.send(SchedulerMsg::Evicted(hash));
        }
    }
}

impl DiskCache for DiskCacheManager {
    fn accessed(&self, hash: FrameHash) {
        let mut state = self.lock_state();

        if let Some(idx) = state.entries.iter().rposition(|e| e.hash == hash) {
            let entry = state.entries.remove(idx);
            state.entries.push(entry);
        }
    }

    fn created_file(&self, path: PathBuf, hash: FrameHash) {
        let mut evicted = Vec::new();

        {
            let mut state = self.lock_state();

            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            state.entries.push(DiskEntry { path, hash, size });
            state.consumption += size;

            while state.consumption > self.limit_bytes && !state.entries.is_empty() {
                let least_recent = state.entries.remove(0);
                if let Err(e) = fs::remove_file(&least_recent.path) {
                    warn!(path = %least_recent.path.display(), error = %e, "failed to delete cached frame");
                }
                state.consumption -= least_recent.size;
                evicted.push(least_recent.hash);
            }
        }

        self.send_evictions(evicted);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/disk.rs"]
mod tests;
