use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::disk::DiskCache;
use crate::cache::frame_cache::{CachingClaims, FrameHashCache};
use crate::cache::hash::{FrameHash, FrameHasher};
use crate::foundation::rational::Rational;
use crate::render::job::{
    CacheEvent, FrameDependency, RenderJob, SchedulerMsg, WorkerCompletion, WorkerId,
};
use crate::render::params::{OperatingMode, VideoParams};
use crate::render::worker::{RenderWorker, WorkerConfig};
use crate::time::range::TimeRange;
use crate::time::range_list::TimeRangeList;

/// Tuning knobs for the scheduler.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// How far behind the playhead the dispatch window extends.
    pub cache_behind: Rational,
    /// How far ahead of the playhead the dispatch window extends.
    pub cache_ahead: Rational,
    /// When false, the whole invalidated set is dispatchable regardless of
    /// playhead position.
    pub limit_caching: bool,
    /// When true, `TimeReady` fires for render completions only when they
    /// resolve the playhead frame (by position or by matching its cached
    /// hash); other background fills stay silent until their artifact lands
    /// on disk.
    pub only_signal_last_frame: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            cache_behind: Rational::from(2),
            cache_ahead: Rational::from(10),
            limit_caching: true,
            only_signal_last_frame: true,
        }
    }
}

/// Single-writer render scheduler.
///
/// Owns the invalidation bookkeeping, the dispatch queue, the frame hash
/// cache, and the worker table. All mutation happens on the thread driving
/// this struct; workers and the disk cache talk back exclusively through the
/// inbox channel, drained by [`process_pending`](RenderScheduler::process_pending)
/// or [`process_next`](RenderScheduler::process_next).
pub struct RenderScheduler {
    config: SchedulerConfig,
    params: VideoParams,
    mode: OperatingMode,
    frame_cache: FrameHashCache,
    disk: Arc<dyn DiskCache>,
    events: Sender<CacheEvent>,
    inbox: Receiver<SchedulerMsg>,

    workers: Vec<Box<dyn RenderWorker>>,
    worker_busy: Vec<bool>,

    invalidated: TimeRangeListPair,
    render_job_info: HashMap<TimeRange, u64>,

    last_time_requested: Rational,
    sequence_length: Rational,
    next_job_time: u64,
    graph_version: u64,
    viewer: Option<u64>,
    queue_active: bool,
    warned_invalid: bool,
}

// The invalidated set and the playhead-windowed subset of it that is actually
// dispatchable. They always move together, so they live in one struct.
struct TimeRangeListPair {
    all: TimeRangeList,
    queue: TimeRangeList,
}

impl RenderScheduler {
    /// Create a scheduler with no workers and no connected viewer.
    ///
    /// `inbox` is the receiving half of the channel whose sender was handed
    /// to the disk cache manager and will be handed to spawned workers.
    pub fn new(
        cache_root: impl Into<PathBuf>,
        disk: Arc<dyn DiskCache>,
        events: Sender<CacheEvent>,
        inbox: Receiver<SchedulerMsg>,
        config: SchedulerConfig,
    ) -> RenderScheduler {
        RenderScheduler {
            config,
            params: VideoParams::default(),
            mode: OperatingMode::default(),
            frame_cache: FrameHashCache::new(cache_root),
            disk,
            events,
            inbox,
            workers: Vec::new(),
            worker_busy: Vec::new(),
            invalidated: TimeRangeListPair {
                all: TimeRangeList::new(),
                queue: TimeRangeList::new(),
            },
            render_job_info: HashMap::new(),
            last_time_requested: Rational::ZERO,
            sequence_length: Rational::ZERO,
            // Ticket 0 is reserved for "found already cached" events.
            next_job_time: 1,
            graph_version: 0,
            viewer: None,
            queue_active: false,
            warned_invalid: false,
        }
    }

    // ---- wiring ----------------------------------------------------------

    /// Register a worker and configure it with the current parameters.
    pub fn attach_worker(&mut self, mut worker: Box<dyn RenderWorker>) -> WorkerId {
        worker.configure(self.worker_config());
        self.workers.push(worker);
        self.worker_busy.push(false);
        WorkerId(self.workers.len() - 1)
    }

    /// Bind a viewer (identified by a stable id) and its sequence length.
    ///
    /// This changes the cache identity, which wipes the frame index; the
    /// caller is expected to follow up with an
    /// [`invalidate_cache`](RenderScheduler::invalidate_cache) covering
    /// whatever it wants re-rendered.
    pub fn connect_viewer(&mut self, viewer_id: u64, length: Rational) {
        self.viewer = Some(viewer_id);
        self.sequence_length = length;
        self.warned_invalid = false;
        self.regenerate_cache_id();
    }

    /// Detach the viewer. Pending work is cancelled and the cache identity
    /// reset; the on-disk artifacts are left alone.
    pub fn disconnect_viewer(&mut self) {
        self.viewer = None;
        self.cancel_queue();
        self.regenerate_cache_id();
    }

    /// The shared claim set, for spawning workers.
    pub fn claims(&self) -> Arc<CachingClaims> {
        self.frame_cache.claims()
    }

    /// Configuration to hand to a newly spawned worker.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            params: self.params,
            mode: self.mode,
            cache_root: self.frame_cache.cache_root().to_path_buf(),
        }
    }

    // ---- configuration ---------------------------------------------------

    /// Replace the render parameters.
    ///
    /// All pending work is cancelled first so that no in-flight completion
    /// cut against the old parameters can commit into the new cache identity.
    pub fn set_parameters(&mut self, params: VideoParams) {
        self.cancel_queue();
        self.params = params;
        self.warned_invalid = false;
        self.configure_workers();
        self.regenerate_cache_id();
    }

    /// Switch what workers do with each job. Refused while any job is in
    /// flight, because a mode switch mid-queue would leave completions the
    /// scheduler cannot classify.
    pub fn set_operating_mode(&mut self, mode: OperatingMode) {
        if !self.all_workers_available() {
            warn!("refusing operating mode change while jobs are in flight");
            return;
        }
        self.mode = mode;
        self.configure_workers();
    }

    /// See [`SchedulerConfig::only_signal_last_frame`].
    pub fn set_only_signal_last_frame(&mut self, v: bool) {
        self.config.only_signal_last_frame = v;
    }

    /// See [`SchedulerConfig::limit_caching`].
    pub fn set_limit_caching(&mut self, v: bool) {
        self.config.limit_caching = v;
        self.requeue();
    }

    fn configure_workers(&mut self) {
        let cfg = self.worker_config();
        for worker in &mut self.workers {
            worker.configure(cfg.clone());
        }
    }

    // ---- invalidation and queueing ---------------------------------------

    /// Mark `range` as no longer validly cached and schedule re-rendering of
    /// the part that falls inside the dispatch window.
    pub fn invalidate_cache(&mut self, range: TimeRange) {
        if !self.guard_can_render("invalidate_cache") {
            return;
        }

        // Clamp to the sequence; an invalidation entirely outside it is a
        // no-op rather than an error.
        if range.out_time() <= Rational::ZERO || range.in_time() >= self.sequence_length {
            return;
        }
        let clamped = TimeRange::new(
            range.in_time().max(Rational::ZERO),
            range.out_time().min(self.sequence_length),
        );
        if clamped.is_empty() {
            return;
        }

        self.invalidated.all.insert(clamped);
        self.emit(CacheEvent::RangeInvalidated(clamped));
        self.requeue();
    }

    /// Note that the upstream graph changed shape. Jobs already in flight
    /// were cut against the old graph and their results will be discarded.
    pub fn queue_recompile(&mut self) {
        self.graph_version += 1;
    }

    /// Cancel all queued (not yet dispatched) work and forget every
    /// outstanding job record, so in-flight completions land stale.
    pub fn cancel_queue(&mut self) {
        if !self.invalidated.queue.is_empty() || !self.render_job_info.is_empty() {
            debug!(
                queued = self.invalidated.queue.len(),
                in_flight = self.render_job_info.len(),
                "cancelling render queue"
            );
        }
        self.invalidated.queue.clear();
        self.render_job_info.clear();
    }

    /// Rebuild the dispatch queue from the invalidated set and the current
    /// playhead window, then dispatch to idle workers.
    fn requeue(&mut self) {
        if self.config.limit_caching {
            let window = TimeRange::new(
                (self.last_time_requested - self.config.cache_behind).max(Rational::ZERO),
                self.last_time_requested + self.config.cache_ahead,
            );
            self.invalidated.queue = self.invalidated.all.intersects(window);
        } else {
            self.invalidated.queue = self.invalidated.all.clone();
        }
        self.cache_next();
    }

    /// Pick the dispatchable frame closest to the playhead, remove it from
    /// both the queue and the invalidated set, and return its frame range.
    fn pop_next_frame_from_queue(&mut self) -> Option<TimeRange> {
        let tb = self.params.timebase;
        let probe = self.last_time_requested.snapped_to_timebase(tb);

        let mut best: Option<(Rational, Rational)> = None;
        for &range in self.invalidated.queue.iter() {
            let candidate = if probe >= range.in_time() && probe < range.out_time() {
                probe
            } else if probe < range.in_time() {
                // Aligned frame containing the range start. Snapping down
                // keeps the popped frame overlapping the range even when the
                // range starts mid-frame.
                range.in_time().snapped_to_timebase(tb)
            } else {
                // Last aligned frame starting inside the range.
                let mut c = range.out_time().snapped_to_timebase(tb);
                if c >= range.out_time() {
                    c = c - tb;
                }
                if c < range.in_time() {
                    c = range.in_time();
                }
                c
            };

            let dist = (candidate - probe).abs();
            // Strict comparison keeps the earlier candidate on ties.
            if best.is_none_or(|(d, _)| dist < d) {
                best = Some((dist, candidate));
            }

            if dist.is_zero() {
                break;
            }
        }

        let (_, time) = best?;
        let frame = TimeRange::new(time, time + tb);
        self.invalidated.queue.remove(frame);
        self.invalidated.all.remove(frame);
        Some(frame)
    }

    /// Dispatch queued frames to idle workers; signal `QueueComplete` when an
    /// active queue drains and every worker has gone idle.
    fn cache_next(&mut self) {
        if !self.can_render() {
            return;
        }

        for i in 0..self.workers.len() {
            if self.invalidated.queue.is_empty() {
                break;
            }
            if self.worker_busy[i] {
                continue;
            }
            let Some(frame) = self.pop_next_frame_from_queue() else {
                break;
            };

            let job_time = self.next_job_time;
            self.next_job_time += 1;
            self.render_job_info.insert(frame, job_time);
            self.worker_busy[i] = true;
            self.queue_active = true;

            let dep = FrameDependency {
                range: frame,
                graph_version: self.graph_version,
            };
            self.workers[i].accept_job(RenderJob { dep, job_time });
        }

        if self.queue_active && self.invalidated.queue.is_empty() && self.all_workers_available() {
            self.queue_active = false;
            self.emit(CacheEvent::QueueComplete);
        }
    }

    // ---- playback interface ----------------------------------------------

    /// Report the playhead at `time` and look the frame up in the cache.
    ///
    /// Returns the artifact path when the frame is durably cached; `None`
    /// re-centers the dispatch window on `time` either way, so a miss pulls
    /// rendering toward the playhead.
    pub fn get_cached_frame(&mut self, time: Rational) -> Option<PathBuf> {
        self.last_time_requested = time;

        if !self.guard_can_render("get_cached_frame") {
            return None;
        }

        self.requeue();

        let snapped = time.snapped_to_timebase(self.params.timebase);
        let hash = self.frame_cache.time_to_hash(snapped)?;
        if !self.frame_cache.has_hash(hash, self.params.format) {
            return None;
        }

        self.disk.accessed(hash);
        Some(self.frame_cache.cache_path_name(hash, self.params.format))
    }

    /// True iff the frame containing `time` is durably cached. Does not move
    /// the playhead.
    pub fn is_rendered(&self, time: Rational) -> bool {
        let snapped = time.snapped_to_timebase(self.params.timebase);
        self.frame_cache
            .time_to_hash(snapped)
            .is_some_and(|h| self.frame_cache.has_hash(h, self.params.format))
    }

    /// Shrink the sequence to `length`, dropping all cache state past it.
    pub fn truncate_frame_cache_length(&mut self, length: Rational) {
        let tail = TimeRange::new(length, Rational::MAX);
        self.frame_cache.truncate(length);
        self.invalidated.all.remove(tail);
        self.invalidated.queue.remove(tail);
        self.render_job_info.retain(|r, _| r.in_time() < length);
        self.sequence_length = length;

        // A playhead already past the new end has nothing left to wait for.
        if self.last_time_requested >= length {
            self.emit(CacheEvent::TimeReady {
                time: self.last_time_requested,
                job_time: 0,
            });
        }

        self.requeue();
    }

    // ---- inbox -----------------------------------------------------------

    /// Drain every message currently in the inbox. Returns the number of
    /// messages handled.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(msg) = self.inbox.try_recv() {
            self.handle_msg(msg);
            handled += 1;
        }
        handled
    }

    /// Block up to `timeout` for one inbox message. Returns whether a message
    /// was handled.
    pub fn process_next(&mut self, timeout: Duration) -> bool {
        match self.inbox.recv_timeout(timeout) {
            Ok(msg) => {
                self.handle_msg(msg);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn handle_msg(&mut self, msg: SchedulerMsg) {
        match msg {
            SchedulerMsg::Completion(c) => self.handle_completion(c),
            SchedulerMsg::Evicted(hash) => self.handle_evicted(hash),
        }
    }

    /// The disk cache deleted the artifact for `hash`: every timeline instant
    /// mapped to it loses its cache entry and becomes invalidated again.
    fn handle_evicted(&mut self, hash: FrameHash) {
        let times = self.frame_cache.take_frames_with_hash(hash);
        if times.is_empty() {
            return;
        }

        debug!(%hash, frames = times.len(), "cached artifact evicted");
        for t in times {
            let range = TimeRange::new(t, t + self.params.timebase);
            self.invalidated.all.insert(range);
            self.emit(CacheEvent::RangeInvalidated(range));
        }
        self.requeue();
    }

    fn handle_completion(&mut self, c: WorkerCompletion) {
        match c {
            WorkerCompletion::CompletedFrame {
                worker,
                dep,
                job_time,
                hash,
            } => {
                if self.job_is_current(dep, job_time) && self.should_signal(dep, hash) {
                    self.emit(CacheEvent::TimeReady {
                        time: dep.range.in_time(),
                        job_time,
                    });
                }

                // Without a download phase this is the job's terminal report.
                if !self.mode.downloads() {
                    self.set_frame_hash(dep, job_time, hash);
                    self.finish_job(worker, dep, job_time);
                }
            }
            WorkerCompletion::CompletedDownload {
                worker,
                dep,
                job_time,
                hash,
                artifact_written,
                artifact_path,
            } => {
                if self.set_frame_hash(dep, job_time, hash) && artifact_written {
                    let path = artifact_path
                        .unwrap_or_else(|| self.frame_cache.cache_path_name(hash, self.params.format));
                    self.disk.created_file(path, hash);

                    // Every instant deduplicated onto this artifact becomes
                    // ready at once.
                    for time in self.frame_cache.frames_with_hash(hash) {
                        self.emit(CacheEvent::TimeReady { time, job_time });
                    }
                }
                self.finish_job(worker, dep, job_time);
            }
            WorkerCompletion::HashAlreadyBeingCached {
                worker,
                dep,
                job_time,
                hash,
            } => {
                // The hash commits now; readiness arrives when the producing
                // job's artifact lands (its `frames_with_hash` sweep covers
                // this instant). If the producer finished in the meantime,
                // signal immediately.
                if self.set_frame_hash(dep, job_time, hash)
                    && self.frame_cache.has_hash(hash, self.params.format)
                {
                    self.emit(CacheEvent::TimeReady {
                        time: dep.range.in_time(),
                        job_time,
                    });
                }
                self.finish_job(worker, dep, job_time);
            }
            WorkerCompletion::HashAlreadyExists {
                worker,
                dep,
                job_time,
                hash,
            } => {
                if self.set_frame_hash(dep, job_time, hash) {
                    self.disk.accessed(hash);
                    self.emit(CacheEvent::TimeReady {
                        time: dep.range.in_time(),
                        job_time,
                    });
                }
                self.finish_job(worker, dep, job_time);
            }
        }
    }

    fn finish_job(&mut self, worker: WorkerId, dep: FrameDependency, job_time: u64) {
        if self.render_job_info.get(&dep.range) == Some(&job_time) {
            self.render_job_info.remove(&dep.range);
        }
        self.set_worker_busy(worker, false);
        self.cache_next();
    }

    // ---- staleness -------------------------------------------------------

    /// The staleness oracle: a completion may only commit when the graph has
    /// not recompiled since dispatch, the job record still carries this
    /// ticket, and the frame has not been queued again in the meantime.
    fn job_is_current(&self, dep: FrameDependency, job_time: u64) -> bool {
        dep.graph_version == self.graph_version
            && self.render_job_info.get(&dep.range) == Some(&job_time)
            && !self.time_is_queued(dep.range.in_time())
    }

    fn time_is_queued(&self, time: Rational) -> bool {
        self.invalidated
            .queue
            .contains_range(TimeRange::at(time), true, false)
    }

    /// The single choke point through which the time→hash index is written:
    /// commits iff the job is current.
    fn set_frame_hash(&mut self, dep: FrameDependency, job_time: u64, hash: FrameHash) -> bool {
        if !self.job_is_current(dep, job_time) {
            return false;
        }
        self.frame_cache.set_hash(dep.range.in_time(), hash);
        true
    }

    fn should_signal(&self, dep: FrameDependency, hash: FrameHash) -> bool {
        if !self.config.only_signal_last_frame {
            return true;
        }
        // The playhead frame itself, or a background frame whose content is
        // what the playhead frame resolves to anyway.
        let probe = self.last_time_requested.snapped_to_timebase(self.params.timebase);
        dep.range.in_time() == probe || self.frame_cache.time_to_hash(probe) == Some(hash)
    }

    // ---- identity --------------------------------------------------------

    /// Recompute the cache identity from the connected viewer and the render
    /// parameters. An identity change wipes the frame index.
    fn regenerate_cache_id(&mut self) {
        let id = match self.viewer {
            Some(viewer) if self.params.is_valid() => {
                let mut h = FrameHasher::new();
                h.write_u64(viewer);
                h.write_u32(self.params.width);
                h.write_u32(self.params.height);
                h.write_u32(self.params.divider);
                h.write_u8(self.params.format as u8);
                h.write_i64(self.params.timebase.num());
                h.write_i64(self.params.timebase.den());
                h.finish().to_hex()
            }
            _ => String::new(),
        };

        if id == self.frame_cache.cache_id() {
            return;
        }
        debug!(cache_id = %id, "cache identity changed");
        self.frame_cache.set_cache_id(id);
    }

    fn can_render(&self) -> bool {
        self.params.is_valid() && self.viewer.is_some() && !self.frame_cache.cache_id().is_empty()
    }

    fn guard_can_render(&mut self, op: &str) -> bool {
        if self.can_render() {
            return true;
        }
        if !self.warned_invalid {
            warn!(op, "ignoring request, no valid parameters or viewer connected");
            self.warned_invalid = true;
        }
        false
    }

    // ---- bookkeeping -----------------------------------------------------

    fn set_worker_busy(&mut self, worker: WorkerId, busy: bool) {
        if let Some(slot) = self.worker_busy.get_mut(worker.0) {
            *slot = busy;
        }
    }

    fn all_workers_available(&self) -> bool {
        !self.worker_busy.iter().any(|b| *b)
    }

    fn emit(&self, event: CacheEvent) {
        let _ = self.events.send(event);
    }

    // ---- accessors -------------------------------------------------------

    /// The frame hash cache.
    pub fn frame_cache(&self) -> &FrameHashCache {
        &self.frame_cache
    }

    /// Current cache identity; empty while parameters are invalid or no
    /// viewer is connected.
    pub fn cache_id(&self) -> &str {
        self.frame_cache.cache_id()
    }

    /// Current render parameters.
    pub fn params(&self) -> VideoParams {
        self.params
    }

    /// Current operating mode.
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Ranges currently known to be stale.
    pub fn invalidated(&self) -> &TimeRangeList {
        &self.invalidated.all
    }

    /// Ranges queued for dispatch (the windowed subset of the invalidated
    /// set).
    pub fn queued(&self) -> &TimeRangeList {
        &self.invalidated.queue
    }

    /// Current sequence length.
    pub fn sequence_length(&self) -> Rational {
        self.sequence_length
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scheduler.rs"]
mod tests;
