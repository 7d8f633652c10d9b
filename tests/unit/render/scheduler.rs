use super::*;

use std::sync::Mutex;
use std::sync::mpsc::channel;

use crate::render::params::PixelFormat;

struct ScriptedWorker {
    jobs: Arc<Mutex<Vec<RenderJob>>>,
}

impl RenderWorker for ScriptedWorker {
    fn accept_job(&mut self, job: RenderJob) {
        self.jobs.lock().unwrap().push(job);
    }

    fn configure(&mut self, _config: WorkerConfig) {}
}

#[derive(Default)]
struct RecordingDisk {
    accessed_log: Mutex<Vec<FrameHash>>,
    created_log: Mutex<Vec<(PathBuf, FrameHash)>>,
}

impl DiskCache for RecordingDisk {
    fn accessed(&self, hash: FrameHash) {
        self.accessed_log.lock().unwrap().push(hash);
    }

    fn created_file(&self, path: PathBuf, hash: FrameHash) {
        self.created_log.lock().unwrap().push((path, hash));
    }
}

struct Rig {
    sched: RenderScheduler,
    jobs: Arc<Mutex<Vec<RenderJob>>>,
    events: Receiver<CacheEvent>,
    inbox_tx: Sender<SchedulerMsg>,
    disk: Arc<RecordingDisk>,
    root: PathBuf,
}

impl Rig {
    fn take_jobs(&self) -> Vec<RenderJob> {
        std::mem::take(&mut *self.jobs.lock().unwrap())
    }

    fn drain_events(&self) -> Vec<CacheEvent> {
        let mut out = Vec::new();
        while let Ok(e) = self.events.try_recv() {
            out.push(e);
        }
        out
    }

    fn complete_download_on(
        &mut self,
        worker: WorkerId,
        job: RenderJob,
        hash: FrameHash,
        artifact_written: bool,
    ) {
        let path = artifact_written
            .then(|| self.sched.frame_cache().cache_path_name(hash, PixelFormat::Rgba32F));
        self.inbox_tx
            .send(SchedulerMsg::Completion(WorkerCompletion::CompletedDownload {
                worker,
                dep: job.dep,
                job_time: job.job_time,
                hash,
                artifact_written,
                artifact_path: path,
            }))
            .unwrap();
        self.sched.process_pending();
    }

    fn complete_download(&mut self, job: RenderJob, hash: FrameHash, artifact_written: bool) {
        self.complete_download_on(WorkerId(0), job, hash, artifact_written);
    }
}

// 1 fps timebase so frame indices are small integers.
fn rig(tag: &str, workers: usize) -> Rig {
    let root = std::env::temp_dir().join(format!(
        "prevue_scheduler_test_{tag}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    std::fs::create_dir_all(&root).unwrap();

    let (ev_tx, ev_rx) = channel();
    let (in_tx, in_rx) = channel();
    let disk = Arc::new(RecordingDisk::default());

    let mut sched = RenderScheduler::new(
        &root,
        Arc::clone(&disk) as Arc<dyn DiskCache>,
        ev_tx,
        in_rx,
        SchedulerConfig::default(),
    );

    let jobs = Arc::new(Mutex::new(Vec::new()));
    for _ in 0..workers {
        sched.attach_worker(Box::new(ScriptedWorker {
            jobs: Arc::clone(&jobs),
        }));
    }

    sched.set_parameters(VideoParams::new(
        64,
        64,
        PixelFormat::Rgba32F,
        Rational::from(1),
    ));
    sched.connect_viewer(1, Rational::from(100));

    Rig {
        sched,
        jobs,
        events: ev_rx,
        inbox_tx: in_tx,
        disk,
        root,
    }
}

fn r(a: i64, b: i64) -> TimeRange {
    TimeRange::new(Rational::from(a), Rational::from(b))
}

fn hash(byte: u8) -> FrameHash {
    FrameHash::from_bytes([byte; 16])
}

#[test]
fn connecting_a_viewer_establishes_a_cache_identity() {
    let mut rig = rig("identity", 0);
    let id = rig.sched.cache_id().to_string();
    assert!(!id.is_empty());

    // Different parameters, different identity.
    rig.sched.set_parameters(VideoParams::new(
        32,
        32,
        PixelFormat::Rgba32F,
        Rational::from(1),
    ));
    assert_ne!(rig.sched.cache_id(), id);

    rig.sched.disconnect_viewer();
    assert!(rig.sched.cache_id().is_empty());

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn operations_without_a_viewer_are_noops() {
    let root = std::env::temp_dir().join(format!(
        "prevue_scheduler_test_noviewer_{}",
        std::process::id()
    ));
    let (ev_tx, ev_rx) = channel();
    let (_in_tx, in_rx) = channel();
    let disk = Arc::new(RecordingDisk::default());
    let mut sched = RenderScheduler::new(
        &root,
        disk as Arc<dyn DiskCache>,
        ev_tx,
        in_rx,
        SchedulerConfig::default(),
    );

    sched.invalidate_cache(r(0, 10));
    assert!(sched.invalidated().is_empty());
    assert!(sched.get_cached_frame(Rational::from(1)).is_none());
    assert!(ev_rx.try_recv().is_err());
}

#[test]
fn invalidation_is_clamped_to_the_sequence() {
    let mut rig = rig("clamp", 0);

    rig.sched.invalidate_cache(r(-5, 3));
    rig.sched.invalidate_cache(r(98, 200));
    rig.sched.invalidate_cache(r(150, 160));

    let invalidated: Vec<TimeRange> = rig.sched.invalidated().iter().copied().collect();
    assert_eq!(invalidated, vec![r(0, 3), r(98, 100)]);

    let events = rig.drain_events();
    assert_eq!(
        events,
        vec![
            CacheEvent::RangeInvalidated(r(0, 3)),
            CacheEvent::RangeInvalidated(r(98, 100)),
        ]
    );

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn invalidation_dispatches_to_an_idle_worker() {
    let mut rig = rig("dispatch", 1);

    rig.sched.invalidate_cache(r(0, 3));

    let jobs = rig.take_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].dep.range, r(0, 1));
    assert_eq!(jobs[0].job_time, 1);
    assert_eq!(jobs[0].dep.graph_version, 0);

    // The popped frame left both the queue and the invalidated set.
    assert!(!rig.sched.invalidated().overlaps_with(r(0, 1), false, false));
    assert!(!rig.sched.queued().overlaps_with(r(0, 1), false, false));
    assert!(rig.sched.queued().overlaps_with(r(1, 3), false, false));

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn dispatch_prefers_the_frame_at_the_playhead() {
    let mut rig = rig("proximity", 1);

    let _ = rig.sched.get_cached_frame(Rational::from(5));
    rig.sched.invalidate_cache(r(0, 10));

    let jobs = rig.take_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].dep.range, r(5, 6));

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn dispatch_ties_resolve_to_the_earlier_frame() {
    let mut rig = rig("tie", 1);

    let _ = rig.sched.get_cached_frame(Rational::from(5));
    // Frames 4 and 6 are equidistant from the playhead at 5.
    rig.sched.invalidate_cache(r(4, 5));
    rig.sched.invalidate_cache(r(6, 7));

    let jobs = rig.take_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].dep.range, r(4, 5));

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn sub_frame_invalidation_dispatches_the_containing_frame() {
    let mut rig = rig("sub_frame", 1);

    // The stale sliver starts mid-frame, ahead of the playhead at 0.
    rig.sched
        .invalidate_cache(TimeRange::new(Rational::new(1, 2), Rational::from(1)));

    let jobs = rig.take_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].dep.range, r(0, 1));
    // Popping the containing frame consumed the sliver.
    assert!(rig.sched.queued().is_empty());
    rig.drain_events();

    rig.complete_download(jobs[0], hash(1), false);
    assert!(rig.sched.invalidated().is_empty());
    assert!(rig.take_jobs().is_empty());
    assert!(rig.drain_events().contains(&CacheEvent::QueueComplete));

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn dispatch_picks_the_nearer_of_two_ranges() {
    let mut rig = rig("nearer", 0);

    let _ = rig.sched.get_cached_frame(Rational::from(5));
    rig.sched.invalidate_cache(r(3, 4));
    rig.sched.invalidate_cache(r(8, 10));

    // Attach the worker only now, so both ranges are queued before any
    // dispatch happens.
    let jobs = Arc::clone(&rig.jobs);
    rig.sched.attach_worker(Box::new(ScriptedWorker { jobs }));
    let _ = rig.sched.get_cached_frame(Rational::from(5));

    let jobs = rig.take_jobs();
    assert_eq!(jobs.len(), 1);
    // Frame 3 (distance 2) beats frame 8 (distance 3).
    assert_eq!(jobs[0].dep.range, r(3, 4));

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn queueing_is_limited_to_the_playhead_window() {
    let mut rig = rig("window", 0);

    let _ = rig.sched.get_cached_frame(Rational::from(20));
    rig.sched.invalidate_cache(r(0, 100));

    // Default window: 2 behind, 10 ahead.
    let queued: Vec<TimeRange> = rig.sched.queued().iter().copied().collect();
    assert_eq!(queued, vec![r(18, 30)]);

    rig.sched.set_limit_caching(false);
    let queued: Vec<TimeRange> = rig.sched.queued().iter().copied().collect();
    assert_eq!(queued, vec![r(0, 100)]);

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn current_download_commits_hash_and_registers_artifact() {
    let mut rig = rig("commit", 1);

    rig.sched.invalidate_cache(r(0, 1));
    let job = rig.take_jobs().remove(0);
    rig.drain_events();

    rig.complete_download(job, hash(7), true);

    assert_eq!(
        rig.sched.frame_cache().time_to_hash(Rational::ZERO),
        Some(hash(7))
    );
    let created = rig.disk.created_log.lock().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].1, hash(7));

    let events = rig.drain_events();
    assert!(events.contains(&CacheEvent::TimeReady {
        time: Rational::ZERO,
        job_time: job.job_time,
    }));
    assert!(events.contains(&CacheEvent::QueueComplete));

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn completion_after_recompile_is_discarded() {
    let mut rig = rig("recompile", 1);

    rig.sched.invalidate_cache(r(0, 1));
    let job = rig.take_jobs().remove(0);

    rig.sched.queue_recompile();
    rig.complete_download(job, hash(7), true);

    assert_eq!(rig.sched.frame_cache().time_to_hash(Rational::ZERO), None);
    assert!(rig.disk.created_log.lock().unwrap().is_empty());

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn completion_of_a_requeued_frame_is_discarded_and_frame_redispatched() {
    let mut rig = rig("requeued", 1);

    rig.sched.invalidate_cache(r(0, 1));
    let job = rig.take_jobs().remove(0);

    // The frame goes stale while the job is in flight.
    rig.sched.invalidate_cache(r(0, 1));
    rig.complete_download(job, hash(7), true);

    // The stale result was not committed...
    assert_eq!(rig.sched.frame_cache().time_to_hash(Rational::ZERO), None);
    // ...and freeing the worker immediately redispatched the frame with a
    // fresh ticket.
    let jobs = rig.take_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].dep.range, r(0, 1));
    assert!(jobs[0].job_time > job.job_time);

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn completion_after_cancel_queue_is_discarded() {
    let mut rig = rig("cancelled", 1);

    rig.sched.invalidate_cache(r(0, 1));
    let job = rig.take_jobs().remove(0);

    rig.sched.cancel_queue();
    rig.complete_download(job, hash(7), true);

    assert_eq!(rig.sched.frame_cache().time_to_hash(Rational::ZERO), None);

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn completion_after_parameter_change_is_discarded() {
    let mut rig = rig("params_mid_flight", 1);

    rig.sched.invalidate_cache(r(0, 1));
    let job = rig.take_jobs().remove(0);

    rig.sched.set_parameters(VideoParams::new(
        128,
        128,
        PixelFormat::Rgba32F,
        Rational::from(1),
    ));
    rig.complete_download(job, hash(7), true);

    assert!(rig.sched.frame_cache().is_empty());
    assert!(rig.disk.created_log.lock().unwrap().is_empty());

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn existing_hash_completion_touches_lru_and_signals() {
    let mut rig = rig("already_exists", 1);

    rig.sched.invalidate_cache(r(0, 1));
    let job = rig.take_jobs().remove(0);
    rig.drain_events();

    rig.inbox_tx
        .send(SchedulerMsg::Completion(WorkerCompletion::HashAlreadyExists {
            worker: WorkerId(0),
            dep: job.dep,
            job_time: job.job_time,
            hash: hash(9),
        }))
        .unwrap();
    rig.sched.process_pending();

    assert_eq!(
        rig.sched.frame_cache().time_to_hash(Rational::ZERO),
        Some(hash(9))
    );
    assert_eq!(*rig.disk.accessed_log.lock().unwrap(), vec![hash(9)]);
    assert!(rig.drain_events().contains(&CacheEvent::TimeReady {
        time: Rational::ZERO,
        job_time: job.job_time,
    }));

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn deduplicated_frames_become_ready_when_the_producer_lands() {
    let mut rig = rig("dedup", 2);

    rig.sched.invalidate_cache(r(0, 2));
    let jobs = rig.take_jobs();
    assert_eq!(jobs.len(), 2);
    rig.drain_events();

    // Frame 1 loses the claim race against frame 0's identical content.
    rig.inbox_tx
        .send(SchedulerMsg::Completion(
            WorkerCompletion::HashAlreadyBeingCached {
                worker: WorkerId(1),
                dep: jobs[1].dep,
                job_time: jobs[1].job_time,
                hash: hash(5),
            },
        ))
        .unwrap();
    rig.sched.process_pending();

    // The hash committed, but nothing is ready yet.
    assert_eq!(
        rig.sched.frame_cache().time_to_hash(Rational::from(1)),
        Some(hash(5))
    );
    assert!(rig.drain_events().iter().all(|e| !matches!(e, CacheEvent::TimeReady { .. })));

    // The producing job's artifact lands; both instants become ready.
    rig.complete_download(jobs[0].clone(), hash(5), true);
    let ready: Vec<Rational> = rig
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            CacheEvent::TimeReady { time, .. } => Some(time),
            _ => None,
        })
        .collect();
    assert_eq!(ready, vec![Rational::from(0), Rational::from(1)]);

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn eviction_reinvalidates_every_frame_sharing_the_artifact() {
    let mut rig = rig("eviction", 2);

    rig.sched.invalidate_cache(r(0, 2));
    let jobs = rig.take_jobs();
    rig.complete_download_on(WorkerId(0), jobs[0], hash(4), false);
    rig.complete_download_on(WorkerId(1), jobs[1], hash(4), false);
    rig.drain_events();

    rig.inbox_tx.send(SchedulerMsg::Evicted(hash(4))).unwrap();
    rig.sched.process_pending();

    assert_eq!(rig.sched.frame_cache().time_to_hash(Rational::from(0)), None);
    assert_eq!(rig.sched.frame_cache().time_to_hash(Rational::from(1)), None);

    let events = rig.drain_events();
    assert!(events.contains(&CacheEvent::RangeInvalidated(r(0, 1))));
    assert!(events.contains(&CacheEvent::RangeInvalidated(r(1, 2))));

    // The frames went straight back into dispatch.
    let jobs = rig.take_jobs();
    assert_eq!(jobs.len(), 2);

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn eviction_of_an_unknown_hash_is_noop() {
    let mut rig = rig("eviction_unknown", 0);

    rig.inbox_tx.send(SchedulerMsg::Evicted(hash(9))).unwrap();
    assert_eq!(rig.sched.process_pending(), 1);
    assert!(rig.drain_events().is_empty());

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn truncation_drops_state_past_the_new_end() {
    let mut rig = rig("truncate", 1);

    rig.sched.invalidate_cache(r(0, 1));
    let job = rig.take_jobs().remove(0);
    rig.complete_download(job, hash(3), false);

    let _ = rig.sched.get_cached_frame(Rational::from(0));
    rig.sched.invalidate_cache(r(4, 8));
    rig.drain_events();

    rig.sched.truncate_frame_cache_length(Rational::from(5));

    assert_eq!(rig.sched.sequence_length(), Rational::from(5));
    assert_eq!(
        rig.sched.frame_cache().time_to_hash(Rational::ZERO),
        Some(hash(3))
    );
    let invalidated: Vec<TimeRange> = rig.sched.invalidated().iter().copied().collect();
    // [4,8) shrank to [4,5), minus whatever was already dispatched.
    assert!(invalidated.iter().all(|i| i.out_time() <= Rational::from(5)));

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn truncation_before_the_playhead_signals_ready() {
    let mut rig = rig("truncate_playhead", 0);

    let _ = rig.sched.get_cached_frame(Rational::from(50));
    rig.drain_events();

    rig.sched.truncate_frame_cache_length(Rational::from(10));
    assert!(rig.drain_events().contains(&CacheEvent::TimeReady {
        time: Rational::from(50),
        job_time: 0,
    }));

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn get_cached_frame_returns_path_for_durable_frames() {
    let mut rig = rig("lookup", 1);

    rig.sched.invalidate_cache(r(0, 1));
    let job = rig.take_jobs().remove(0);
    rig.complete_download(job, hash(8), true);

    // Misses: no artifact on disk yet.
    assert!(rig.sched.get_cached_frame(Rational::from(0)).is_none());

    let path = rig
        .sched
        .frame_cache()
        .cache_path_name(hash(8), PixelFormat::Rgba32F);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"pixels").unwrap();

    rig.disk.accessed_log.lock().unwrap().clear();
    // Mid-frame times snap to the frame start.
    assert_eq!(
        rig.sched.get_cached_frame(Rational::new(1, 2)),
        Some(path.clone())
    );
    assert!(rig.sched.is_rendered(Rational::new(1, 2)));
    assert_eq!(*rig.disk.accessed_log.lock().unwrap(), vec![hash(8)]);

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn queue_complete_fires_once_after_the_queue_drains() {
    let mut rig = rig("queue_complete", 1);

    rig.sched.invalidate_cache(r(0, 2));
    let first = rig.take_jobs().remove(0);
    rig.complete_download(first, hash(1), false);

    assert!(!rig.drain_events().contains(&CacheEvent::QueueComplete));

    let second = rig.take_jobs().remove(0);
    assert_eq!(second.dep.range, r(1, 2));
    rig.complete_download(second, hash(2), false);

    let events = rig.drain_events();
    assert_eq!(
        events.iter().filter(|e| **e == CacheEvent::QueueComplete).count(),
        1
    );

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn mode_change_is_refused_while_jobs_are_in_flight() {
    let mut rig = rig("mode_change", 1);

    rig.sched.invalidate_cache(r(0, 1));
    let job = rig.take_jobs().remove(0);

    rig.sched.set_operating_mode(OperatingMode::HASH_ONLY);
    assert_eq!(rig.sched.mode(), OperatingMode::FULL);

    rig.complete_download(job, hash(1), false);
    rig.sched.set_operating_mode(OperatingMode::HASH_ONLY);
    assert_eq!(rig.sched.mode(), OperatingMode::HASH_ONLY);

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn without_download_phase_completed_frame_is_terminal() {
    let mut rig = rig("no_download", 1);
    rig.sched.set_operating_mode(OperatingMode::RENDER_AND_HASH);

    rig.sched.invalidate_cache(r(0, 2));
    let job = rig.take_jobs().remove(0);
    rig.drain_events();

    rig.inbox_tx
        .send(SchedulerMsg::Completion(WorkerCompletion::CompletedFrame {
            worker: WorkerId(0),
            dep: job.dep,
            job_time: job.job_time,
            hash: hash(6),
        }))
        .unwrap();
    rig.sched.process_pending();

    // Hash committed, worker freed, next frame dispatched.
    assert_eq!(
        rig.sched.frame_cache().time_to_hash(Rational::ZERO),
        Some(hash(6))
    );
    // Playhead sits at frame 0, so its completion is signalled.
    assert!(rig.drain_events().contains(&CacheEvent::TimeReady {
        time: Rational::ZERO,
        job_time: job.job_time,
    }));
    assert_eq!(rig.take_jobs().len(), 1);

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn background_render_completions_stay_silent_at_the_playhead_setting() {
    let mut rig = rig("signal_last", 2);
    rig.sched.set_operating_mode(OperatingMode::RENDER_AND_HASH);

    rig.sched.invalidate_cache(r(0, 2));
    let jobs = rig.take_jobs();
    rig.drain_events();

    // Playhead is at 0; frame 1 is a background fill.
    let background = jobs.iter().find(|j| j.dep.range == r(1, 2)).unwrap();
    rig.inbox_tx
        .send(SchedulerMsg::Completion(WorkerCompletion::CompletedFrame {
            worker: WorkerId(1),
            dep: background.dep,
            job_time: background.job_time,
            hash: hash(2),
        }))
        .unwrap();
    rig.sched.process_pending();
    assert!(
        rig.drain_events()
            .iter()
            .all(|e| !matches!(e, CacheEvent::TimeReady { .. }))
    );

    // With the setting off, every completion signals.
    rig.sched.set_only_signal_last_frame(false);
    let playhead = jobs.iter().find(|j| j.dep.range == r(0, 1)).unwrap();
    rig.inbox_tx
        .send(SchedulerMsg::Completion(WorkerCompletion::CompletedFrame {
            worker: WorkerId(0),
            dep: playhead.dep,
            job_time: playhead.job_time,
            hash: hash(1),
        }))
        .unwrap();
    rig.sched.process_pending();
    assert!(rig.drain_events().contains(&CacheEvent::TimeReady {
        time: Rational::ZERO,
        job_time: playhead.job_time,
    }));

    std::fs::remove_dir_all(&rig.root).unwrap();
}

#[test]
fn background_completion_matching_the_playhead_content_signals() {
    let mut rig = rig("signal_same_hash", 2);
    rig.sched.set_operating_mode(OperatingMode::RENDER_AND_HASH);

    rig.sched.invalidate_cache(r(0, 2));
    let jobs = rig.take_jobs();

    // The playhead frame commits its hash first.
    let playhead = jobs.iter().find(|j| j.dep.range == r(0, 1)).unwrap();
    rig.inbox_tx
        .send(SchedulerMsg::Completion(WorkerCompletion::CompletedFrame {
            worker: WorkerId(0),
            dep: playhead.dep,
            job_time: playhead.job_time,
            hash: hash(4),
        }))
        .unwrap();
    rig.sched.process_pending();
    rig.drain_events();

    // The background frame rendered identical content, so its completion is
    // also the playhead frame landing; it signals despite being off-playhead.
    let background = jobs.iter().find(|j| j.dep.range == r(1, 2)).unwrap();
    rig.inbox_tx
        .send(SchedulerMsg::Completion(WorkerCompletion::CompletedFrame {
            worker: WorkerId(1),
            dep: background.dep,
            job_time: background.job_time,
            hash: hash(4),
        }))
        .unwrap();
    rig.sched.process_pending();
    assert!(rig.drain_events().contains(&CacheEvent::TimeReady {
        time: Rational::from(1),
        job_time: background.job_time,
    }));

    std::fs::remove_dir_all(&rig.root).unwrap();
}
