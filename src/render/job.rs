use std::path::PathBuf;

use crate::cache::hash::FrameHash;
use crate::foundation::rational::Rational;
use crate::time::range::TimeRange;

/// Index of a worker in the scheduler's worker table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkerId(pub usize);

/// What a frame's pixels depend on: the single-frame range to render and the
/// version of the upstream graph the job was cut against.
///
/// The graph version is carried through the whole job lifecycle so that a
/// completion arriving after `queue_recompile` can be recognized as stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameDependency {
    /// Single-frame range `[time, time + timebase)`.
    pub range: TimeRange,
    /// Upstream graph version at dispatch time.
    pub graph_version: u64,
}

/// One unit of work handed to a worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RenderJob {
    /// The frame to produce.
    pub dep: FrameDependency,
    /// Monotonic dispatch ticket; the scheduler keeps the latest ticket per
    /// range and discards completions carrying older ones.
    pub job_time: u64,
}

/// A worker's report back to the scheduler.
///
/// Dedup short-circuits produce a single `HashAlreadyBeingCached` or
/// `HashAlreadyExists`. A job that actually runs produces `CompletedFrame`
/// when the render phase ends, followed by `CompletedDownload` when the
/// worker's mode persists artifacts; otherwise `CompletedFrame` is terminal.
#[derive(Clone, Debug)]
pub enum WorkerCompletion {
    /// The frame was rendered (or the render attempt finished). Sent before
    /// any artifact write so the UI can show the frame without waiting on IO.
    CompletedFrame {
        /// Reporting worker.
        worker: WorkerId,
        /// Job identity.
        dep: FrameDependency,
        /// Dispatch ticket of the job.
        job_time: u64,
        /// Content hash of the frame.
        hash: FrameHash,
    },
    /// Terminal report: the job finished, including any artifact write.
    CompletedDownload {
        /// Reporting worker.
        worker: WorkerId,
        /// Job identity.
        dep: FrameDependency,
        /// Dispatch ticket of the job.
        job_time: u64,
        /// Content hash of the frame.
        hash: FrameHash,
        /// True iff a durable artifact was written for this job.
        artifact_written: bool,
        /// Path of the written artifact, when one was written.
        artifact_path: Option<PathBuf>,
    },
    /// Terminal report: another worker already holds the production claim for
    /// this hash; this job rendered nothing.
    HashAlreadyBeingCached {
        /// Reporting worker.
        worker: WorkerId,
        /// Job identity.
        dep: FrameDependency,
        /// Dispatch ticket of the job.
        job_time: u64,
        /// Content hash of the frame.
        hash: FrameHash,
    },
    /// Terminal report: a durable artifact for this hash already exists on
    /// disk; this job rendered nothing.
    HashAlreadyExists {
        /// Reporting worker.
        worker: WorkerId,
        /// Job identity.
        dep: FrameDependency,
        /// Dispatch ticket of the job.
        job_time: u64,
        /// Content hash of the frame.
        hash: FrameHash,
    },
}

impl WorkerCompletion {
    /// The reporting worker.
    pub fn worker(&self) -> WorkerId {
        match self {
            WorkerCompletion::CompletedFrame { worker, .. }
            | WorkerCompletion::CompletedDownload { worker, .. }
            | WorkerCompletion::HashAlreadyBeingCached { worker, .. }
            | WorkerCompletion::HashAlreadyExists { worker, .. } => *worker,
        }
    }

    /// The job this report belongs to.
    pub fn dep(&self) -> FrameDependency {
        match self {
            WorkerCompletion::CompletedFrame { dep, .. }
            | WorkerCompletion::CompletedDownload { dep, .. }
            | WorkerCompletion::HashAlreadyBeingCached { dep, .. }
            | WorkerCompletion::HashAlreadyExists { dep, .. } => *dep,
        }
    }

    /// Dispatch ticket of the reported job.
    pub fn job_time(&self) -> u64 {
        match self {
            WorkerCompletion::CompletedFrame { job_time, .. }
            | WorkerCompletion::CompletedDownload { job_time, .. }
            | WorkerCompletion::HashAlreadyBeingCached { job_time, .. }
            | WorkerCompletion::HashAlreadyExists { job_time, .. } => *job_time,
        }
    }

    /// Content hash of the reported frame.
    pub fn hash(&self) -> FrameHash {
        match self {
            WorkerCompletion::CompletedFrame { hash, .. }
            | WorkerCompletion::CompletedDownload { hash, .. }
            | WorkerCompletion::HashAlreadyBeingCached { hash, .. }
            | WorkerCompletion::HashAlreadyExists { hash, .. } => *hash,
        }
    }
}

/// Everything that can land in the scheduler's inbox: worker completions and
/// disk-cache evictions share one channel so the scheduler drains a single
/// receiver.
#[derive(Clone, Debug)]
pub enum SchedulerMsg {
    /// A worker finished (a phase of) a job.
    Completion(WorkerCompletion),
    /// The disk cache deleted the artifact for `hash`.
    Evicted(FrameHash),
}

/// Outbound notifications to the embedding application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheEvent {
    /// A range of the timeline is no longer validly cached.
    RangeInvalidated(TimeRange),
    /// The frame at `time` became available (rendered or already cached).
    TimeReady {
        /// The frame's timeline instant.
        time: Rational,
        /// Dispatch ticket of the job that produced it; 0 for frames found
        /// already cached.
        job_time: u64,
    },
    /// The dispatch queue drained and all workers are idle.
    QueueComplete,
}
