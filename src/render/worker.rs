use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::cache::frame_cache::{CachingClaims, cache_path_name};
use crate::cache::hash::{FrameHash, FrameHasher};
use crate::foundation::error::PrevueResult;
use crate::render::job::{FrameDependency, RenderJob, SchedulerMsg, WorkerCompletion, WorkerId};
use crate::render::params::{OperatingMode, VideoParams};

/// Configuration a worker needs to process jobs: what to render, what to do
/// with the result, and where artifacts live.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Render parameters folded into every frame hash.
    pub params: VideoParams,
    /// Which phases each job runs.
    pub mode: OperatingMode,
    /// Root of the on-disk artifact cache.
    pub cache_root: PathBuf,
}

/// A rendered frame's raw bytes, already encoded for the cache container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFrame {
    /// Encoded artifact bytes, written to disk verbatim.
    pub data: Vec<u8>,
}

/// The rendering engine a worker drives. Implementations own the upstream
/// graph traversal; the cache layer only needs two things from them.
pub trait FrameRenderer: Send {
    /// Digest everything upstream that influences the frame's pixels into
    /// `hasher`. Render parameters and the frame time are fed by the caller.
    fn hash_frame(&mut self, dep: FrameDependency, hasher: &mut FrameHasher);

    /// Produce the frame. `Ok(None)` means the frame legitimately has no
    /// content (an empty timeline region); errors are treated the same way
    /// after logging.
    fn render_frame(&mut self, dep: FrameDependency) -> PrevueResult<Option<RenderedFrame>>;
}

/// Scheduler-facing handle to a worker. The scheduler never blocks on a
/// worker; both operations hand a message to the worker's own queue.
pub trait RenderWorker: Send {
    /// Queue a job. The worker reports back through the scheduler inbox.
    fn accept_job(&mut self, job: RenderJob);

    /// Replace the worker's configuration for subsequent jobs.
    fn configure(&mut self, config: WorkerConfig);
}

enum WorkerMsg {
    Job(RenderJob),
    Configure(WorkerConfig),
    Shutdown,
}

/// A [`RenderWorker`] running a [`FrameRenderer`] on its own thread.
///
/// Jobs arrive over an internal channel and reports leave through the shared
/// scheduler inbox, so a slow render never blocks the scheduler. Dropping the
/// handle shuts the thread down and joins it.
pub struct ThreadWorker {
    tx: Sender<WorkerMsg>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadWorker {
    /// Spawn a worker thread around `renderer`.
    ///
    /// `claims` must be the claim set of the scheduler's frame cache so that
    /// the at-most-one-producer guarantee spans all workers, and
    /// `completions` its inbox sender.
    pub fn spawn<R: FrameRenderer + 'static>(
        id: WorkerId,
        renderer: R,
        claims: Arc<CachingClaims>,
        completions: Sender<SchedulerMsg>,
        config: WorkerConfig,
    ) -> ThreadWorker {
        let (tx, rx) = channel();
        let handle = std::thread::spawn(move || {
            worker_loop(id, renderer, claims, completions, config, rx);
        });

        ThreadWorker {
            tx,
            handle: Some(handle),
        }
    }
}

impl RenderWorker for ThreadWorker {
    fn accept_job(&mut self, job: RenderJob) {
        let _ = self.tx.send(WorkerMsg::Job(job));
    }

    fn configure(&mut self, config: WorkerConfig) {
        let _ = self.tx.send(WorkerMsg::Configure(config));
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(WorkerMsg::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_loop<R: FrameRenderer>(
    id: WorkerId,
    mut renderer: R,
    claims: Arc<CachingClaims>,
    completions: Sender<SchedulerMsg>,
    mut config: WorkerConfig,
    rx: Receiver<WorkerMsg>,
) {
    while let Ok(msg) = rx.recv() {
        match msg {
            WorkerMsg::Job(job) => {
                run_job(id, &mut renderer, &claims, &completions, &config, job);
            }
            WorkerMsg::Configure(new_config) => config = new_config,
            WorkerMsg::Shutdown => break,
        }
    }
    debug!(worker = id.0, "worker thread exiting");
}

fn hash_job<R: FrameRenderer>(
    renderer: &mut R,
    config: &WorkerConfig,
    dep: FrameDependency,
) -> FrameHash {
    // The frame time itself is deliberately not digested: two instants whose
    // upstream state is identical must produce equal hashes so they share one
    // artifact. The renderer digests whatever of its state depends on time.
    let mut hasher = FrameHasher::new();
    hasher.write_u32(config.params.effective_width());
    hasher.write_u32(config.params.effective_height());
    hasher.write_u8(config.params.format as u8);
    renderer.hash_frame(dep, &mut hasher);
    hasher.finish()
}

fn run_job<R: FrameRenderer>(
    id: WorkerId,
    renderer: &mut R,
    claims: &CachingClaims,
    completions: &Sender<SchedulerMsg>,
    config: &WorkerConfig,
    job: RenderJob,
) {
    let dep = job.dep;
    let job_time = job.job_time;
    let mode = config.mode;

    let hash = if mode.hashes() {
        hash_job(renderer, config, dep)
    } else {
        FrameHash::default()
    };

    let send = |c: WorkerCompletion| {
        let _ = completions.send(SchedulerMsg::Completion(c));
    };

    if mode.hashes() {
        let path = cache_path_name(&config.cache_root, hash, config.params.format);

        // Only a completed write counts as existing; a claimed hash is
        // still in flight and its file may be partial.
        if path.exists() && !claims.is_caching(hash) {
            send(WorkerCompletion::HashAlreadyExists {
                worker: id,
                dep,
                job_time,
                hash,
            });
            return;
        }

        if !claims.try_cache(hash) {
            send(WorkerCompletion::HashAlreadyBeingCached {
                worker: id,
                dep,
                job_time,
                hash,
            });
            return;
        }
    }

    // We hold the claim (or hashing is off and dedup doesn't apply).
    let frame = if mode.renders() {
        match renderer.render_frame(dep) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(time = %dep.range.in_time(), error = %e, "frame render failed");
                None
            }
        }
    } else {
        None
    };

    send(WorkerCompletion::CompletedFrame {
        worker: id,
        dep,
        job_time,
        hash,
    });

    let mut artifact_written = false;
    let mut artifact_path = None;

    if mode.downloads() {
        if let Some(frame) = &frame {
            let path = cache_path_name(&config.cache_root, hash, config.params.format);
            match write_artifact(&path, &frame.data) {
                Ok(()) => {
                    artifact_written = true;
                    artifact_path = Some(path);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to write cached frame");
                }
            }
        }
    }

    if mode.hashes() {
        claims.release(hash);
    }

    if mode.downloads() {
        send(WorkerCompletion::CompletedDownload {
            worker: id,
            dep,
            job_time,
            hash,
            artifact_written,
            artifact_path,
        });
    }
}

fn write_artifact(path: &std::path::Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, data)
}

#[cfg(test)]
#[path = "../../tests/unit/render/worker.rs"]
mod tests;
