//! Prevue is a render cache and invalidation engine for timeline video
//! editors.
//!
//! It tracks which parts of a timeline are validly cached, schedules
//! re-rendering of stale frames near the playhead, deduplicates identical
//! frames through content hashing, and keeps the on-disk artifact store
//! inside a byte budget. The embedding application supplies the actual
//! renderer behind the [`FrameRenderer`] trait; Prevue supplies everything
//! around it:
//!
//! - Mark timeline ranges stale with [`RenderScheduler::invalidate_cache`]
//! - Drive playback with [`RenderScheduler::get_cached_frame`]
//! - Drain worker and disk-cache feedback with
//!   [`RenderScheduler::process_pending`]
//! - React to [`CacheEvent`]s on the event channel
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Content-addressed frame cache.
pub mod cache;
/// Error taxonomy and rational time.
pub mod foundation;
/// Scheduling, jobs, and workers.
pub mod render;
/// Interval algebra over rational time.
pub mod time;

pub use crate::cache::disk::{DiskCache, DiskCacheManager};
pub use crate::cache::frame_cache::{CachingClaims, FrameHashCache};
pub use crate::cache::hash::{FrameHash, FrameHasher};
pub use crate::foundation::error::{PrevueError, PrevueResult};
pub use crate::foundation::rational::Rational;
pub use crate::render::job::{
    CacheEvent, FrameDependency, RenderJob, SchedulerMsg, WorkerCompletion, WorkerId,
};
pub use crate::render::params::{OperatingMode, PixelFormat, VideoParams};
pub use crate::render::scheduler::{RenderScheduler, SchedulerConfig};
pub use crate::render::worker::{
    FrameRenderer, RenderWorker, RenderedFrame, ThreadWorker, WorkerConfig,
};
pub use crate::time::range::TimeRange;
pub use crate::time::range_list::TimeRangeList;
