//! Render scheduling: parameters, jobs, workers, and the scheduler itself.

/// Job, completion, and event types.
pub mod job;
/// Render parameters and operating modes.
pub mod params;
/// The single-writer scheduler.
pub mod scheduler;
/// Worker traits and the threaded worker.
pub mod worker;
