//! Content-addressed frame cache: hashing, the time→hash index, and the
//! byte-budgeted disk store.

/// Byte-budgeted LRU disk cache manager.
pub mod disk;
/// Time→hash index and in-flight claim tracking.
pub mod frame_cache;
/// Frame content hashing.
pub mod hash;
