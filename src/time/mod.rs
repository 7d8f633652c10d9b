//! Interval algebra over rational time.
//!
//! Invalidation tracking is set arithmetic on half-open ranges; these types
//! keep that arithmetic exact and canonical.

/// Half-open time intervals.
pub mod range;
/// Sorted, disjoint, merged sets of intervals.
pub mod range_list;
