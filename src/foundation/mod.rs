//! Shared building blocks: the error taxonomy and exact rational time.

/// Error and result types used across the crate.
pub mod error;
/// Exact rational time scalar.
pub mod rational;
