//! Shared remediation sweep primitives.
//!
//! This crate owns the deterministic parts of a sweep: resource descriptors,
//! filter predicates, pagination draining, batch chunking and outcome
//! reporting. It intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod chunking;
pub mod descriptor;
pub mod encryption;
pub mod error;
pub mod outcome;
pub mod pagination;
pub mod predicate;
pub mod report;
