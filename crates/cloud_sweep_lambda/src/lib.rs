//! AWS-oriented handlers for scheduled remediation sweeps.
//!
//! Handlers are written against the collaborator traits in [`adapters`] so
//! they run identically against the AWS SDK (see `src/bin`) and against
//! in-memory fakes in tests. Selection, chunking and reporting primitives
//! come from `cloud_sweep_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod runtime;
