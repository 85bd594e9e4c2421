//! Retention sweeps for Narrator's managed directories.
//!
//! Chat logs, synthesized audio, uploads, and scratch files accumulate in the
//! data directory. This crate ages them out:
//!
//! - [`purge_older_than`] removes files strictly older than a maximum age,
//!   recursively, continuing past files it cannot remove.
//! - [`clear_directory`] empties flat scratch space.
//! - [`Sweeper`] applies a [`RetentionPolicy`] to a whole `DataLayout`.
//!
//! Everything here is synchronous. Scheduling (on a timer or on demand) is
//! the caller's decision.

mod error;
mod policy;
mod sweep;

pub use error::RetentionError;
pub use policy::{total_removed, RetentionPolicy, Sweeper, DEFAULT_MAX_AGE};
pub use sweep::{
    clear_directory, purge_older_than, purge_older_than_at, SweepFailure, SweepReport,
};
