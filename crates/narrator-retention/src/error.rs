//! Error types for retention sweeps.

use narrator_types::DirectoryRole;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    /// One or more files could not be removed; the sweep still ran to the end.
    #[error("sweep of {dir} removed {removed} file(s) but failed on {failed}")]
    SweepPartialFailure {
        dir: PathBuf,
        removed: usize,
        failed: usize,
    },

    /// Clearing was requested for a directory that holds durable data.
    #[error("refusing to clear protected directory {role:?}")]
    ProtectedDirectory { role: DirectoryRole },
}
