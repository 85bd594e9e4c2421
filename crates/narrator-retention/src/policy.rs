//! Per-directory retention policy bound to a data layout.

use narrator_types::{DataLayout, DirectoryRole};
use std::time::{Duration, SystemTime};

use crate::error::RetentionError;
use crate::sweep::{clear_directory, purge_older_than_at, SweepReport};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Default maximum file age: seven days.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Maximum file age per managed directory. `None` disables sweeping it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub chat_logs: Option<Duration>,
    pub audio: Option<Duration>,
    pub uploads: Option<Duration>,
    pub temp: Option<Duration>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::uniform(DEFAULT_MAX_AGE)
    }
}

impl RetentionPolicy {
    /// The same maximum age for every directory.
    pub fn uniform(max_age: Duration) -> Self {
        Self {
            chat_logs: Some(max_age),
            audio: Some(max_age),
            uploads: Some(max_age),
            temp: Some(max_age),
        }
    }

    /// Builds a policy from day counts; zero disables a directory.
    pub fn from_days(max_age_days: u64, temp_max_age_days: u64) -> Self {
        let days = |n: u64| (n > 0).then(|| Duration::from_secs(n.saturating_mul(DAY.as_secs())));
        Self {
            chat_logs: days(max_age_days),
            audio: days(max_age_days),
            uploads: days(max_age_days),
            temp: days(temp_max_age_days),
        }
    }

    pub fn max_age(&self, role: DirectoryRole) -> Option<Duration> {
        match role {
            DirectoryRole::ChatLogs => self.chat_logs,
            DirectoryRole::Audio => self.audio,
            DirectoryRole::Uploads => self.uploads,
            DirectoryRole::Temp => self.temp,
        }
    }
}

/// Applies a [`RetentionPolicy`] to the directories of a [`DataLayout`].
#[derive(Debug, Clone)]
pub struct Sweeper {
    layout: DataLayout,
    policy: RetentionPolicy,
}

impl Sweeper {
    pub fn new(layout: &DataLayout, policy: RetentionPolicy) -> Self {
        Self {
            layout: layout.clone(),
            policy,
        }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Purges every directory that has a maximum age configured.
    pub fn sweep_all(&self) -> Vec<(DirectoryRole, SweepReport)> {
        self.sweep_all_at(SystemTime::now())
    }

    /// [`Sweeper::sweep_all`] against an explicit clock.
    pub fn sweep_all_at(&self, now: SystemTime) -> Vec<(DirectoryRole, SweepReport)> {
        DirectoryRole::ALL
            .into_iter()
            .filter_map(|role| {
                let max_age = self.policy.max_age(role)?;
                Some((role, purge_older_than_at(&self.layout.dir(role), max_age, now)))
            })
            .collect()
    }

    /// Removes every file directly under a scratch directory.
    ///
    /// # Errors
    ///
    /// `ProtectedDirectory` for chat logs and audio output, which hold
    /// durable data and are only ever aged out.
    pub fn clear(&self, role: DirectoryRole) -> Result<SweepReport, RetentionError> {
        if !role.is_scratch() {
            return Err(RetentionError::ProtectedDirectory { role });
        }
        let report = clear_directory(&self.layout.dir(role));
        tracing::info!(?role, removed = report.removed, "cleared directory");
        Ok(report)
    }

    pub fn clear_temp(&self) -> Result<SweepReport, RetentionError> {
        self.clear(DirectoryRole::Temp)
    }
}

/// Total files removed across a set of reports.
pub fn total_removed(reports: &[(DirectoryRole, SweepReport)]) -> usize {
    reports.iter().map(|(_, report)| report.removed).sum()
}
