//! Ambient configuration for refactoring operations.
//!
//! None of the engines (`change_signature`, `safe_delete`, `extract_method`,
//! `imports`) read a `RefactoringConfig`: their algorithms are pure functions
//! of a `Workspace` and an operation's own input. This type instead governs
//! the two places a caller usually wants a tunable policy: how many files a
//! single operation is allowed to touch, and how long backup snapshots are
//! kept around. Both are consulted by callers (or, for backups, by
//! `serializer::cleanup_old_backups`), never by the engines themselves.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Tuning knobs for how a plan is validated and how its backups persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefactoringConfig {
    /// Re-validate the formatter's output before treating a write as
    /// successful (see [`crate::serializer::validate_file_structure`]).
    pub safe_mode: bool,
    /// Reject a plan touching more files than this. `0` means unlimited.
    pub max_files_per_operation: usize,
    /// Whether applying a plan should snapshot a backup first.
    pub create_backups: bool,
    /// Maximum number of `.backup` files [`crate::serializer::cleanup_old_backups`]
    /// retains per directory. `0` means unlimited.
    pub max_backup_retention: usize,
    /// Maximum age, in seconds, a backup file may reach before
    /// [`crate::serializer::cleanup_old_backups`] removes it. `0` means no
    /// age limit.
    pub backup_max_age_seconds: u64,
    /// Root directory backups are written under, if not colocated with the
    /// original file. Not serialized: a deployment-local path has no
    /// business surviving a round trip through persisted config.
    #[serde(skip)]
    pub backup_root: Option<PathBuf>,
}

impl Default for RefactoringConfig {
    fn default() -> Self {
        Self {
            safe_mode: true,
            max_files_per_operation: 100,
            create_backups: true,
            max_backup_retention: 10,
            backup_max_age_seconds: 7 * 24 * 60 * 60,
            backup_root: None,
        }
    }
}

impl RefactoringConfig {
    /// Whether a plan touching `affected_file_count` files exceeds this
    /// config's limit.
    pub fn exceeds_file_limit(&self, affected_file_count: usize) -> bool {
        self.max_files_per_operation != 0 && affected_file_count > self.max_files_per_operation
    }

    /// Whether a backup last modified `age` ago should be reclaimed under
    /// this config's retention policy.
    pub fn backup_is_expired(&self, age: Duration) -> bool {
        self.backup_max_age_seconds != 0 && age.as_secs() > self.backup_max_age_seconds
    }
}

pub(crate) fn age_since(modified: SystemTime) -> Duration {
    SystemTime::now().duration_since(modified).unwrap_or_default()
}
