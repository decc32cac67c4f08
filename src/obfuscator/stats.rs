//! Run statistics and progress events.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::transform::RenameStats;

/// Result of an obfuscation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStatistics {
    pub files_processed: usize,
    /// Excluded files plus files that failed to parse
    pub files_skipped: usize,
    pub parse_failures: usize,
    pub views_cleaned: usize,
    /// Distinct names in the rename map
    pub variables_obfuscated: usize,
    pub renames: RenameStats,
    pub backup_path: Option<PathBuf>,
    pub encryption_key: String,
}

impl RunStatistics {
    /// Every `.php` file found under the configured paths
    pub fn candidates(&self) -> usize {
        self.files_processed + self.files_skipped
    }
}

/// Observational notifications emitted during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObfuscationEvent {
    Backup(PathBuf),
    Skip { path: PathBuf, reason: String },
    Progress(usize),
    Views(usize),
}

impl fmt::Display for ObfuscationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObfuscationEvent::Backup(path) => write!(f, "backup created at {}", path.display()),
            ObfuscationEvent::Skip { path, reason } => {
                write!(f, "skipped {} ({})", path.display(), reason)
            }
            ObfuscationEvent::Progress(count) => write!(f, "{} files obfuscated", count),
            ObfuscationEvent::Views(count) => write!(f, "{} views cleaned", count),
        }
    }
}
