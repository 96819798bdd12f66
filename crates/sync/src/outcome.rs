//! Tagged results of the bulk sync operations.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Push,
    Pull,
    Merge,
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Push => "Push",
            Self::Pull => "Pull",
            Self::Merge => "Merge",
        })
    }
}

/// Result of a push, pull or merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Pushed { active: usize, bin: usize },
    Pulled { active: usize, bin: usize },
    /// Counts aggregate both collections.
    Merged { uploaded: usize, downloaded: usize },
    Failed { action: SyncAction, reason: String },
}

impl SyncOutcome {
    pub fn failed(action: SyncAction, reason: impl fmt::Display) -> Self {
        Self::Failed {
            action,
            reason: reason.to_string(),
        }
    }

    pub fn success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }

    /// One human-readable sentence describing the outcome.
    pub fn message(&self) -> String {
        match self {
            Self::Pushed { active, bin } => {
                format!("Pushed {active} records and {bin} recycle bin entries to the cloud")
            }
            Self::Pulled { active, bin } => {
                format!("Pulled {active} records and {bin} recycle bin entries from the cloud")
            }
            Self::Merged {
                uploaded,
                downloaded,
            } => format!("Merge complete: uploaded {uploaded}, downloaded {downloaded}"),
            Self::Failed { action, reason } => format!("{action} failed: {reason}"),
        }
    }
}

/// Boundary shape of a sync result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub success: bool,
    pub message: String,
}

impl From<&SyncOutcome> for SyncReport {
    fn from(outcome: &SyncOutcome) -> Self {
        Self {
            success: outcome.success(),
            message: outcome.message(),
        }
    }
}

impl From<SyncOutcome> for SyncReport {
    fn from(outcome: SyncOutcome) -> Self {
        Self::from(&outcome)
    }
}
