//! Keep/delete decisions and the sweep report.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Why a sentinel-bearing directory survives a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepReason {
    /// The directory is the service's active working directory.
    Active,
    /// The directory is the sweep root itself.
    Root,
}

/// Decision for a single managed directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep(KeepReason),
    Delete,
}

/// Decide whether a managed directory may be removed.
///
/// All paths must already be canonical; identity is path equality on the
/// canonical form, never string comparison of raw marker text.
pub fn classify(candidate: &Path, root: &Path, active: Option<&Path>) -> Decision {
    if active == Some(candidate) {
        return Decision::Keep(KeepReason::Active);
    }
    if candidate == root {
        return Decision::Keep(KeepReason::Root);
    }
    Decision::Delete
}

/// What happened to one directory during a sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum SweepOutcome {
    /// Managed directory left in place.
    Kept { reason: KeepReason },
    /// Managed directory removed with its whole subtree.
    Deleted,
    /// Managed directory disappeared before it could be removed.
    Vanished,
    /// Removal failed; the directory may be partially removed.
    Failed { error: String },
    /// Directory could not be listed and was not inspected.
    Unreadable { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepEntry {
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: SweepOutcome,
}

/// Ordered record of every decision made during one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub active: Option<PathBuf>,
    pub entries: Vec<SweepEntry>,
}

impl SweepReport {
    pub fn new(active: Option<PathBuf>) -> Self {
        Self {
            active,
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, path: PathBuf, outcome: SweepOutcome) {
        self.entries.push(SweepEntry { path, outcome });
    }

    pub fn deleted(&self) -> usize {
        self.count(|outcome| matches!(outcome, SweepOutcome::Deleted))
    }

    pub fn kept(&self) -> usize {
        self.count(|outcome| matches!(outcome, SweepOutcome::Kept { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|outcome| matches!(outcome, SweepOutcome::Failed { .. }))
    }

    /// True when at least one removal failed. Unreadable and vanished
    /// directories are races with other processes and do not count.
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&SweepOutcome) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|entry| pred(&entry.outcome))
            .count()
    }
}
