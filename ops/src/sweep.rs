//! Stale temp directory sweep for `tmp-sweep`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument, warn};

use crate::core::sweep_plan::{
    Decision, KeepReason, SweepEntry, SweepOutcome, SweepReport, classify,
};
use crate::io::dir_source::{DirSource, OsDirSource};
use crate::io::marker::resolve_active_dir;
use crate::io::settings::SweepSettings;

const ROOT_KEPT: SweepOutcome = SweepOutcome::Kept {
    reason: KeepReason::Root,
};

/// Resolve the active directory from the marker file and sweep the root.
pub fn run_sweep(settings: &SweepSettings) -> Result<SweepReport> {
    let active = resolve_active_dir(&settings.marker_file, &settings.managed_prefix)?;
    sweep(
        &OsDirSource,
        &settings.root,
        &settings.sentinel,
        active.as_deref(),
    )
}

/// Remove every sentinel-bearing directory under `root` except `active`.
///
/// Sentinel-bearing directories are walk leaves, except the root, which is
/// kept and still descended into. Per-directory failures are
/// recorded in the report and never abort the walk; only an unlistable root
/// is an error.
#[instrument(skip_all, fields(root = %root.display(), sentinel = %sentinel))]
pub fn sweep<S: DirSource>(
    source: &S,
    root: &Path,
    sentinel: &str,
    active: Option<&Path>,
) -> Result<SweepReport> {
    let root = source
        .canonicalize(root)
        .with_context(|| format!("resolve sweep root {}", root.display()))?;
    let mut report = SweepReport::new(active.map(Path::to_path_buf));
    let mut pending = vec![root.clone()];

    while let Some(dir) = pending.pop() {
        let listing = match source.list(&dir) {
            Ok(listing) => listing,
            Err(err) if dir == root => {
                return Err(err).with_context(|| format!("list sweep root {}", root.display()));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "directory vanished before listing");
                continue;
            }
            Err(err) => {
                warn!(dir = %dir.display(), err = %err, "cannot list directory");
                report.record(
                    dir,
                    SweepOutcome::Unreadable {
                        error: err.to_string(),
                    },
                );
                continue;
            }
        };

        if listing.has_file(sentinel) {
            let (path, outcome) = sweep_managed(source, &dir, &root, active);
            let descend = outcome == ROOT_KEPT;
            report.record(path, outcome);
            // A sentinel in the root does not shield the directories below it.
            if !descend {
                continue;
            }
        }
        // Reversed so the stack pops children in name order.
        pending.extend(listing.dirs.into_iter().rev());
    }

    info!(
        deleted = report.deleted(),
        kept = report.kept(),
        failed = report.failed(),
        "sweep finished"
    );
    Ok(report)
}

fn sweep_managed<S: DirSource>(
    source: &S,
    dir: &Path,
    root: &Path,
    active: Option<&Path>,
) -> (PathBuf, SweepOutcome) {
    let canonical = match source.canonicalize(dir) {
        Ok(canonical) => canonical,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return (dir.to_path_buf(), SweepOutcome::Vanished);
        }
        Err(err) => {
            return (
                dir.to_path_buf(),
                SweepOutcome::Failed {
                    error: format!("resolve path: {err}"),
                },
            );
        }
    };

    let outcome = match classify(&canonical, root, active) {
        Decision::Keep(reason) => {
            debug!(dir = %canonical.display(), ?reason, "keeping managed directory");
            SweepOutcome::Kept { reason }
        }
        Decision::Delete => match source.remove_tree(&canonical) {
            Ok(()) => {
                debug!(dir = %canonical.display(), "deleted managed directory");
                SweepOutcome::Deleted
            }
            Err(err) if err.kind() == ErrorKind::NotFound => SweepOutcome::Vanished,
            Err(err) => {
                warn!(dir = %canonical.display(), err = %err, "failed to delete directory");
                SweepOutcome::Failed {
                    error: err.to_string(),
                }
            }
        },
    };
    (canonical, outcome)
}

/// Operator-facing line describing the active directory.
pub fn active_line(active: Option<&Path>) -> String {
    match active {
        Some(dir) => format!("[INFO] active directory: {}", dir.display()),
        None => "[WARN] active directory unknown; no directory is protected".to_string(),
    }
}

/// Operator-facing line for one sweep decision.
pub fn status_line(entry: &SweepEntry) -> String {
    let path = entry.path.display();
    match &entry.outcome {
        SweepOutcome::Kept {
            reason: KeepReason::Active,
        } => format!("[SKIP] in use, kept: {path}"),
        SweepOutcome::Kept {
            reason: KeepReason::Root,
        } => format!("[SKIP] sweep root, kept: {path}"),
        SweepOutcome::Deleted => format!("[DELETE] removed unused directory: {path}"),
        SweepOutcome::Vanished => format!("[GONE] already removed: {path}"),
        SweepOutcome::Failed { error } => format!("[ERROR] failed to remove {path} ({error})"),
        SweepOutcome::Unreadable { error } => format!("[UNREADABLE] skipped {path} ({error})"),
    }
}

pub fn summary_line(report: &SweepReport) -> String {
    format!(
        "{} deleted, {} kept, {} failed",
        report.deleted(),
        report.kept(),
        report.failed()
    )
}
