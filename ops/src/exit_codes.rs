//! Stable exit codes for the operator tools.

/// Command succeeded (including "usage printed" and "restart skipped").
pub const OK: i32 = 0;
/// Invalid settings, missing/malformed config document, unreadable marker or
/// sweep root.
pub const INVALID: i32 = 1;
/// `config-edit <KEY> <VALUE>` found no entry with that key.
pub const KEY_NOT_FOUND: i32 = 2;
/// `tmp-sweep` finished but at least one directory could not be removed.
pub const PARTIAL: i32 = 3;
/// Config was persisted but the restart command failed or timed out.
/// An interrupted restart counts as skipped and exits with `OK`.
pub const RESTART_FAILED: i32 = 4;
