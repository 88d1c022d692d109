//! Active-directory marker file reader.

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::marker::latest_active_line;

/// Resolve the service's active working directory from its marker log.
///
/// A missing marker file means nothing is protected and yields `Ok(None)`.
/// Any other read failure is an error: sweeping without knowing the active
/// directory could remove it.
pub fn resolve_active_dir(marker_path: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    let bytes = match fs::read(marker_path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %marker_path.display(), "marker file missing");
            return Ok(None);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("read marker {}", marker_path.display()));
        }
    };
    let contents = String::from_utf8_lossy(&bytes);
    let Some(line) = latest_active_line(&contents, prefix) else {
        debug!(path = %marker_path.display(), prefix, "no managed directory in marker");
        return Ok(None);
    };
    Ok(Some(canonical_or_normalized(Path::new(line))))
}

/// Canonicalize `path`, falling back to lexical normalization when it no
/// longer exists on disk.
fn canonical_or_normalized(path: &Path) -> PathBuf {
    match fs::canonicalize(path) {
        Ok(canonical) => canonical,
        Err(err) => {
            debug!(path = %path.display(), err = %err, "active directory not canonicalizable");
            normalize_lexically(path)
        }
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix_of(dir: &Path) -> String {
        format!("{}/", dir.display())
    }

    #[test]
    fn missing_marker_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let active = resolve_active_dir(&temp.path().join("last_temp.txt"), "/tmp/")
            .expect("missing marker is not an error");
        assert_eq!(active, None);
    }

    #[test]
    fn last_managed_line_is_canonicalized() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = fs::canonicalize(temp.path()).expect("canonical root");
        fs::create_dir(root.join("abc")).expect("mkdir abc");
        fs::create_dir(root.join("def")).expect("mkdir def");
        let marker = root.join("last_temp.txt");
        fs::write(
            &marker,
            format!(
                "{0}/abc\n{0}/./def/../def\n\n",
                root.display()
            ),
        )
        .expect("write marker");

        let active = resolve_active_dir(&marker, &prefix_of(&root)).expect("resolve");
        assert_eq!(active, Some(root.join("def")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_marker_entry_resolves_to_target() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = fs::canonicalize(temp.path()).expect("canonical root");
        fs::create_dir(root.join("real")).expect("mkdir");
        std::os::unix::fs::symlink(root.join("real"), root.join("link")).expect("symlink");
        let marker = root.join("marker.txt");
        fs::write(&marker, format!("{}/link\n", root.display())).expect("write marker");

        let active = resolve_active_dir(&marker, &prefix_of(&root)).expect("resolve");
        assert_eq!(active, Some(root.join("real")));
    }

    #[test]
    fn vanished_directory_is_normalized() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = fs::canonicalize(temp.path()).expect("canonical root");
        let marker = root.join("marker.txt");
        fs::write(&marker, format!("{}/gone/./x/..\n", root.display())).expect("write marker");

        let active = resolve_active_dir(&marker, &prefix_of(&root)).expect("resolve");
        assert_eq!(active, Some(root.join("gone")));
    }

    #[test]
    fn marker_without_managed_lines_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let marker = temp.path().join("marker.txt");
        fs::write(&marker, "boot ok\n/var/run/x\n").expect("write marker");
        assert_eq!(resolve_active_dir(&marker, "/tmp/").expect("resolve"), None);
    }

    #[test]
    fn unreadable_marker_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = resolve_active_dir(temp.path(), "/tmp/").expect_err("directory is not a file");
        assert!(format!("{err:#}").contains("read marker"));
    }
}
