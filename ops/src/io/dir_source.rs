//! Directory listing abstraction used by the sweeper.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Immediate contents of one directory.
///
/// `dirs` holds real subdirectories only; symlinks and every other entry
/// type land in `files` so the walk never follows links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    pub dirs: Vec<PathBuf>,
    pub files: Vec<OsString>,
}

impl Listing {
    pub fn has_file(&self, name: &str) -> bool {
        self.files.iter().any(|file| file.as_os_str() == OsStr::new(name))
    }
}

/// Filesystem operations the sweeper needs.
pub trait DirSource {
    /// List the direct children of `dir`, sorted by name.
    fn list(&self, dir: &Path) -> io::Result<Listing>;
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
    /// Remove `path` and everything beneath it.
    fn remove_tree(&self, path: &Path) -> io::Result<()>;
}

/// [`DirSource`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsDirSource;

impl DirSource for OsDirSource {
    fn list(&self, dir: &Path) -> io::Result<Listing> {
        let mut listing = Listing::default();
        for entry in fs::read_dir(dir)? {
            // Entries can disappear between readdir and stat.
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    debug!(dir = %dir.display(), err = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    debug!(path = %entry.path().display(), err = %err, "skipping entry without type");
                    continue;
                }
            };
            if file_type.is_dir() {
                listing.dirs.push(entry.path());
            } else {
                listing.files.push(entry.file_name());
            }
        }
        listing.dirs.sort();
        listing.files.sort();
        Ok(listing)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn remove_tree(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }
}
