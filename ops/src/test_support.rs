//! Test-only fixtures: sample documents, sandboxed temp trees and fakes.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use crate::io::dir_source::{DirSource, Listing};
use crate::io::prompt::Prompter;
use crate::io::restart::{RestartOutcome, RestartRunner};

/// Sentinel name used by fixtures (matches the production default).
pub const SENTINEL: &str = "fx_debug_log.txt";

/// Representative `bot_config.xml`: a described entry, an entry without
/// description, an empty value, a table without value column, a table
/// without key and escaped text.
pub const SAMPLE_DOCUMENT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!-- exported by the bot admin panel -->
<pma_xml_export version="1.0">
    <database name="bot">
        <table name="config">
            <column name="key">poll_interval</column>
            <column name="value">30</column>
            <column name="ettc">Polling interval in seconds</column>
        </table>
        <table name="config">
            <column name="key">symbol</column>
            <column name="value">USDJPY</column>
        </table>
        <table name="config">
            <column name="key">max_lot</column>
            <column name="value"/>
            <column name="ettc">Upper bound per order</column>
        </table>
        <table name="config">
            <column name="key">lot_step</column>
            <column name="ettc">Not configured yet</column>
        </table>
        <table name="config">
            <column name="value">orphan</column>
        </table>
        <table name="config" origin="manual">
            <column name="key">comment</column>
            <column name="value">a &lt; b &amp; &quot;c&quot;</column>
            <column name="ettc">Free text</column>
        </table>
    </database>
</pma_xml_export>
"#;

/// Write `contents` as `bot_config.xml` inside `dir`.
pub fn write_document(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("bot_config.xml");
    fs::write(&path, contents).expect("write config document");
    path
}

/// Create `parent/name` (and parents) containing the sentinel file.
pub fn managed_dir(parent: &Path, name: &str) -> PathBuf {
    let dir = parent.join(name);
    fs::create_dir_all(&dir).expect("create managed dir");
    fs::write(dir.join(SENTINEL), "debug log\n").expect("write sentinel");
    dir
}

/// In-memory directory tree implementing [`DirSource`].
///
/// Paths are treated as already canonical. Failures can be injected per
/// path for listing and removal.
#[derive(Debug, Default)]
pub struct VirtualTree {
    dirs: RefCell<BTreeMap<PathBuf, BTreeSet<OsString>>>,
    removed: RefCell<Vec<PathBuf>>,
    list_failures: HashMap<PathBuf, io::ErrorKind>,
    remove_failures: HashMap<PathBuf, io::ErrorKind>,
}

impl VirtualTree {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::default().dir(root)
    }

    /// Add a plain directory and its ancestors.
    pub fn dir(self, path: impl AsRef<Path>) -> Self {
        {
            let mut dirs = self.dirs.borrow_mut();
            for ancestor in path.as_ref().ancestors() {
                if ancestor.as_os_str().is_empty() {
                    continue;
                }
                dirs.entry(ancestor.to_path_buf()).or_default();
            }
        }
        self
    }

    /// Add a directory containing the sentinel file.
    pub fn managed(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        self.dir(&path).sentinel_in(&path)
    }

    pub fn sentinel_in(self, path: impl AsRef<Path>) -> Self {
        self.dirs
            .borrow_mut()
            .entry(path.as_ref().to_path_buf())
            .or_default()
            .insert(OsString::from(SENTINEL));
        self
    }

    pub fn fail_list(mut self, path: impl AsRef<Path>, kind: io::ErrorKind) -> Self {
        self.list_failures.insert(path.as_ref().to_path_buf(), kind);
        self
    }

    pub fn fail_remove(mut self, path: impl AsRef<Path>, kind: io::ErrorKind) -> Self {
        self.remove_failures.insert(path.as_ref().to_path_buf(), kind);
        self
    }

    /// Directories removed so far, in removal order.
    pub fn removed(&self) -> Vec<PathBuf> {
        self.removed.borrow().clone()
    }

    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.dirs.borrow().contains_key(path.as_ref())
    }
}

impl DirSource for VirtualTree {
    fn list(&self, dir: &Path) -> io::Result<Listing> {
        if let Some(kind) = self.list_failures.get(dir) {
            return Err(io::Error::from(*kind));
        }
        let dirs = self.dirs.borrow();
        let files = dirs.get(dir).ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        Ok(Listing {
            dirs: dirs
                .keys()
                .filter(|path| path.parent() == Some(dir))
                .cloned()
                .collect(),
            files: files.iter().cloned().collect(),
        })
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        if self.exists(path) {
            Ok(path.to_path_buf())
        } else {
            Err(io::Error::from(io::ErrorKind::NotFound))
        }
    }

    fn remove_tree(&self, path: &Path) -> io::Result<()> {
        if let Some(kind) = self.remove_failures.get(path) {
            return Err(io::Error::from(*kind));
        }
        if !self.exists(path) {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        self.dirs
            .borrow_mut()
            .retain(|dir, _| !dir.starts_with(path));
        self.removed.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

/// Prompter with a canned answer that records every question asked.
#[derive(Debug, Default)]
pub struct FixedPrompter {
    answer: Option<bool>,
    pub questions: Vec<String>,
}

impl FixedPrompter {
    pub fn answer(answer: bool) -> Self {
        Self {
            answer: Some(answer),
            questions: Vec::new(),
        }
    }

    /// Prompter whose terminal read always fails.
    pub fn failing() -> Self {
        Self::default()
    }
}

impl Prompter for FixedPrompter {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        self.questions.push(question.to_string());
        self.answer.ok_or_else(|| anyhow!("read answer: stdin closed"))
    }
}

/// Restart runner returning a fixed result and counting invocations.
#[derive(Debug)]
pub struct ScriptedRestartRunner {
    result: Result<RestartOutcome, String>,
    calls: Cell<usize>,
}

impl ScriptedRestartRunner {
    pub fn new(result: Result<RestartOutcome, String>) -> Self {
        Self {
            result,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl RestartRunner for ScriptedRestartRunner {
    fn run(&self) -> Result<RestartOutcome> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone().map_err(|msg| anyhow!(msg))
    }
}
