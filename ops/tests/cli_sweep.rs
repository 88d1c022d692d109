//! CLI tests for `tmp-sweep`.
//!
//! Spawns the binary against sandboxed temp trees and verifies which
//! directories survive, the status lines and the exit codes.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use autotrade_ops::exit_codes;
use autotrade_ops::test_support::managed_dir;

struct Sandbox {
    _temp: tempfile::TempDir,
    root: PathBuf,
    marker: PathBuf,
    settings: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let base = fs::canonicalize(temp.path()).expect("canonical tempdir");
        let root = base.join("tmp");
        fs::create_dir(&root).expect("mkdir root");
        Self {
            root,
            marker: base.join("last_temp.txt"),
            settings: base.join("missing-settings.toml"),
            _temp: temp,
        }
    }

    fn write_marker(&self, lines: &[&Path]) {
        let mut contents = String::new();
        for line in lines {
            contents.push_str(&format!("{}\n", line.display()));
        }
        fs::write(&self.marker, contents).expect("write marker");
    }

    fn sweep(&self, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_tmp-sweep"))
            .arg("--settings")
            .arg(&self.settings)
            .arg("--root")
            .arg(&self.root)
            .arg("--marker")
            .arg(&self.marker)
            .arg("--managed-prefix")
            .arg(format!("{}/", self.root.display()))
            .args(extra)
            .output()
            .expect("run tmp-sweep")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn deletes_stale_directory_and_keeps_active_one() {
    let sandbox = Sandbox::new();
    let abc = managed_dir(&sandbox.root, "abc");
    let def = managed_dir(&sandbox.root, "def");
    let unmanaged = sandbox.root.join("other");
    fs::create_dir(&unmanaged).expect("mkdir other");
    sandbox.write_marker(&[&abc, &def]);

    let output = sandbox.sweep(&[]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(!abc.exists());
    assert!(def.exists());
    assert!(unmanaged.exists());
    let out = stdout(&output);
    assert!(out.contains(&format!("[INFO] active directory: {}", def.display())));
    assert!(out.contains(&format!("[DELETE] removed unused directory: {}", abc.display())));
    assert!(out.contains(&format!("[SKIP] in use, kept: {}", def.display())));
    assert!(out.contains("1 deleted, 1 kept, 0 failed"));
}

#[test]
fn missing_marker_protects_nothing() {
    let sandbox = Sandbox::new();
    let a = managed_dir(&sandbox.root, "a");
    let b = managed_dir(&sandbox.root.join("nested"), "b");

    let output = sandbox.sweep(&[]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(!a.exists());
    assert!(!b.exists());
    assert!(stdout(&output).contains("[WARN] active directory unknown"));
}

#[test]
fn second_run_deletes_nothing() {
    let sandbox = Sandbox::new();
    managed_dir(&sandbox.root, "old");
    let active = managed_dir(&sandbox.root, "active");
    sandbox.write_marker(&[&active]);

    assert_eq!(sandbox.sweep(&[]).status.code(), Some(exit_codes::OK));
    let second = sandbox.sweep(&[]);
    assert_eq!(second.status.code(), Some(exit_codes::OK));
    assert!(stdout(&second).contains("0 deleted, 1 kept, 0 failed"));
    assert!(active.exists());
}

#[test]
fn json_report_lists_outcomes() {
    let sandbox = Sandbox::new();
    let old = managed_dir(&sandbox.root, "old");
    let active = managed_dir(&sandbox.root, "active");
    sandbox.write_marker(&[&active]);

    let output = sandbox.sweep(&["--json"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json report");
    assert_eq!(report["active"], active.display().to_string());
    let entries = report["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["path"], active.display().to_string());
    assert_eq!(entries[0]["outcome"], "kept");
    assert_eq!(entries[0]["reason"], "active");
    assert_eq!(entries[1]["path"], old.display().to_string());
    assert_eq!(entries[1]["outcome"], "deleted");
}

#[test]
fn custom_sentinel_name_is_honored() {
    let sandbox = Sandbox::new();
    let dir = sandbox.root.join("job");
    fs::create_dir(&dir).expect("mkdir");
    fs::write(dir.join("worker.lock"), "").expect("write sentinel");
    let untouched = managed_dir(&sandbox.root, "fx");

    let output = sandbox.sweep(&["--sentinel", "worker.lock"]);

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(!dir.exists());
    assert!(untouched.exists());
}

#[test]
fn missing_root_is_invalid() {
    let sandbox = Sandbox::new();
    fs::remove_dir(&sandbox.root).expect("remove root");

    let output = sandbox.sweep(&[]);

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("resolve sweep root"));
}
