//! Stale temp directory sweeper.
//!
//! Deletes every directory under the sweep root that carries the sentinel
//! debug log, except the one the service's marker file names as active.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use autotrade_ops::io::settings::{SETTINGS_ENV, Settings, load_settings, settings_path};
use autotrade_ops::sweep::{active_line, run_sweep, status_line, summary_line};
use autotrade_ops::{exit_codes, logging};
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "tmp-sweep",
    version,
    about = "Delete stale temp working directories, keeping the one in use"
)]
struct Cli {
    /// Settings file (default: $AUTOTRADE_OPS_SETTINGS, then /etc/autotrade-ops.toml).
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Directory tree to sweep.
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,
    /// Marker file naming the active directory.
    #[arg(long, value_name = "FILE")]
    marker: Option<PathBuf>,
    /// Prefix marker lines must carry to name a managed directory.
    #[arg(long, value_name = "PREFIX")]
    managed_prefix: Option<String>,
    /// File name marking a directory as sweepable.
    #[arg(long, value_name = "NAME")]
    sentinel: Option<String>,
    /// Print the sweep report as JSON instead of status lines.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(root) = &self.root {
            settings.sweep.root = root.clone();
        }
        if let Some(marker) = &self.marker {
            settings.sweep.marker_file = marker.clone();
        }
        if let Some(prefix) = &self.managed_prefix {
            settings.sweep.managed_prefix = prefix.clone();
        }
        if let Some(sentinel) = &self.sentinel {
            settings.sweep.sentinel = sentinel.clone();
        }
    }
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let path = settings_path(cli.settings.as_deref(), std::env::var_os(SETTINGS_ENV));
    let mut settings = load_settings(&path)?;
    cli.apply_overrides(&mut settings);
    settings.validate().context("invalid command-line override")?;

    let report = run_sweep(&settings.sweep)?;
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize sweep report")?
        );
    } else {
        println!("{}", active_line(report.active.as_deref()));
        for entry in &report.entries {
            println!("{}", status_line(entry));
        }
        println!("{}", summary_line(&report));
    }

    if report.has_failures() {
        Ok(exit_codes::PARTIAL)
    } else {
        Ok(exit_codes::OK)
    }
}
