//! Key/value editor for the service's XML configuration document.
//!
//! `config-edit view` prints every setting; `config-edit <KEY> <VALUE>`
//! updates one, saves the document and offers to restart the service.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use autotrade_ops::edit::{EditRequest, update_document, view_document};
use autotrade_ops::io::interrupt::Interrupts;
use autotrade_ops::io::prompt::TerminalPrompter;
use autotrade_ops::io::restart::{
    CommandRestartRunner, RestartOutcome, RestartPolicy, maybe_restart,
};
use autotrade_ops::io::settings::{SETTINGS_ENV, load_settings, settings_path};
use autotrade_ops::{exit_codes, logging};
use clap::{CommandFactory, Parser};
use tracing::warn;

const EXAMPLES: &str = "\
Examples:
  config-edit view
  config-edit poll_interval 60
  config-edit --no-restart symbol EURJPY";

#[derive(Parser)]
#[command(
    name = "config-edit",
    version,
    about = "View or change settings in the bot's XML configuration",
    after_help = EXAMPLES
)]
struct Cli {
    /// Settings file (default: $AUTOTRADE_OPS_SETTINGS, then /etc/autotrade-ops.toml).
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Configuration document to edit instead of the configured one.
    #[arg(long, value_name = "XML")]
    file: Option<PathBuf>,
    /// With `view`, print entries as JSON.
    #[arg(long)]
    json: bool,
    /// Restart after a change without asking.
    #[arg(long, conflicts_with = "no_restart")]
    yes: bool,
    /// Never restart after a change.
    #[arg(long)]
    no_restart: bool,
    /// `view`, or `<KEY> <VALUE>` to update a setting.
    #[arg(value_name = "ARGS", allow_negative_numbers = true)]
    args: Vec<String>,
}

impl Cli {
    fn restart_policy(&self) -> RestartPolicy {
        if self.no_restart {
            RestartPolicy::Never
        } else if self.yes {
            RestartPolicy::Always
        } else {
            RestartPolicy::Ask
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
    let request = EditRequest::from_args(&cli.args);
    if request == EditRequest::Usage {
        Cli::command().print_help().context("print usage")?;
        println!();
        return Ok(exit_codes::OK);
    }

    let path = settings_path(cli.settings.as_deref(), std::env::var_os(SETTINGS_ENV));
    let mut settings = load_settings(&path)?;
    if let Some(file) = &cli.file {
        settings.config_edit.document = file.clone();
    }
    let document = settings.config_edit.document.clone();

    match request {
        EditRequest::View => {
            print!("{}", view_document(&document, cli.json)?);
            Ok(exit_codes::OK)
        }
        EditRequest::Update { key, value } => {
            let Some(change) = update_document(&document, &key, &value)? else {
                eprintln!("key '{}' not found in {}", key, document.display());
                return Ok(exit_codes::KEY_NOT_FOUND);
            };
            println!("updated {change}");

            let policy = cli.restart_policy();
            let interrupts = if policy == RestartPolicy::Never {
                Interrupts::default()
            } else {
                Interrupts::install().unwrap_or_else(|err| {
                    warn!(err = %err, "continuing without interrupt handling");
                    Interrupts::default()
                })
            };
            let runner = CommandRestartRunner {
                command: settings.config_edit.restart_command.clone(),
                timeout: settings.config_edit.restart_timeout(),
                interrupts: interrupts.clone(),
            };
            let outcome =
                maybe_restart(policy, &mut TerminalPrompter::stdio(), &runner, &interrupts);
            report_restart(&outcome);
            if outcome.is_failure() {
                Ok(exit_codes::RESTART_FAILED)
            } else {
                Ok(exit_codes::OK)
            }
        }
        EditRequest::Usage => Ok(exit_codes::OK),
    }
}

fn report_restart(outcome: &RestartOutcome) {
    match outcome {
        RestartOutcome::Skipped => println!("restart skipped"),
        RestartOutcome::Interrupted => println!("restart interrupted; skipped"),
        RestartOutcome::Succeeded => println!("restart complete"),
        RestartOutcome::Failed(reason) => {
            eprintln!("restart command failed: {reason} (config change is saved)");
        }
    }
}
