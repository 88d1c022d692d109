//! Service restart trigger run after a saved config change.

use std::process::{Command, ExitStatus};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

use crate::io::interrupt::{Interrupts, Phase};
use crate::io::prompt::Prompter;

pub const RESTART_QUESTION: &str = "Restart the service?";

/// How the operator wants restarts handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Ask on the terminal (default).
    Ask,
    /// Restart without asking (`--yes`).
    Always,
    /// Never restart (`--no-restart`).
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartOutcome {
    /// Operator declined, or the policy forbids restarts.
    Skipped,
    /// A signal arrived while the restart command ran.
    Interrupted,
    Succeeded,
    /// Command could not be run, exited non-zero or timed out.
    Failed(String),
}

impl RestartOutcome {
    /// Interrupted restarts count as skipped, not failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Runs the external restart mechanism.
pub trait RestartRunner {
    fn run(&self) -> Result<RestartOutcome>;
}

/// Runs the configured restart command with inherited stdio.
#[derive(Debug, Clone)]
pub struct CommandRestartRunner {
    pub command: Vec<String>,
    pub timeout: Option<Duration>,
    pub interrupts: Interrupts,
}

impl RestartRunner for CommandRestartRunner {
    #[instrument(skip_all, fields(command = ?self.command, timeout = ?self.timeout))]
    fn run(&self) -> Result<RestartOutcome> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| anyhow!("restart command is empty"))?;

        debug!("spawning restart command");
        let mut child = Command::new(program)
            .args(args)
            .spawn()
            .with_context(|| format!("spawn restart command {program}"))?;

        let status = match self.timeout {
            None => child.wait().context("wait for restart command")?,
            Some(timeout) => match child
                .wait_timeout(timeout)
                .context("wait for restart command")?
            {
                Some(status) => status,
                None => {
                    warn!(timeout_secs = timeout.as_secs(), "restart command timed out, killing");
                    child.kill().context("kill restart command")?;
                    child.wait().context("wait restart command after kill")?;
                    return Ok(RestartOutcome::Failed(format!(
                        "timed out after {}s",
                        timeout.as_secs()
                    )));
                }
            },
        };

        debug!(exit_code = ?status.code(), "restart command finished");
        if self.interrupts.take_interrupted() || ended_by_sigint(&status) {
            return Ok(RestartOutcome::Interrupted);
        }
        if status.success() {
            Ok(RestartOutcome::Succeeded)
        } else {
            Ok(RestartOutcome::Failed(describe_status(&status)))
        }
    }
}

#[cfg(unix)]
fn ended_by_sigint(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;
    const SIGINT: i32 = 2;
    status.signal() == Some(SIGINT)
}

#[cfg(not(unix))]
fn ended_by_sigint(_status: &ExitStatus) -> bool {
    false
}

fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Ask (per `policy`) and run the restart command.
///
/// Never fails: prompt errors count as "no" and runner errors become
/// `Failed`.
pub fn maybe_restart<P: Prompter, R: RestartRunner>(
    policy: RestartPolicy,
    prompter: &mut P,
    runner: &R,
    interrupts: &Interrupts,
) -> RestartOutcome {
    let confirmed = match policy {
        RestartPolicy::Never => false,
        RestartPolicy::Always => true,
        RestartPolicy::Ask => {
            interrupts.enter(Phase::Prompting);
            let answer = prompter.confirm(RESTART_QUESTION);
            interrupts.enter(Phase::Idle);
            match answer {
                Ok(answer) => answer,
                Err(err) => {
                    let message = format!("{err:#}");
                    warn!(err = %message, "restart prompt failed");
                    false
                }
            }
        }
    };
    if !confirmed {
        return RestartOutcome::Skipped;
    }

    interrupts.enter(Phase::Restarting);
    let outcome = runner
        .run()
        .unwrap_or_else(|err| RestartOutcome::Failed(format!("{err:#}")));
    interrupts.enter(Phase::Idle);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedPrompter, ScriptedRestartRunner};

    #[test]
    fn declined_prompt_skips_restart() {
        let runner = ScriptedRestartRunner::new(Ok(RestartOutcome::Succeeded));
        let outcome = maybe_restart(
            RestartPolicy::Ask,
            &mut FixedPrompter::answer(false),
            &runner,
            &Interrupts::default(),
        );
        assert_eq!(outcome, RestartOutcome::Skipped);
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn confirmed_prompt_runs_command() {
        let runner = ScriptedRestartRunner::new(Ok(RestartOutcome::Succeeded));
        let mut prompter = FixedPrompter::answer(true);
        let outcome = maybe_restart(
            RestartPolicy::Ask,
            &mut prompter,
            &runner,
            &Interrupts::default(),
        );
        assert_eq!(outcome, RestartOutcome::Succeeded);
        assert_eq!(runner.calls(), 1);
        assert_eq!(prompter.questions, vec![RESTART_QUESTION.to_string()]);
    }

    #[test]
    fn policies_bypass_the_prompt() {
        let runner = ScriptedRestartRunner::new(Ok(RestartOutcome::Succeeded));
        let mut prompter = FixedPrompter::answer(false);
        let interrupts = Interrupts::default();

        assert_eq!(
            maybe_restart(RestartPolicy::Always, &mut prompter, &runner, &interrupts),
            RestartOutcome::Succeeded
        );
        assert_eq!(
            maybe_restart(RestartPolicy::Never, &mut prompter, &runner, &interrupts),
            RestartOutcome::Skipped
        );
        assert!(prompter.questions.is_empty());
        assert_eq!(runner.calls(), 1);
    }

    #[test]
    fn prompt_error_is_treated_as_no() {
        let runner = ScriptedRestartRunner::new(Ok(RestartOutcome::Succeeded));
        let outcome = maybe_restart(
            RestartPolicy::Ask,
            &mut FixedPrompter::failing(),
            &runner,
            &Interrupts::default(),
        );
        assert_eq!(outcome, RestartOutcome::Skipped);
        assert_eq!(runner.calls(), 0);
    }

    #[test]
    fn runner_error_becomes_failed_outcome() {
        let runner = ScriptedRestartRunner::new(Err("spawn restart command: not found".into()));
        let outcome = maybe_restart(
            RestartPolicy::Always,
            &mut FixedPrompter::answer(true),
            &runner,
            &Interrupts::default(),
        );
        assert!(matches!(outcome, RestartOutcome::Failed(ref msg) if msg.contains("not found")));
        assert!(outcome.is_failure());
    }

    fn command_runner(command: &[&str], timeout: Option<Duration>) -> CommandRestartRunner {
        CommandRestartRunner {
            command: command.iter().map(|arg| arg.to_string()).collect(),
            timeout,
            interrupts: Interrupts::default(),
        }
    }

    #[cfg(unix)]
    #[test]
    fn command_exit_status_maps_to_outcome() {
        assert_eq!(
            command_runner(&["sh", "-c", "exit 0"], None)
                .run()
                .expect("run"),
            RestartOutcome::Succeeded
        );
        assert_eq!(
            command_runner(&["sh", "-c", "exit 3"], None)
                .run()
                .expect("run"),
            RestartOutcome::Failed("exit code 3".to_string())
        );
    }

    #[cfg(unix)]
    #[test]
    fn command_timeout_kills_and_fails() {
        let outcome = command_runner(&["sleep", "5"], Some(Duration::from_millis(100)))
            .run()
            .expect("run");
        assert!(matches!(outcome, RestartOutcome::Failed(ref msg) if msg.starts_with("timed out")));
    }

    #[cfg(unix)]
    #[test]
    fn signal_during_command_is_interrupted() {
        let runner = command_runner(&["sh", "-c", "exit 0"], None);
        runner.interrupts.enter(Phase::Restarting);
        runner.interrupts.signal();
        assert_eq!(runner.run().expect("run"), RestartOutcome::Interrupted);
        assert!(!runner.interrupts.take_interrupted());
    }

    #[test]
    fn missing_program_is_an_error() {
        let err = command_runner(&["/nonexistent/Restart.sh"], None)
            .run()
            .expect_err("spawn fails");
        assert!(format!("{err:#}").contains("spawn restart command"));
    }
}
