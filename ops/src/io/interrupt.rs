//! SIGINT/SIGTERM handling around the restart prompt and subprocess.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use anyhow::{Context, Result};
use tracing::debug;

use crate::exit_codes;

/// Conventional exit status for a process ended by SIGINT.
const INTERRUPTED_EXIT: i32 = 130;

/// What the process is doing when a signal arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Phase {
    /// Not in an interruptible section; a signal ends the process.
    Idle = 0,
    /// Waiting on the restart question; a signal skips the restart.
    Prompting = 1,
    /// Restart command running; a signal is recorded for the caller.
    Restarting = 2,
}

impl Phase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Prompting,
            2 => Self::Restarting,
            _ => Self::Idle,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    phase: AtomicU8,
    interrupted: AtomicBool,
}

/// Interrupt state shared with the signal handler thread.
#[derive(Debug, Clone, Default)]
pub struct Interrupts {
    inner: Arc<Inner>,
}

impl Interrupts {
    /// Install the process-wide handler. May only be called once.
    pub fn install() -> Result<Self> {
        let interrupts = Self::default();
        let handler = interrupts.clone();
        ctrlc::set_handler(move || handler.signal()).context("install interrupt handler")?;
        Ok(interrupts)
    }

    pub fn enter(&self, phase: Phase) {
        debug!(?phase, "interrupt phase");
        self.inner.phase.store(phase as u8, Ordering::SeqCst);
    }

    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.inner.phase.load(Ordering::SeqCst))
    }

    /// Return and clear the "signal seen" flag.
    pub fn take_interrupted(&self) -> bool {
        self.inner.interrupted.swap(false, Ordering::SeqCst)
    }

    /// Handler body. Blocking stdin reads cannot be woken, so an interrupt
    /// at the prompt ends the process here with the success code: the
    /// config change is already saved and the restart is simply skipped.
    pub fn signal(&self) {
        self.inner.interrupted.store(true, Ordering::SeqCst);
        match self.phase() {
            Phase::Prompting => {
                println!("\ninterrupted; restart skipped");
                std::process::exit(exit_codes::OK);
            }
            Phase::Restarting => {}
            Phase::Idle => {
                eprintln!("\ninterrupted");
                std::process::exit(INTERRUPTED_EXIT);
            }
        }
    }
}
