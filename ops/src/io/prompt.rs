//! Yes/no confirmation prompts.

use std::io::{self, BufRead, StdinLock, Stdout, Write};

use anyhow::{Context, Result};

/// Asks the operator a yes/no question. The default answer is "no".
pub trait Prompter {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

/// Line-based prompt over any reader/writer pair.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{question} [y/N]: ").context("write prompt")?;
        self.output.flush().context("flush prompt")?;
        let mut answer = String::new();
        let read = self.input.read_line(&mut answer).context("read answer")?;
        if read == 0 {
            // EOF: keep the terminal tidy and take the default.
            writeln!(self.output).context("write prompt")?;
            return Ok(false);
        }
        Ok(is_affirmative(&answer))
    }
}

/// `y` or `yes` in any case, surrounding whitespace ignored.
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ask(input: &str) -> (bool, String) {
        let mut output = Vec::new();
        let answer = TerminalPrompter::new(input.as_bytes(), &mut output)
            .confirm("Restart the service?")
            .expect("confirm");
        (answer, String::from_utf8(output).expect("utf8"))
    }

    #[test]
    fn affirmative_answers() {
        for answer in ["y", "Y", "yes", " YES \n", "Yes\r\n"] {
            assert!(is_affirmative(answer), "{answer:?}");
        }
        for answer in ["", "n", "no", "yep", "y e s", "\n"] {
            assert!(!is_affirmative(answer), "{answer:?}");
        }
    }

    #[test]
    fn prompt_shows_default_and_reads_one_line() {
        let (answer, output) = ask("y\nn\n");
        assert!(answer);
        assert_eq!(output, "Restart the service? [y/N]: ");
    }

    #[test]
    fn empty_line_takes_default() {
        let (answer, _) = ask("\n");
        assert!(!answer);
    }

    #[test]
    fn eof_takes_default() {
        let (answer, output) = ask("");
        assert!(!answer);
        assert_eq!(output, "Restart the service? [y/N]: \n");
    }
}
