//! Terminal streams, TTY state, colours and the output pager

use crate::config::defaults::FORCE_TTY_ENV;
use crate::config::Environment;
use crate::error::{CliError, Result};
use console::style;
use std::io::{self, IsTerminal, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// stdin/stdout/stderr plus what we know about the terminal behind them
pub struct IoStreams {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    input: Box<dyn Read + Send>,

    stdin_tty: bool,
    stdout_tty: bool,
    stderr_tty: bool,
    color: bool,
    never_prompt: bool,

    pager: Option<String>,
    pager_process: Option<Child>,
    less_set: bool,
}

impl std::fmt::Debug for IoStreams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IoStreams")
            .field("stdin_tty", &self.stdin_tty)
            .field("stdout_tty", &self.stdout_tty)
            .field("stderr_tty", &self.stderr_tty)
            .field("color", &self.color)
            .field("never_prompt", &self.never_prompt)
            .field("pager", &self.pager)
            .finish_non_exhaustive()
    }
}

impl IoStreams {
    /// Streams attached to the real process stdio
    pub fn system(env: &Environment) -> Self {
        let stdout_tty = console::Term::stdout().is_term() || env.get(FORCE_TTY_ENV).is_some();
        let color = color_enabled(env, stdout_tty);

        Self {
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
            input: Box::new(io::stdin()),
            stdin_tty: io::stdin().is_terminal(),
            stdout_tty,
            stderr_tty: console::Term::stderr().is_term(),
            color,
            never_prompt: false,
            pager: None,
            pager_process: None,
            less_set: env.lookup("LESS").is_some(),
        }
    }

    /// Streams writing into in-memory buffers; nothing is a terminal
    pub fn test() -> (Self, TestBuffer, TestBuffer) {
        let out = TestBuffer::default();
        let err = TestBuffer::default();
        let io = Self {
            out: Box::new(out.clone()),
            err: Box::new(err.clone()),
            input: Box::new(io::empty()),
            stdin_tty: false,
            stdout_tty: false,
            stderr_tty: false,
            color: false,
            never_prompt: false,
            pager: None,
            pager_process: None,
            less_set: false,
        };
        (io, out, err)
    }

    /// Replace stdin with fixed input
    #[must_use]
    pub fn with_stdin(mut self, data: &str) -> Self {
        self.input = Box::new(io::Cursor::new(data.as_bytes().to_vec()));
        self
    }

    /// Standard output
    pub fn out(&mut self) -> &mut dyn Write {
        &mut *self.out
    }

    /// Standard error
    pub fn err_out(&mut self) -> &mut dyn Write {
        &mut *self.err
    }

    /// Read all of stdin
    pub fn read_stdin(&mut self) -> Result<String> {
        let mut buf = String::new();
        self.input
            .read_to_string(&mut buf)
            .map_err(|e| CliError::Io(format!("failed to read from standard input: {e}")))?;
        Ok(buf)
    }

    /// Whether stdin is a terminal
    pub const fn is_stdin_tty(&self) -> bool {
        self.stdin_tty
    }

    /// Whether stdout is a terminal
    pub const fn is_stdout_tty(&self) -> bool {
        self.stdout_tty
    }

    /// Whether stderr is a terminal
    pub const fn is_stderr_tty(&self) -> bool {
        self.stderr_tty
    }

    /// Override stdin terminal detection
    pub fn set_stdin_tty(&mut self, tty: bool) {
        self.stdin_tty = tty;
    }

    /// Override stdout terminal detection
    pub fn set_stdout_tty(&mut self, tty: bool) {
        self.stdout_tty = tty;
    }

    /// Override stderr terminal detection
    pub fn set_stderr_tty(&mut self, tty: bool) {
        self.stderr_tty = tty;
    }

    /// Disable interactive prompts regardless of the terminal
    pub fn set_never_prompt(&mut self, never: bool) {
        self.never_prompt = never;
    }

    /// Whether interactive prompts may be shown
    pub const fn can_prompt(&self) -> bool {
        !self.never_prompt && self.stdin_tty && self.stdout_tty
    }

    /// Whether output should be coloured
    pub const fn color_enabled(&self) -> bool {
        self.color
    }

    /// Program to page output through; empty or `cat` disables paging
    pub fn set_pager(&mut self, pager: Option<String>) {
        self.pager = pager;
    }

    /// Configured pager
    pub fn pager(&self) -> Option<&str> {
        self.pager.as_deref()
    }

    /// Redirect stdout through the pager when stdout is a terminal
    pub fn start_pager(&mut self) -> Result<()> {
        let Some(pager) = self.pager.as_deref().filter(|p| !p.is_empty() && *p != "cat") else {
            return Ok(());
        };
        if !self.stdout_tty {
            return Ok(());
        }

        let argv = shlex::split(pager)
            .ok_or_else(|| CliError::InvalidArgument(format!("could not parse pager: {pager}")))?;
        let Some((program, args)) = argv.split_first() else {
            return Ok(());
        };

        let mut command = Command::new(program);
        command.args(args).stdin(Stdio::piped());
        if !self.less_set {
            command.env("LESS", "FRX");
        }

        let mut child = command
            .spawn()
            .map_err(|e| CliError::Io(format!("failed to start pager {program}: {e}")))?;
        if let Some(stdin) = child.stdin.take() {
            self.out = Box::new(stdin);
        }
        debug!(%pager, "started pager");
        self.pager_process = Some(child);
        Ok(())
    }

    /// Close the pager's input and wait for it to exit
    pub fn stop_pager(&mut self) {
        let Some(mut child) = self.pager_process.take() else {
            return;
        };
        let _ = self.out.flush();
        self.out = Box::new(io::stdout());
        if let Err(e) = child.wait() {
            debug!(error = %e, "pager did not exit cleanly");
        }
    }

    // Colour scheme

    /// `✓` in green
    pub fn success_icon(&self) -> String {
        self.paint("✓", |s| s.green())
    }

    /// `!` in yellow
    pub fn warning_icon(&self) -> String {
        self.paint("!", |s| s.yellow())
    }

    /// `X` in red
    pub fn failure_icon(&self) -> String {
        self.paint("X", |s| s.red())
    }

    /// Bold text
    pub fn bold(&self, text: &str) -> String {
        self.paint(text, |s| s.bold())
    }

    /// Yellow text
    pub fn yellow(&self, text: &str) -> String {
        self.paint(text, |s| s.yellow())
    }

    fn paint<'a>(
        &self,
        text: &'a str,
        f: impl FnOnce(console::StyledObject<&'a str>) -> console::StyledObject<&'a str>,
    ) -> String {
        if self.color {
            f(style(text)).force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }
}

fn color_enabled(env: &Environment, stdout_tty: bool) -> bool {
    if env.lookup("NO_COLOR").is_some() {
        return false;
    }
    if env.get("CLICOLOR_FORCE").is_some_and(|v| v != "0") {
        return true;
    }
    if env.get("CLICOLOR") == Some("0") {
        return false;
    }
    stdout_tty
}

/// Cloneable in-memory writer used by [`IoStreams::test`]
#[derive(Debug, Clone, Default)]
pub struct TestBuffer(Arc<Mutex<Vec<u8>>>);

impl TestBuffer {
    /// Everything written so far
    pub fn contents(&self) -> String {
        self.0
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }
}

impl Write for TestBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self
            .0
            .lock()
            .map_err(|_| io::Error::other("test buffer lock poisoned"))?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_streams_capture_output() {
        let (mut io, out, err) = IoStreams::test();
        writeln!(io.out(), "hello").unwrap();
        writeln!(io.err_out(), "oops").unwrap();
        assert_eq!(out.contents(), "hello\n");
        assert_eq!(err.contents(), "oops\n");
    }

    #[test]
    fn stdin_can_be_supplied() {
        let (io, _, _) = IoStreams::test();
        let mut io = io.with_stdin("token\n");
        assert_eq!(io.read_stdin().unwrap(), "token\n");
    }

    #[test]
    fn prompting_needs_terminals() {
        let (mut io, _, _) = IoStreams::test();
        assert!(!io.can_prompt());

        io.set_stdin_tty(true);
        io.set_stdout_tty(true);
        assert!(io.can_prompt());

        io.set_never_prompt(true);
        assert!(!io.can_prompt());
    }

    #[test]
    fn colour_toggles() {
        let env = Environment::from_pairs([("NO_COLOR", "")]);
        assert!(!color_enabled(&env, true));

        let env = Environment::from_pairs([("CLICOLOR", "0")]);
        assert!(!color_enabled(&env, true));

        let env = Environment::from_pairs([("CLICOLOR_FORCE", "1")]);
        assert!(color_enabled(&env, false));

        assert!(color_enabled(&Environment::default(), true));
        assert!(!color_enabled(&Environment::default(), false));
    }

    #[test]
    fn icons_are_plain_without_colour() {
        let (io, _, _) = IoStreams::test();
        assert_eq!(io.success_icon(), "✓");
        assert_eq!(io.warning_icon(), "!");
        assert_eq!(io.bold("x"), "x");
    }

    #[test]
    fn less_comes_from_the_snapshot() {
        let io = IoStreams::system(&Environment::from_pairs([("LESS", "")]));
        assert!(io.less_set);
        let io = IoStreams::system(&Environment::default());
        assert!(!io.less_set);
    }

    #[test]
    fn pager_is_skipped_off_terminal() {
        let (mut io, _, _) = IoStreams::test();
        io.set_pager(Some("less".to_string()));
        io.start_pager().unwrap();
        writeln!(io.out(), "still buffered").unwrap();
        io.stop_pager();
    }
}
