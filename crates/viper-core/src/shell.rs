//! Explicitly owned handle to a privileged shell.
//!
//! A [`ShellSession`] is created by whoever needs privileged file access and passed to the
//! code that uses it. Clones share one lock count; commands only run while the count is above
//! zero, and the session is torn down when the last holder releases it.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::ShellError;

#[derive(Debug, Default)]
struct SessionState {
    locks: usize,
    commands_run: usize,
}

/// Reference-counted shell session (e.g. over `su` or `sh`).
#[derive(Debug, Clone)]
pub struct ShellSession {
    program: String,
    state: Arc<Mutex<SessionState>>,
}

impl ShellSession {
    /// A session that runs commands as `program -c <command>`. Starts released.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Shell program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Take a lock; returns the new count.
    pub fn acquire(&self) -> usize {
        let mut state = self.state();
        state.locks += 1;
        state.locks
    }

    /// Drop a lock (floored at zero); returns the new count.
    pub fn release(&self) -> usize {
        let mut state = self.state();
        state.locks = state.locks.saturating_sub(1);
        if state.locks == 0 && state.commands_run > 0 {
            debug!(program = %self.program, commands = state.commands_run, "shell session closed");
            state.commands_run = 0;
        }
        state.locks
    }

    /// Current lock count.
    pub fn lock_count(&self) -> usize {
        self.state().locks
    }

    /// Returns `true` while at least one lock is held.
    pub fn is_acquired(&self) -> bool {
        self.lock_count() > 0
    }

    /// Run `command` and return its standard output.
    pub fn run(&self, command: &str) -> Result<Vec<u8>, ShellError> {
        self.run_with_input(command, None)
    }

    /// Contents of `path`, read through the shell.
    pub fn read_file(&self, path: &str) -> Result<Vec<u8>, ShellError> {
        self.run(&format!("cat {}", quote(path)))
    }

    /// Replace the contents of `path` with `bytes`, written through the shell.
    pub fn write_file(&self, path: &str, bytes: &[u8]) -> Result<(), ShellError> {
        self.run_with_input(&format!("cat > {}", quote(path)), Some(bytes))
            .map(|_| ())
    }

    fn run_with_input(&self, command: &str, input: Option<&[u8]>) -> Result<Vec<u8>, ShellError> {
        if !self.is_acquired() {
            return Err(ShellError::NotAcquired);
        }
        debug!(program = %self.program, command, "shell command");

        let mut child = Command::new(&self.program)
            .arg("-c")
            .arg(command)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ShellError::Spawn)?;

        if let (Some(bytes), Some(mut stdin)) = (input, child.stdin.take()) {
            stdin.write_all(bytes).map_err(ShellError::Spawn)?;
        }
        let output = child.wait_with_output().map_err(ShellError::Spawn)?;
        self.state().commands_run += 1;

        if !output.status.success() {
            return Err(ShellError::Failed {
                command: command.to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Quote `arg` for a POSIX shell.
pub fn quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_count_is_shared_and_floored() {
        let session = ShellSession::new("sh");
        let other = session.clone();
        assert_eq!(session.acquire(), 1);
        assert_eq!(other.acquire(), 2);
        assert_eq!(session.release(), 1);
        assert_eq!(other.release(), 0);
        assert_eq!(other.release(), 0);
        assert!(!session.is_acquired());
    }

    #[test]
    fn test_run_requires_acquire() {
        let session = ShellSession::new("sh");
        assert!(matches!(session.run("true"), Err(ShellError::NotAcquired)));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("a b"), "'a b'");
        assert_eq!(quote("it's"), r"'it'\''s'");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_and_failure() {
        let session = ShellSession::new("sh");
        session.acquire();
        assert_eq!(session.run("printf hi").unwrap(), b"hi");
        assert!(matches!(
            session.run("exit 3"),
            Err(ShellError::Failed { status: Some(3), .. })
        ));
        session.release();
    }

    #[cfg(unix)]
    #[test]
    fn test_file_round_trip_through_shell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("with space.txt");
        let path = path.to_str().unwrap();

        let session = ShellSession::new("sh");
        session.acquire();
        session.write_file(path, b"secret\n").unwrap();
        assert_eq!(session.read_file(path).unwrap(), b"secret\n");
    }
}
