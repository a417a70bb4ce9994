//! Execution of composed commands as blocking subprocesses.

use crate::backup::command::{ComposedCommand, Redirect};
use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use function_name::named;
use std::fs::{File, OpenOptions};
use std::process::{Command, Stdio};

/// Exit status of a finished command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandStatus {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for CommandStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Runs a composed command to completion.
///
/// An `Err` means the command could not be started at all; a command that ran
/// and failed is an `Ok` with a non-zero status.
pub trait CommandRunner {
    fn run(&self, command: &ComposedCommand) -> Result<CommandStatus>;
}

/// Runs commands as real subprocesses, blocking until they exit.
///
/// Arguments go straight to the program; no local shell is involved.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn build(command: &ComposedCommand) -> Result<Command> {
        let mut process = Command::new(&command.program);
        process.args(command.exposed_args());

        match &command.redirect {
            Redirect::Inherit => {}
            Redirect::StdoutTo(path) => {
                let file = File::create(path)
                    .map_err(Error::from)
                    .add_msg(format!("Cannot open {:?} for output", path))?;
                process.stdout(Stdio::from(file));
            }
            Redirect::AppendAll(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(Error::from)
                    .add_msg(format!("Cannot open {:?} for appending", path))?;
                process.stderr(Stdio::from(file.try_clone()?));
                process.stdout(Stdio::from(file));
            }
        }

        Ok(process)
    }
}

impl CommandRunner for ProcessRunner {
    #[named]
    fn run(&self, command: &ComposedCommand) -> Result<CommandStatus> {
        let status = Self::build(command)?
            .status()
            .map_err(Error::from)
            .add_msg(format!("Failed to start {:?}", command.program))
            .add_fn_name(function_path!())?;
        Ok(status.into())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_success_and_failure_status() {
        assert!(ProcessRunner.run(&ComposedCommand::new("true")).unwrap().success());

        let status = ProcessRunner.run(&ComposedCommand::new("false")).unwrap();
        assert!(!status.success());
        assert_eq!(status.code, Some(1));
    }

    #[test]
    fn test_missing_program_is_error() {
        let result = ProcessRunner.run(&ComposedCommand::new("definitely-not-a-real-program-42"));
        assert!(result.is_err());
    }

    #[test]
    fn test_stdout_redirect_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("acct1.sql");
        std::fs::write(&out, "stale content that is longer").unwrap();

        let command = ComposedCommand::new("echo")
            .arg("fresh")
            .redirect(Redirect::StdoutTo(out.clone()));
        assert!(ProcessRunner.run(&command).unwrap().success());

        assert_eq!(std::fs::read_to_string(out).unwrap(), "fresh\n");
    }

    #[test]
    fn test_append_redirect_keeps_previous_content_and_captures_stderr() {
        let temp_dir = TempDir::new().unwrap();
        let log = temp_dir.path().join("acct1.log");
        std::fs::write(&log, "INFO previous\n").unwrap();

        let command = ComposedCommand::new("ls")
            .arg(temp_dir.path().join("missing"))
            .redirect(Redirect::AppendAll(log.clone()));
        let status = ProcessRunner.run(&command).unwrap();
        assert!(!status.success());

        let content = std::fs::read_to_string(log).unwrap();
        assert!(content.starts_with("INFO previous\n"));
        assert!(content.len() > "INFO previous\n".len());
    }

    #[test]
    fn test_arguments_are_not_shell_interpreted() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out");

        let command = ComposedCommand::new("echo")
            .arg("$(touch pwned); *")
            .redirect(Redirect::StdoutTo(out.clone()));
        ProcessRunner.run(&command).unwrap();

        assert_eq!(std::fs::read_to_string(out).unwrap(), "$(touch pwned); *\n");
    }
}
