//! Composition of the external commands run by each backup stage.
//!
//! Commands are assembled as a program plus an argument vector and an output
//! redirection; nothing here builds a local shell string or executes anything.
//! Composition is a pure function of the [`RunContext`].

pub mod database;
pub mod files;
pub mod remote;

use crate::backup::redacted::{RedactedString, REDACTED_SECRET};
use crate::backup::run_context::{ExecutionMode, RunContext};
use derive_more::Display;
use itertools::Itertools;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Lowest scheduling priority, used for the database dump.
pub static NICE_LEVEL: &str = "20";

/// A logical operation that maps to one external command.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Operation {
    #[display("database dump")]
    DatabaseDump,
    #[display("rsync copy")]
    Sync,
    #[display("rdiff-backup copy")]
    DiffBackup,
    #[display("rdiff-backup prune")]
    DiffPrune,
}

/// One argument of a composed command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandArg {
    Plain(String),
    /// An argument carrying a credential; rendered as `shown` when displayed.
    Secret {
        shown: String,
        value: RedactedString,
    },
}

impl CommandArg {
    pub fn secret(prefix: &str, secret: &RedactedString) -> Self {
        CommandArg::Secret {
            shown: format!("{prefix}{REDACTED_SECRET}"),
            value: RedactedString::builder()
                .inner(format!("{prefix}{}", secret.inner()))
                .build(),
        }
    }

    /// The real argument value handed to the process.
    pub fn expose(&self) -> &str {
        match self {
            CommandArg::Plain(s) => s,
            CommandArg::Secret { value, .. } => value.inner(),
        }
    }
}

impl Display for CommandArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandArg::Plain(s) => f.write_str(s),
            CommandArg::Secret { shown, .. } => f.write_str(shown),
        }
    }
}

impl From<&str> for CommandArg {
    fn from(value: &str) -> Self {
        CommandArg::Plain(value.to_string())
    }
}

impl From<String> for CommandArg {
    fn from(value: String) -> Self {
        CommandArg::Plain(value)
    }
}

impl From<&Path> for CommandArg {
    fn from(value: &Path) -> Self {
        CommandArg::Plain(value.display().to_string())
    }
}

impl From<&PathBuf> for CommandArg {
    fn from(value: &PathBuf) -> Self {
        CommandArg::from(value.as_path())
    }
}

impl From<PathBuf> for CommandArg {
    fn from(value: PathBuf) -> Self {
        CommandArg::from(value.as_path())
    }
}

/// Where the standard streams of a command go. Always a local file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Redirect {
    Inherit,
    /// `> path`: standard output truncates and writes the file.
    StdoutTo(PathBuf),
    /// `>> path 2>&1`: standard output and error appended to the file.
    AppendAll(PathBuf),
}

/// A fully composed external command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedCommand {
    pub program: String,
    pub args: Vec<CommandArg>,
    pub redirect: Redirect,
}

impl ComposedCommand {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            redirect: Redirect::Inherit,
        }
    }

    pub fn arg<A: Into<CommandArg>>(mut self, arg: A) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I: IntoIterator<Item = A>, A: Into<CommandArg>>(mut self, args: I) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn redirect(mut self, redirect: Redirect) -> Self {
        self.redirect = redirect;
        self
    }

    /// Runs this command under `nice -n 20`.
    pub fn niced(self) -> Self {
        ComposedCommand::new("nice")
            .args(["-n", NICE_LEVEL])
            .arg(self.program)
            .args(self.args)
            .redirect(self.redirect)
    }

    /// Applies the execution wrapper for the run's mode.
    ///
    /// Local mode leaves the command unchanged; remote mode runs it through
    /// `ssh` on the configured endpoint. The redirection is kept on the local side.
    pub fn wrap_for(self, mode: &ExecutionMode) -> Self {
        match mode {
            ExecutionMode::Local => self,
            ExecutionMode::Remote(endpoint) => endpoint.wrap(self),
        }
    }

    /// Exposed argument values, as handed to the process.
    pub fn exposed_args(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(CommandArg::expose)
    }
}

impl Display for ComposedCommand {
    /// Shell-like rendering for the run log, with credentials redacted.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        if !self.args.is_empty() {
            write!(f, " {}", self.args.iter().join(" "))?;
        }
        match &self.redirect {
            Redirect::Inherit => Ok(()),
            Redirect::StdoutTo(path) => write!(f, " > {}", path.display()),
            Redirect::AppendAll(path) => write!(f, " >> {} 2>&1", path.display()),
        }
    }
}

/// Builds the command for `operation` in the given run.
///
/// Returns `None` when the operation does not apply to the run: a database
/// dump without a backend, or a sync in local mode.
pub fn compose(operation: Operation, ctx: &RunContext) -> Option<ComposedCommand> {
    match operation {
        Operation::DatabaseDump => database::dump_command(ctx),
        Operation::Sync => files::sync_command(ctx),
        Operation::DiffBackup => Some(files::diff_backup_command(ctx)),
        Operation::DiffPrune => Some(files::diff_prune_command(ctx)),
    }
}
