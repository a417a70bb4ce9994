//! The per-run log files.
//!
//! Each run writes a "last" log, truncated at start, which receives every
//! `tracing` event of the run as well as the output of the sync and diff
//! commands. When the run ends the whole "last" log is appended to the
//! cumulative "full" log.

use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::run_context::RunContext;
use function_name::named;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;

/// Weight of a separator banner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeparatorLevel {
    /// Run begin and end.
    Primary,
    /// Stage headers.
    Secondary,
}

/// `===== <date> - <name> - <text> =====` or `+++ <date> - <name> - <text> +++`.
pub fn separator_line(level: SeparatorLevel, date: &str, name: &str, text: &str) -> String {
    let fence = match level {
        SeparatorLevel::Primary => "=====",
        SeparatorLevel::Secondary => "+++",
    };
    format!("{fence} {date} - {name} - {text} {fence}")
}

/// Routes the run's `tracing` events to the "last" log while alive.
///
/// The file sink is installed as the thread default subscriber, so it only
/// captures events of the thread that started it.
pub struct RunLogger {
    name: String,
    date: String,
    log_last: PathBuf,
    log_full: PathBuf,
    guard: Option<DefaultGuard>,
}

impl RunLogger {
    /// Truncates the "last" log and makes it the sink for this run.
    #[named]
    pub fn start(ctx: &RunContext) -> Result<Self> {
        let paths = ctx.paths();
        let log_last = paths.log_last().clone();

        File::create(&log_last)
            .map_err(Error::from)
            .add_msg(format!("Cannot create log {:?}", log_last))
            .add_fn_name(function_path!())?;
        // append mode, so command output redirected into the same file lands after our lines
        let sink = OpenOptions::new()
            .append(true)
            .open(&log_last)
            .map_err(Error::from)
            .add_msg(format!("Cannot open log {:?}", log_last))
            .add_fn_name(function_path!())?;

        let subscriber = tracing_subscriber::fmt()
            .with_writer(Mutex::new(sink))
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(*ctx.verbosity())
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);

        Ok(Self {
            name: ctx.name().clone(),
            date: ctx.date().clone(),
            log_last,
            log_full: paths.log_full().clone(),
            guard: Some(guard),
        })
    }

    pub fn separator<S: AsRef<str>>(&self, level: SeparatorLevel, text: S) {
        tracing::info!(
            "{}",
            separator_line(level, &self.date, &self.name, text.as_ref())
        );
    }

    /// Closes the run: end banner, blank line, then "last" appended to "full".
    #[named]
    pub fn end(mut self) -> Result<()> {
        self.separator(SeparatorLevel::Primary, "BACKUP END");
        tracing::info!("");
        drop(self.guard.take());

        let mut last = File::open(&self.log_last)
            .map_err(Error::from)
            .add_msg(format!("Cannot read log {:?}", self.log_last))?;
        let mut full = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_full)
            .map_err(Error::from)
            .add_msg(format!("Cannot open log {:?}", self.log_full))?;
        std::io::copy(&mut last, &mut full)
            .map_err(Error::from)
            .add_msg(format!("Cannot append {:?} to {:?}", self.log_last, self.log_full))
            .add_fn_name(function_path!())?;
        Ok(())
    }
}
