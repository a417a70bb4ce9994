//! Sequencing of the backup stages of one run.
//!
//! A run walks `Init → DirectoriesReady → DatabaseStage? → SyncStage? →
//! DiffStage → Finalized`. The database stage only runs with a selected
//! backend and the sync stage only in remote mode. Every step outcome goes
//! through the run's [`FailurePolicy`].

use crate::backup::command::{compose, Operation};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::retention::GenerationSet;
use crate::backup::run_context::{ensure_directories, RunContext};
use crate::backup::run_log::{RunLogger, SeparatorLevel};
use crate::backup::runner::CommandRunner;
use derive_more::Display;
use getset::Getters;
use serde::{Deserialize, Serialize};

/// What a failed step does to the rest of the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and go on with the next step.
    #[default]
    Continue,
    /// Stop at the first failure and report it.
    Abort,
}

impl FailurePolicy {
    /// Records the outcome of `step` and decides whether the run goes on.
    pub fn apply(self, step: Step, result: Result<()>, report: &mut RunReport) -> Result<()> {
        match result {
            Ok(()) => {
                report.steps.push(StepReport::new(step, StepOutcome::Succeeded));
                Ok(())
            }
            Err(e) => {
                tracing::error!("{step} failed: {e}");
                report
                    .steps
                    .push(StepReport::new(step, StepOutcome::Failed(e.to_string())));
                match self {
                    FailurePolicy::Continue => Ok(()),
                    FailurePolicy::Abort => {
                        tracing::error!("Aborting run after failed {step}");
                        Err(e)
                    }
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum RunState {
    Init,
    DirectoriesReady,
    DatabaseStage,
    SyncStage,
    DiffStage,
    Finalized,
}

impl RunState {
    /// The state following `self` for the given run, skipping stages that do
    /// not apply.
    pub fn next(self, ctx: &RunContext) -> RunState {
        match self {
            RunState::Init => RunState::DirectoriesReady,
            RunState::DirectoriesReady if ctx.backend().is_selected() => RunState::DatabaseStage,
            RunState::DirectoriesReady | RunState::DatabaseStage if ctx.mode().is_remote() => {
                RunState::SyncStage
            }
            RunState::DirectoriesReady | RunState::DatabaseStage | RunState::SyncStage => {
                RunState::DiffStage
            }
            RunState::DiffStage | RunState::Finalized => RunState::Finalized,
        }
    }
}

/// A unit of work whose outcome is recorded.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum Step {
    #[display("{_0}")]
    Command(Operation),
    #[display("dump rotation")]
    Rotation,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct StepReport {
    step: Step,
    outcome: StepOutcome,
}

impl StepReport {
    fn new(step: Step, outcome: StepOutcome) -> Self {
        Self { step, outcome }
    }
}

/// What a finished run went through.
#[derive(Clone, Debug, Default, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct RunReport {
    states: Vec<RunState>,
    steps: Vec<StepReport>,
}

impl RunReport {
    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|r| r.step == step).map(|r| &r.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Failed(_)))
    }
}

pub struct Orchestrator<'a, R: CommandRunner> {
    ctx: &'a RunContext,
    runner: R,
}

impl<'a, R: CommandRunner> Orchestrator<'a, R> {
    pub fn new(ctx: &'a RunContext, runner: R) -> Self {
        Self { ctx, runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Runs every applicable stage in order.
    ///
    /// Fails before any stage when directories cannot be created or the run
    /// log cannot be opened. Stage failures only end the run under
    /// [`FailurePolicy::Abort`]; the run log is closed either way.
    pub fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        report.states.push(RunState::Init);
        let created = ensure_directories(self.ctx)?;

        report.states.push(RunState::DirectoriesReady);
        let logger = RunLogger::start(self.ctx)?;
        logger.separator(SeparatorLevel::Primary, "BACKUP BEGIN");
        for dir in created {
            tracing::info!("Created directory {}", dir.display());
        }
        self.log_context();

        let stages = self.run_stages(&logger, &mut report);
        let ended = logger.end();
        match (stages, ended) {
            (Err(stage), Err(log)) => return Err(stage.chain(log)),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => return Err(e),
            (Ok(()), Ok(())) => {}
        }

        report.states.push(RunState::Finalized);
        Ok(report)
    }

    fn run_stages(&self, logger: &RunLogger, report: &mut RunReport) -> Result<()> {
        let mut state = RunState::DirectoriesReady.next(self.ctx);
        while state != RunState::Finalized {
            report.states.push(state);
            match state {
                RunState::DatabaseStage => self.database_stage(logger, report)?,
                RunState::SyncStage => self.sync_stage(logger, report)?,
                RunState::DiffStage => self.diff_stage(logger, report)?,
                RunState::Init | RunState::DirectoriesReady | RunState::Finalized => {}
            }
            state = state.next(self.ctx);
        }
        Ok(())
    }

    fn database_stage(&self, logger: &RunLogger, report: &mut RunReport) -> Result<()> {
        logger.separator(
            SeparatorLevel::Secondary,
            format!("{} Backup", self.ctx.backend()),
        );
        let dumped = self.execute(Operation::DatabaseDump);
        let succeeded = dumped.is_ok();
        self.policy()
            .apply(Step::Command(Operation::DatabaseDump), dumped, report)?;

        if !succeeded {
            tracing::warn!("Dump failed, previous generations are kept as they are");
            return Ok(());
        }
        let Some(generations) = GenerationSet::for_run(self.ctx) else {
            return Ok(());
        };
        let rotated = generations
            .rotate(self.ctx.compressor())
            .map(|newest| tracing::debug!("New generation {}", newest.display()));
        self.policy().apply(Step::Rotation, rotated, report)
    }

    fn sync_stage(&self, logger: &RunLogger, report: &mut RunReport) -> Result<()> {
        logger.separator(SeparatorLevel::Secondary, Operation::Sync.to_string());
        let synced = self.execute(Operation::Sync);
        self.policy()
            .apply(Step::Command(Operation::Sync), synced, report)
    }

    fn diff_stage(&self, logger: &RunLogger, report: &mut RunReport) -> Result<()> {
        logger.separator(SeparatorLevel::Secondary, Operation::DiffBackup.to_string());
        let copied = self.execute(Operation::DiffBackup);
        self.policy()
            .apply(Step::Command(Operation::DiffBackup), copied, report)?;

        tracing::info!(
            "-- {} {} - Deleting old rdiff-backup copies",
            self.ctx.date(),
            self.ctx.name()
        );
        let pruned = self.execute(Operation::DiffPrune);
        self.policy()
            .apply(Step::Command(Operation::DiffPrune), pruned, report)
    }

    /// Composes and runs one operation, turning a non-zero exit into an error.
    fn execute(&self, operation: Operation) -> Result<()> {
        let Some(command) = compose(operation, self.ctx) else {
            tracing::debug!("Nothing to run for {operation}");
            return Ok(());
        };
        tracing::debug!("{command}");

        let status = self.runner.run(&command)?;
        match status.code {
            Some(code) => tracing::debug!("EXIT: {code}"),
            None => tracing::debug!("EXIT: killed by signal"),
        }
        if status.success() {
            Ok(())
        } else {
            Err(Error::stage_execution(operation, status.code))
        }
    }

    fn policy(&self) -> FailurePolicy {
        *self.ctx.failure_policy()
    }

    fn log_context(&self) {
        let ctx = self.ctx;
        let paths = ctx.paths();
        tracing::debug!("name: {}", ctx.name());
        tracing::debug!("mode: {:?}", ctx.mode());
        tracing::debug!("database: {}", ctx.backend());
        tracing::debug!("copy_dir: {}", ctx.copy_dir().display());
        tracing::debug!("backup_days: {}", ctx.retention_depth());
        for (label, path) in [
            ("dir_backup", paths.dir_backup()),
            ("dir_log", paths.dir_log()),
            ("dir_base", paths.dir_base()),
            ("dir_mysql", paths.dir_mysql()),
            ("dir_postgresql", paths.dir_postgresql()),
            ("dir_sync", paths.dir_sync()),
            ("dir_diff", paths.dir_diff()),
            ("log_last", paths.log_last()),
            ("log_full", paths.log_full()),
            ("exclude_file", paths.exclude_file()),
        ] {
            tracing::debug!("{label}: {}", path.display());
        }
        if let Some(db_file) = paths.db_file() {
            tracing::debug!("db_file: {}", db_file.display());
        }
    }
}
