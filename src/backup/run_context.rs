//! The immutable context of one backup run.
//!
//! [`RunContext::resolve`] turns validated run parameters and the loaded
//! configuration into every path and setting a run needs. Nothing touches the
//! filesystem until [`ensure_directories`] is called.

use crate::backup::app_config::AppConfig;
use crate::backup::command::database::{DatabaseBackend, DatabaseCredentials};
use crate::backup::command::remote::RemoteEndpoint;
use crate::backup::compress::CompressorConfig;
use crate::backup::file_ext::FileExtProvider;
use crate::backup::function_path;
use crate::backup::orchestrator::FailurePolicy;
use crate::backup::params::{BackupType, RunParams};
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::{convert_error_vec, Result};
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::validate::ensure_dir;
use chrono::{DateTime, TimeZone};
use function_name::named;
use getset::Getters;
use itertools::Itertools;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::Level;

/// Timestamp format used in log banners.
pub static DATE_FORMAT: &str = "%d/%m/%Y-%H:%M";

static TAR_FILE_EXT: OnceLock<Arc<str>> = OnceLock::new();

/// How the run reaches its copy directory and database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionMode {
    Local,
    Remote(RemoteEndpoint),
}

impl ExecutionMode {
    pub fn is_remote(&self) -> bool {
        matches!(self, ExecutionMode::Remote(_))
    }
}

/// Every path derived from the configuration roots and the run name.
#[derive(Clone, Debug, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct RunPaths {
    dir_backup: PathBuf,
    dir_log: PathBuf,
    dir_base: PathBuf,
    dir_mysql: PathBuf,
    dir_postgresql: PathBuf,
    dir_sync: PathBuf,
    dir_diff: PathBuf,
    /// Directory of the selected backend, if any.
    dir_db: Option<PathBuf>,
    /// `<dir_db>/<name>.sql`, if a backend is selected.
    db_file: Option<PathBuf>,
    log_last: PathBuf,
    log_full: PathBuf,
    exclude_file: PathBuf,
}

impl RunPaths {
    fn derive(name: &str, backend: DatabaseBackend, config: &AppConfig) -> Self {
        let dir_backup = config.dir.dir_backup.clone();
        let dir_log = config.dir.dir_log.clone();
        let dir_base = dir_backup.join(name);
        let dir_db = backend.dir_name().map(|d| dir_base.join(d));
        let db_file = dir_db.as_ref().map(|d| d.join(format!("{name}.sql")));

        Self {
            dir_mysql: dir_base.join("mysql"),
            dir_postgresql: dir_base.join("postgresql"),
            dir_sync: dir_base.join("sync"),
            dir_diff: dir_base.join("diff"),
            dir_db,
            db_file,
            log_last: dir_log.join(format!("{name}.log")),
            log_full: dir_log.join(format!("{name}.full.log")),
            exclude_file: config.config.exclude_file.clone(),
            dir_backup,
            dir_log,
            dir_base,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct RunContext {
    name: String,
    mode: ExecutionMode,
    backend: DatabaseBackend,
    credentials: DatabaseCredentials,
    /// Number of dump generations, and days of diff history, to keep.
    retention_depth: u32,
    copy_dir: PathBuf,
    paths: RunPaths,
    verbosity: Level,
    failure_policy: FailurePolicy,
    compressor: CompressorConfig,
    /// Run start, formatted with [`DATE_FORMAT`].
    date: String,
}

impl RunContext {
    /// Builds the context of one run.
    ///
    /// The parameters are validated first, so an invalid combination never
    /// produces a context.
    pub fn resolve<T: TimeZone>(
        params: &RunParams,
        config: &AppConfig,
        now: DateTime<T>,
    ) -> Result<Self>
    where
        T::Offset: Display,
    {
        params.validate_arguments()?;

        let mode = match (params.backup_type, &params.serv, &params.user) {
            (BackupType::Local, _, _) => ExecutionMode::Local,
            (BackupType::Remote, Some(host), Some(user)) => ExecutionMode::Remote(
                RemoteEndpoint::builder()
                    .host(host.as_str())
                    .user(user.as_str())
                    .port(params.port)
                    .build(),
            ),
            (BackupType::Remote, _, _) => {
                return Err(Error::argument_validation(
                    crate::backup::params::ERROR_PARAMS_REQUIRED_REMOTE,
                ))
            }
        };
        let backend = params.db_server.unwrap_or_default();
        let credentials = DatabaseCredentials::builder()
            .maybe_user(params.db_user.clone())
            .maybe_password(params.db_pass.clone())
            .maybe_name(params.db_name.clone())
            .build();

        Ok(Self {
            paths: RunPaths::derive(&params.name, backend, config),
            name: params.name.clone(),
            mode,
            backend,
            credentials,
            retention_depth: config.config.backup_days,
            copy_dir: params.copy_dir.clone(),
            verbosity: if config.config.develop {
                Level::DEBUG
            } else {
                Level::INFO
            },
            failure_policy: config.config.on_stage_failure,
            compressor: config.compressor.clone(),
            date: now.format(DATE_FORMAT).to_string(),
        })
    }

    /// Loads the configuration at `config_path` and resolves the run.
    ///
    /// Arguments are checked before the configuration is read.
    pub fn load<P: AsRef<Path>, T: TimeZone>(
        params: &RunParams,
        config_path: P,
        now: DateTime<T>,
    ) -> Result<Self>
    where
        T::Offset: Display,
    {
        params.validate_arguments()?;
        let config = AppConfig::load(config_path)?;
        Self::resolve(params, &config, now)
    }

    /// Directory the differential backup reads from.
    ///
    /// Remote runs back up the local mirror left by the sync stage.
    pub fn diff_source(&self) -> &Path {
        match self.mode {
            ExecutionMode::Local => &self.copy_dir,
            ExecutionMode::Remote(_) => &self.paths.dir_sync,
        }
    }

    /// Archive extension of the dump generations, `tar` plus the compressor's.
    pub fn archive_ext(&self) -> Arc<str> {
        self.file_ext().unwrap_or_else(|| "tar".into())
    }
}

impl FileExtProvider for RunContext {
    fn file_ext(&self) -> Option<Arc<str>> {
        Some(
            std::iter::once(TAR_FILE_EXT.get_or_init(|| "tar".into()).clone())
                .chain(self.compressor.file_ext())
                .join(".")
                .into(),
        )
    }
}

/// Directories a run writes into, in creation order.
pub fn required_directories(ctx: &RunContext) -> Vec<&Path> {
    let paths = ctx.paths();
    let mut dirs = vec![
        paths.dir_log().as_path(),
        paths.dir_base().as_path(),
        paths.dir_diff().as_path(),
    ];
    if ctx.mode().is_remote() {
        dirs.push(paths.dir_sync());
    }
    if let Some(dir_db) = paths.dir_db() {
        dirs.push(dir_db);
    }
    dirs
}

/// Creates every directory the run needs that does not exist yet.
///
/// Idempotent: existing directories and their content are left alone. Returns
/// the directories actually created. All directories are attempted before the
/// collected failures are reported.
#[named]
pub fn ensure_directories(ctx: &RunContext) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    let mut errors = Vec::new();
    for dir in required_directories(ctx) {
        match ensure_dir(dir) {
            Ok(true) => created.push(dir.to_path_buf()),
            Ok(false) => {}
            Err(e) => {
                errors.push(Error::from(e).add_msg(format!("Cannot create directory {:?}", dir)))
            }
        }
    }
    convert_error_vec(errors).add_fn_name(function_path!())?;
    Ok(created)
}
