//! Raw run parameters as given on the command line, and their validation.

use crate::backup::command::database::DatabaseBackend;
use crate::backup::command::remote::DEFAULT_SSH_PORT;
use crate::backup::redacted::RedactedString;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::validate::validate_run_name;
use bon::Builder;
use clap::{Args, ValueEnum};
use derive_more::Display;
use std::path::PathBuf;

pub static ERROR_PARAMS_REQUIRED_REMOTE: &str =
    "For \"remote\" type the parameters --serv and --user are required";
pub static ERROR_PARAMS_NOT_ALLOWED_SERVER: &str =
    "Parameters --db-user or --db-pass are not allowed if --db-server is not present";
pub static ERROR_DBPASS_NOT_ALLOWED_POSTGRESQL: &str =
    "If --db-server value is \"postgresql\" the --db-pass parameter is not allowed. You must use \".pgpass\" file.";
pub static ERROR_PARAMS_REQUIRED_POSTGRESQL: &str =
    "If --db-server value is \"postgresql\" the --db-user and --db-name parameters are required.";

/// Where the files to back up live.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, ValueEnum)]
pub enum BackupType {
    /// The copy directory is on this host
    #[display("local")]
    Local,
    /// The copy directory and database are reached over ssh
    #[display("remote")]
    Remote,
}

#[derive(Args, Clone, Debug, Builder)]
pub struct RunParams {
    /// Type of backup
    #[arg(value_enum)]
    pub backup_type: BackupType,

    /// Copy name, used to name every backup and log path
    #[arg(short, long)]
    #[builder(into)]
    pub name: String,

    /// Remote server host
    #[arg(short, long)]
    #[builder(into)]
    pub serv: Option<String>,

    /// Remote server user
    #[arg(short, long)]
    #[builder(into)]
    pub user: Option<String>,

    /// Remote server ssh port
    #[arg(short, long, default_value_t = DEFAULT_SSH_PORT)]
    #[builder(default = DEFAULT_SSH_PORT)]
    pub port: u16,

    /// Directory to copy
    #[arg(short, long)]
    #[builder(into)]
    pub copy_dir: PathBuf,

    /// Activate database backup and select the database server
    #[arg(short = 'b', long, value_enum)]
    pub db_server: Option<DatabaseBackend>,

    /// Database user
    #[arg(short = 'e', long)]
    #[builder(into)]
    pub db_user: Option<String>,

    /// Database user password (MySQL only)
    #[arg(short = 'w', long)]
    pub db_pass: Option<RedactedString>,

    /// Database name (PostgreSQL only)
    #[arg(short = 'd', long)]
    #[builder(into)]
    pub db_name: Option<String>,
}

impl RunParams {
    /// Checks the combinations clap cannot express.
    ///
    /// Fails with [`Error::ArgumentValidation`] on the first violated rule.
    pub fn validate_arguments(&self) -> Result<()> {
        validate_run_name(&self.name).map_err(|e| {
            Error::argument_validation(
                e.message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid run name {:?}", self.name)),
            )
        })?;

        if self.backup_type == BackupType::Remote && (self.serv.is_none() || self.user.is_none()) {
            return Err(Error::argument_validation(ERROR_PARAMS_REQUIRED_REMOTE));
        }

        let backend = self.db_server.unwrap_or_default();
        if !backend.is_selected() && (self.db_user.is_some() || self.db_pass.is_some()) {
            return Err(Error::argument_validation(ERROR_PARAMS_NOT_ALLOWED_SERVER));
        }

        if backend == DatabaseBackend::PostgreSql {
            if self.db_pass.is_some() {
                return Err(Error::argument_validation(ERROR_DBPASS_NOT_ALLOWED_POSTGRESQL));
            }
            if self.db_user.is_none() || self.db_name.is_none() {
                return Err(Error::argument_validation(ERROR_PARAMS_REQUIRED_POSTGRESQL));
            }
        }

        Ok(())
    }
}
