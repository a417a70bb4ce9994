use crate::backup::command::{CommandArg, ComposedCommand, Redirect};
use crate::backup::redacted::RedactedString;
use crate::backup::run_context::RunContext;
use bon::Builder;
use clap::ValueEnum;
use derive_more::Display;
use getset::Getters;

/// Database server whose dump joins the backup.
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, ValueEnum)]
pub enum DatabaseBackend {
    #[default]
    #[value(skip)]
    #[display("none")]
    None,
    /// MySQL or MariaDB, all databases through `mysqldump`
    #[value(name = "mysql")]
    #[display("MySQL")]
    MySql,
    /// A single PostgreSQL database through `pg_dump`
    #[value(name = "postgresql")]
    #[display("PostgreSQL")]
    PostgreSql,
}

/// Optional credential overrides for the dump tool.
///
/// Whatever is left unset falls back to the tool's own option files
/// (`~/.my.cnf`, `~/.mylogin.cnf`, `~/.pgpass`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Builder, Getters)]
#[getset(get = "pub")]
pub struct DatabaseCredentials {
    #[builder(into)]
    user: Option<String>,
    password: Option<RedactedString>,
    #[builder(into)]
    name: Option<String>,
}

impl DatabaseBackend {
    /// Sub directory of the run's base directory holding the dump and its generations.
    pub fn dir_name(&self) -> Option<&'static str> {
        match self {
            DatabaseBackend::None => None,
            DatabaseBackend::MySql => Some("mysql"),
            DatabaseBackend::PostgreSql => Some("postgresql"),
        }
    }

    pub fn is_selected(&self) -> bool {
        !matches!(self, DatabaseBackend::None)
    }

    /// The bare dump command, without wrapper or redirection.
    pub fn base_dump_command(&self, credentials: &DatabaseCredentials) -> Option<ComposedCommand> {
        match self {
            DatabaseBackend::None => None,
            DatabaseBackend::MySql => {
                let mut command =
                    ComposedCommand::new("mysqldump").args(["--all-databases", "--opt"]);
                if let Some(user) = &credentials.user {
                    command = command.args(["-u", user.as_str()]);
                }
                if let Some(password) = &credentials.password {
                    command = command.arg(CommandArg::secret("-p", password));
                }
                Some(command)
            }
            DatabaseBackend::PostgreSql => {
                // pg_dump reads its password from .pgpass only
                let mut command = ComposedCommand::new("pg_dump")
                    .arg(credentials.name.clone().unwrap_or_default());
                if let Some(user) = &credentials.user {
                    command = command.args(["-U", user.as_str()]);
                }
                Some(command)
            }
        }
    }
}

/// `nice -n 20 <dump>`, wrapped for the run's mode, stdout into the dump file.
pub fn dump_command(ctx: &RunContext) -> Option<ComposedCommand> {
    let db_file = ctx.paths().db_file().as_ref()?;
    let command = ctx
        .backend()
        .base_dump_command(ctx.credentials())?
        .niced()
        .wrap_for(ctx.mode())
        .redirect(Redirect::StdoutTo(db_file.clone()));
    Some(command)
}
