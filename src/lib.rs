//! # backup-account
//!
//! Backs up one account: an optional MySQL or PostgreSQL dump, kept as
//! numbered compressed generations, and a differential `rdiff-backup` copy of
//! a directory, mirrored first with `rsync` when the directory is remote.
//!
//! ## Features
//!
//! - **Local or remote**: remote dumps run over `ssh`, remote files are synced with `rsync`
//! - **Databases**: MySQL/MariaDB (`mysqldump`) or PostgreSQL (`pg_dump`)
//! - **Retention**: the last `backup_days` dumps as `<name>.sql.<n>.tar.gz`
//! - **Run logs**: a log of the last run and a cumulative full log
//!
//! ## Quick Start
//!
//! ```no_run
//! use backup_account::backup::orchestrator::Orchestrator;
//! use backup_account::backup::params::{BackupType, RunParams};
//! use backup_account::backup::run_context::RunContext;
//! use backup_account::backup::runner::ProcessRunner;
//!
//! let params = RunParams::builder()
//!     .backup_type(BackupType::Local)
//!     .name("acct1")
//!     .copy_dir("/data/acct1")
//!     .build();
//! let ctx = RunContext::load(&params, "backup.yml", chrono::Local::now())?;
//! Orchestrator::new(&ctx, ProcessRunner).run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod backup;
