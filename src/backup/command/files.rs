use crate::backup::command::{ComposedCommand, Redirect};
use crate::backup::run_context::{ExecutionMode, RunContext};

/// Mirrors the remote copy directory into the local sync directory.
///
/// Only remote runs sync; rsync reaches the endpoint through its own ssh
/// transport, so the command itself runs locally.
pub fn sync_command(ctx: &RunContext) -> Option<ComposedCommand> {
    let ExecutionMode::Remote(endpoint) = ctx.mode() else {
        return None;
    };
    let paths = ctx.paths();

    Some(
        ComposedCommand::new("rsync")
            .args(["-azh", "-e"])
            .arg(endpoint.rsync_transport())
            .arg(format!("--exclude-from={}", paths.exclude_file().display()))
            .args(["--delete-after", "--force", "--stats"])
            .arg(format!(
                "{}:{}",
                endpoint.destination(),
                ctx.copy_dir().display()
            ))
            .arg(paths.dir_sync())
            .redirect(Redirect::AppendAll(paths.log_last().clone())),
    )
}

/// Incremental backup of the source directory into the diff directory.
pub fn diff_backup_command(ctx: &RunContext) -> ComposedCommand {
    let paths = ctx.paths();
    ComposedCommand::new("rdiff-backup")
        .arg("--print-statistics")
        .arg(ctx.diff_source())
        .arg(paths.dir_diff())
        .redirect(Redirect::AppendAll(paths.log_last().clone()))
}

/// Drops increments older than the retention depth, counted in days.
pub fn diff_prune_command(ctx: &RunContext) -> ComposedCommand {
    let paths = ctx.paths();
    ComposedCommand::new("rdiff-backup")
        .arg("--remove-older-than")
        .arg(format!("{}D", ctx.retention_depth()))
        .arg("--force")
        .arg(paths.dir_diff())
        .redirect(Redirect::AppendAll(paths.log_last().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::params::{BackupType, RunParams};
    use crate::backup::run_context::test_support::{app_config, context};

    fn run(backup_type: BackupType) -> RunContext {
        let builder = RunParams::builder()
            .backup_type(backup_type)
            .name("acct1")
            .copy_dir("/data/acct1");
        let params = match backup_type {
            BackupType::Local => builder.build(),
            BackupType::Remote => builder.serv("h").user("u").port(2222).build(),
        };
        context(&params, &app_config("/root", 5))
    }

    #[test]
    fn test_local_run_has_no_sync() {
        assert!(sync_command(&run(BackupType::Local)).is_none());
    }

    #[test]
    fn test_sync_command() {
        let command = sync_command(&run(BackupType::Remote)).unwrap();

        assert_eq!(command.program, "rsync");
        let exposed: Vec<_> = command.exposed_args().collect();
        assert_eq!(
            exposed,
            vec![
                "-azh",
                "-e",
                "ssh -p 2222",
                "--exclude-from=/root/exclude.txt",
                "--delete-after",
                "--force",
                "--stats",
                "u@h:/data/acct1",
                "/root/backup/acct1/sync",
            ]
        );
        assert_eq!(
            command.redirect,
            Redirect::AppendAll("/root/log/acct1.log".into())
        );
    }

    #[test]
    fn test_diff_source_follows_mode() {
        let local = diff_backup_command(&run(BackupType::Local));
        assert_eq!(
            local.to_string(),
            "rdiff-backup --print-statistics /data/acct1 /root/backup/acct1/diff >> /root/log/acct1.log 2>&1"
        );

        let remote = diff_backup_command(&run(BackupType::Remote));
        assert_eq!(remote.args[1].to_string(), "/root/backup/acct1/sync");
        assert_eq!(remote.program, "rdiff-backup");
    }

    #[test]
    fn test_prune_uses_retention_days() {
        let command = diff_prune_command(&run(BackupType::Local));
        assert_eq!(
            command.to_string(),
            "rdiff-backup --remove-older-than 5D --force /root/backup/acct1/diff >> /root/log/acct1.log 2>&1"
        );
    }
}
