//! Configuration file loading.
//!
//! The configuration file is YAML with a `config` section (retention, exclude
//! list, verbosity, failure policy), a `dir` section (backup and log roots)
//! and an optional `compressor` section.

use crate::backup::compress::CompressorConfig;
use crate::backup::function_path;
use crate::backup::orchestrator::FailurePolicy;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddFunctionName;
use function_name::named;
use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Formatter;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::result;
use validator::Validate;

/// File name looked up next to the executable when `--config` is not given.
pub static CONFIG_FILE: &str = "backup.yml";

/// Spellings accepted as "yes" for flag values, compared case-insensitively.
static OPTION_YES: [&str; 4] = ["Y", "YES", "1", "TRUE"];

#[derive(Clone, Serialize, Deserialize, Debug, Validate, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[validate(nested)]
    pub config: GeneralConfig,
    #[validate(nested)]
    pub dir: DirConfig,
    #[serde(default)]
    #[validate(nested)]
    pub compressor: CompressorConfig,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Retention depth: number of dump generations and days of diff history kept.
    #[validate(range(min = 1))]
    pub backup_days: u32,
    pub exclude_file: PathBuf,
    /// Debug verbosity in the run log when set.
    #[serde(deserialize_with = "deserialize_yes_no")]
    pub develop: bool,
    #[serde(default)]
    pub on_stage_failure: FailurePolicy,
}

#[derive(Clone, Serialize, Deserialize, Debug, Validate, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DirConfig {
    pub dir_backup: PathBuf,
    pub dir_log: PathBuf,
}

struct YesNoVisitor;

impl Visitor<'_> for YesNoVisitor {
    type Value = bool;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a boolean or one of y/yes/1/true")
    }

    fn visit_bool<E: DeError>(self, v: bool) -> result::Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_u64<E: DeError>(self, v: u64) -> result::Result<Self::Value, E> {
        Ok(v == 1)
    }

    fn visit_i64<E: DeError>(self, v: i64) -> result::Result<Self::Value, E> {
        Ok(v == 1)
    }

    fn visit_str<E: DeError>(self, v: &str) -> result::Result<Self::Value, E> {
        Ok(OPTION_YES.iter().any(|yes| yes.eq_ignore_ascii_case(v.trim())))
    }
}

fn deserialize_yes_no<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> result::Result<bool, D::Error> {
    deserializer.deserialize_any(YesNoVisitor)
}

impl AppConfig {
    /// Loads and validates the configuration file at `path`.
    ///
    /// A missing or unreadable file yields [`Error::ConfigNotFound`]; a missing
    /// key, malformed value or failed validation yields [`Error::ConfigParse`].
    /// A relative `exclude_file` is resolved against the file's directory.
    #[named]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|_| Error::ConfigNotFound(path.to_path_buf()))?;

        let mut config = serde_yml::from_reader::<_, AppConfig>(file)
            .map_err(|e| Error::config_parse(path, e))?;
        config
            .validate()
            .map_err(|e| Error::config_parse(path, e))
            .add_fn_name(function_path!())?;

        if config.config.exclude_file.is_relative() {
            let base = path.parent().unwrap_or(Path::new(""));
            config.config.exclude_file = base.join(&config.config.exclude_file);
        }

        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}

/// `backup.yml` in the directory holding the running executable.
pub fn default_config_path() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().unwrap_or(Path::new("."));
    Ok(dir.join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::compress::gzip::GzipConfig;
    use tempfile::TempDir;

    const VALID: &str = r#"
config:
  backup_days: 7
  exclude_file: exclude.txt
  develop: "yes"
dir:
  dir_backup: /var/backups/account
  dir_log: /var/log/backup-account
"#;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_valid_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, VALID);

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.config.backup_days, 7);
        assert!(config.config.develop);
        assert_eq!(config.config.on_stage_failure, FailurePolicy::Continue);
        assert_eq!(config.config.exclude_file, temp_dir.path().join("exclude.txt"));
        assert_eq!(config.dir.dir_backup, PathBuf::from("/var/backups/account"));
        assert_eq!(config.compressor, CompressorConfig::Gzip(GzipConfig::default()));
    }

    #[test]
    fn test_absolute_exclude_file_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            &VALID.replace("exclude.txt", "/etc/backup/exclude.txt"),
        );

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.config.exclude_file, PathBuf::from("/etc/backup/exclude.txt"));
    }

    #[test]
    fn test_missing_file_is_config_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = AppConfig::load(temp_dir.path().join(CONFIG_FILE));
        assert!(matches!(result, Err(Error::ConfigNotFound(_))));
    }

    #[test]
    fn test_directory_is_config_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let result = AppConfig::load(temp_dir.path());
        assert!(matches!(result, Err(Error::ConfigNotFound(_))));
    }

    #[test]
    fn test_missing_key_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, &VALID.replace("  backup_days: 7\n", ""));

        let error = AppConfig::load(&path).unwrap_err();
        assert!(matches!(error, Error::ConfigParse { .. }));
        assert!(error.to_string().contains("backup_days"));
    }

    #[test]
    fn test_malformed_value_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, &VALID.replace("backup_days: 7", "backup_days: seven"));

        assert!(matches!(AppConfig::load(&path), Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_zero_retention_fails_validation() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, &VALID.replace("backup_days: 7", "backup_days: 0"));

        let error = AppConfig::load(&path).unwrap_err();
        assert_eq!(error.exit_code(), crate::backup::result_error::error::EXIT_ERROR_CONFIG);
    }

    #[test]
    fn test_develop_flag_spellings() {
        let temp_dir = TempDir::new().unwrap();
        for (value, expected) in [
            ("Y", true),
            ("yes", true),
            ("1", true),
            ("true", true),
            ("\"YES\"", true),
            ("N", false),
            ("0", false),
            ("no", false),
            ("false", false),
        ] {
            let path = write_config(
                &temp_dir,
                &VALID.replace("develop: \"yes\"", &format!("develop: {value}")),
            );
            let config = AppConfig::load(&path).unwrap();
            assert_eq!(config.config.develop, expected, "develop: {value}");
        }
    }

    #[test]
    fn test_abort_policy_and_compressor() {
        let temp_dir = TempDir::new().unwrap();
        let content = format!(
            "{}compressor:\n  compressor_type: none\n",
            VALID.replace(
                "  develop: \"yes\"\n",
                "  develop: \"yes\"\n  on_stage_failure: abort\n",
            )
        );
        let path = write_config(&temp_dir, &content);

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.config.on_stage_failure, FailurePolicy::Abort);
        assert_eq!(config.compressor, CompressorConfig::None);
    }
}
