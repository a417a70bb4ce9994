use crate::backup::command::Operation;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use itertools::Itertools;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Process exit status reported when argument validation fails.
pub const EXIT_ERROR_ARGPARSE: i32 = -1;
/// Process exit status reported when the configuration cannot be loaded.
pub const EXIT_ERROR_CONFIG: i32 = -2;
/// Process exit status for every other fatal error.
pub const EXIT_ERROR_RUN: i32 = 1;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    SerdeYml(#[from] serde_yml::Error),
    #[error(
        "Config file {0:?} not found (or not readable). You can copy \"backup.yml.dist\" to \"backup.yml\" and edit it."
    )]
    ConfigNotFound(PathBuf),
    #[error(
        "Config file error in {}:\n{}",
        path.display(),
        indent::indent_all_with("  ", error.to_string())
    )]
    ConfigParse { path: PathBuf, error: Box<Error> },
    #[error("{0}")]
    ArgumentValidation(String),
    #[error(
        "{operation} exited with {}",
        code.map_or("no exit code (killed by signal)".to_string(), |c| format!("status {c}"))
    )]
    StageExecution {
        operation: Operation,
        code: Option<i32>,
    },
    #[error(
        "Rotation of {} failed:\n{}",
        path.display(),
        indent::indent_all_with("  ", error.to_string())
    )]
    Rotation { path: PathBuf, error: Box<Error> },
    #[error("{}:\n{}", msg, indent::indent_all_with("  ", error.to_string()))]
    WithMsg { msg: String, error: Box<Error> },
    #[error("{} failed:\n{}", fn_name, indent::indent_all_with("  ", error.to_string()))]
    WithFunctionName { error: Box<Error>, fn_name: String },
    #[error("{}", itertools::join(.0, "\n\n"))]
    LotsOfError(Vec<Error>),
}

impl<S: Into<String>> AddFunctionName<S> for Error {
    fn add_fn_name(self, fn_name: S) -> Self {
        Error::WithFunctionName {
            error: Box::new(self),
            fn_name: fn_name.into(),
        }
    }
}

impl<S: Into<String>> AddMsg<S> for Error {
    fn add_msg(self, msg: S) -> Self {
        Self::WithMsg {
            msg: msg.into(),
            error: Box::new(self),
        }
    }
}

impl From<Vec<Error>> for Error {
    fn from(errors: Vec<Error>) -> Self {
        if errors.is_empty() {
            panic!("Should not create lots of errors when error is empty")
        }
        Self::LotsOfError(errors.into_iter().flat_map(|e| e.into_iter()).collect_vec())
    }
}

impl Error {
    pub fn config_parse<P: AsRef<Path>, E: Into<Error>>(path: P, error: E) -> Self {
        Error::ConfigParse {
            path: path.as_ref().to_path_buf(),
            error: Box::new(error.into()),
        }
    }

    pub fn argument_validation<S: Into<String>>(msg: S) -> Self {
        Error::ArgumentValidation(msg.into())
    }

    pub fn stage_execution(operation: Operation, code: Option<i32>) -> Self {
        Error::StageExecution { operation, code }
    }

    pub fn rotation<P: AsRef<Path>, E: Into<Error>>(path: P, error: E) -> Self {
        Error::Rotation {
            path: path.as_ref().to_path_buf(),
            error: Box::new(error.into()),
        }
    }

    pub fn into_iter(self) -> Box<dyn Iterator<Item = Error>> {
        match self {
            Error::LotsOfError(v) => Box::new(v.into_iter().flat_map(|e| e.into_iter())),
            e => Box::new(std::iter::once(e)),
        }
    }

    pub fn chain(self, other: Error) -> Error {
        Error::LotsOfError(self.into_iter().chain(other.into_iter()).collect_vec())
    }

    /// Status the process should exit with when this error ends the program.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ArgumentValidation(_) => EXIT_ERROR_ARGPARSE,
            Error::ConfigNotFound(_) | Error::ConfigParse { .. } => EXIT_ERROR_CONFIG,
            Error::WithMsg { error, .. } | Error::WithFunctionName { error, .. } => {
                error.exit_code()
            }
            _ => EXIT_ERROR_RUN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::from(io_error);

        match error {
            Error::Io(_) => (),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_add_msg() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::from(io_error).add_msg("Custom message");

        match &error {
            Error::WithMsg { msg, .. } => assert_eq!(msg, "Custom message"),
            _ => panic!("Expected WithMsg error"),
        }
        let error_str = error.to_string();
        assert!(error_str.contains("Custom message"));
        assert!(error_str.contains("  file not found"));
    }

    #[test]
    fn test_error_add_fn_name() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::from(io_error).add_fn_name("test_function");

        let error_str = error.to_string();
        assert!(error_str.contains("test_function failed"));
        assert!(error_str.contains("file not found"));
    }

    #[test]
    fn test_error_from_vec() {
        let errors = vec![
            Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "error1")),
            Error::Io(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "error2")),
        ];

        match Error::from(errors) {
            Error::LotsOfError(error_vec) => assert_eq!(error_vec.len(), 2),
            _ => panic!("Expected LotsOfError"),
        }
    }

    #[test]
    #[should_panic(expected = "Should not create lots of errors when error is empty")]
    fn test_error_from_empty_vec_panics() {
        let errors: Vec<Error> = vec![];
        let _error = Error::from(errors);
    }

    #[test]
    fn test_error_chain_flattens() {
        let error1 = Error::argument_validation("a");
        let error2 = Error::argument_validation("b").chain(Error::argument_validation("c"));

        assert_eq!(error1.chain(error2).into_iter().count(), 3);
    }

    #[test]
    fn test_exit_code_for_startup_errors() {
        assert_eq!(
            Error::argument_validation("bad").exit_code(),
            EXIT_ERROR_ARGPARSE
        );
        assert_eq!(
            Error::ConfigNotFound(PathBuf::from("backup.yml")).exit_code(),
            EXIT_ERROR_CONFIG
        );
        assert_eq!(
            Error::config_parse("backup.yml", Error::argument_validation("x"))
                .add_msg("wrapped")
                .exit_code(),
            EXIT_ERROR_CONFIG
        );
        assert_eq!(
            Error::stage_execution(Operation::DatabaseDump, Some(2)).exit_code(),
            EXIT_ERROR_RUN
        );
    }

    #[test]
    fn test_stage_execution_display() {
        let error = Error::stage_execution(Operation::Sync, Some(23));
        assert_eq!(error.to_string(), "rsync copy exited with status 23");

        let error = Error::stage_execution(Operation::DiffBackup, None);
        assert!(error.to_string().contains("killed by signal"));
    }
}
