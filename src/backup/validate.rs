//! Validation helpers for run parameters and directories.

use sanitize_filename::{is_sanitized, sanitize};
use validator::ValidationError;

use std::io;
use std::path::Path;

/// The run name ends up as a directory and file name, so it must be usable as one.
pub fn validate_run_name<S: AsRef<str>>(name: S) -> Result<(), ValidationError> {
    let name = name.as_ref();
    if name.is_empty() {
        return Err(ValidationError::new("InvalidRunName")
            .with_message("Run name must not be empty".into()));
    }

    if !is_sanitized(name) || name == "." || name == ".." {
        return Err(ValidationError::new("InvalidRunName").with_message(
            format!(
                "Invalid run name {:?}, try sanitizing like {:?}",
                name,
                sanitize(name)
            )
            .into(),
        ));
    }

    Ok(())
}

/// Creates `dir` (and its parents) when missing.
///
/// Returns `true` when the directory was created. An existing directory is left
/// untouched; an existing non-directory is an error.
pub fn ensure_dir<P: AsRef<Path>>(dir: P) -> io::Result<bool> {
    let dir = dir.as_ref();
    if dir.exists() {
        if !dir.is_dir() {
            return Err(io::Error::other(format!("{:?} is not a directory", dir)));
        }
        return Ok(false);
    }

    std::fs::create_dir_all(dir)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_run_name() {
        assert!(validate_run_name("acct1").is_ok());
        assert!(validate_run_name("my-site.example").is_ok());
        assert!(validate_run_name("").is_err());
        assert!(validate_run_name("a/b").is_err());
        assert!(validate_run_name("..").is_err());
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("a/b/c");

        assert!(ensure_dir(&dir).unwrap());
        assert!(dir.is_dir());
    }

    #[test]
    fn test_ensure_dir_keeps_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("keep.txt");
        std::fs::write(&file, "content").unwrap();

        assert!(!ensure_dir(temp_dir.path()).unwrap());
        assert_eq!(std::fs::read_to_string(file).unwrap(), "content");
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not_a_dir");
        std::fs::write(&file, "content").unwrap();

        assert!(ensure_dir(&file).is_err());
    }
}
