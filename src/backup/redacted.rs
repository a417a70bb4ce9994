//! Secret string handling with redacted display.
//!
//! Provides `RedactedString` for holding the database password while preventing
//! accidental exposure in logs, debug output, or error messages.

use bon::Builder;
use derive_more::From;
use getset::Getters;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use zeroize::Zeroize;

/// Placeholder text shown instead of the actual secret in logs/debug output
pub static REDACTED_SECRET: &str = "###REDACTED###";

/// A string that is redacted in debug output and zeroed on drop
#[derive(Clone, Zeroize, From, Builder, PartialEq, Eq, Getters)]
#[getset(get = "pub")]
pub struct RedactedString {
    #[builder(into)]
    inner: String,
}

impl Debug for RedactedString {
    /// Always shows redacted placeholder instead of actual value
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", REDACTED_SECRET)
    }
}

impl FromStr for RedactedString {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(RedactedString::builder().inner(s).build())
    }
}

impl Drop for RedactedString {
    fn drop(&mut self) {
        self.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret: RedactedString = "hunter2".parse().unwrap();
        let debug = format!("{:?}", secret);
        assert_eq!(debug, REDACTED_SECRET);
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_inner_is_accessible() {
        let secret = RedactedString::builder().inner("hunter2").build();
        assert_eq!(secret.inner(), "hunter2");
    }

    #[test]
    fn test_zeroize_clears_inner() {
        let mut secret = RedactedString::from("hunter2".to_string());
        secret.zeroize();
        assert!(secret.inner().is_empty());
    }
}
