pub mod gzip;

use crate::backup::file_ext::FileExtProvider;
use crate::backup::finish::Finish;
use crate::backup::function_path;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::AddFunctionName;
use derive_more::From;
use flate2::write::GzEncoder;
use function_name::named;
use io_enum::Write;
use serde::{Deserialize, Serialize};
use std::io;
use std::io::Write;
use std::result;
use std::sync::{Arc, OnceLock};
use validator::{Validate, ValidationErrors};

#[derive(Write, From)]
pub enum Compressor<W: Write> {
    None(W),
    GzEncoder(GzEncoder<W>),
}

/// Compression applied to a dump file before it joins the generation set.
#[derive(Clone, From, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(tag = "compressor_type")]
#[serde(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum CompressorConfig {
    None,
    Gzip(gzip::GzipConfig),
}

impl Default for CompressorConfig {
    fn default() -> Self {
        CompressorConfig::Gzip(gzip::GzipConfig::default())
    }
}

impl Validate for CompressorConfig {
    fn validate(&self) -> result::Result<(), ValidationErrors> {
        match self {
            CompressorConfig::None => Ok(()),
            CompressorConfig::Gzip(gzip) => gzip.validate(),
        }
    }
}

pub trait CompressorBuilder<W: Write> {
    fn build_compressor(&self, writer: W) -> Result<Compressor<W>>;
}

impl<W: Write> Finish<W> for Compressor<W> {
    fn finish(self) -> io::Result<W> {
        match self {
            Compressor::None(w) => Ok(w),
            Compressor::GzEncoder(w) => w.finish(),
        }
    }
}

impl<W: Write> CompressorBuilder<W> for CompressorConfig {
    #[named]
    fn build_compressor(&self, writer: W) -> Result<Compressor<W>> {
        match self {
            CompressorConfig::None => Ok(Compressor::None(writer)),
            CompressorConfig::Gzip(gzip) => gzip.build_compressor(writer),
        }
        .add_fn_name(function_path!())
    }
}

static GZ_FILE_EXT: OnceLock<Arc<str>> = OnceLock::new();
impl FileExtProvider for CompressorConfig {
    fn file_ext(&self) -> Option<Arc<str>> {
        match self {
            CompressorConfig::None => None,
            CompressorConfig::Gzip(_) => Some(GZ_FILE_EXT.get_or_init(|| "gz".into()).clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_gzip() {
        let config = CompressorConfig::default();
        assert_eq!(config.file_ext().as_deref(), Some("gz"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_none_has_no_ext() {
        assert_eq!(CompressorConfig::None.file_ext(), None);
    }

    #[test]
    fn test_none_compressor_passes_bytes_through() {
        let mut compressor = CompressorConfig::None.build_compressor(Vec::new()).unwrap();
        compressor.write_all(b"raw").unwrap();
        assert_eq!(compressor.finish().unwrap(), b"raw".to_vec());
    }

    #[test]
    fn test_deserialize_tagged() {
        let config: CompressorConfig =
            serde_json::from_str(r#"{"compressor_type":"gzip","level":9}"#).unwrap();
        match config {
            CompressorConfig::Gzip(gzip) => assert_eq!(gzip.level(), &Some(9)),
            _ => panic!("Expected gzip compressor"),
        }

        let config: CompressorConfig =
            serde_json::from_str(r#"{"compressor_type":"none"}"#).unwrap();
        assert_eq!(config, CompressorConfig::None);
    }

    #[test]
    fn test_unknown_compressor_rejected() {
        let result = serde_json::from_str::<CompressorConfig>(r#"{"compressor_type":"xz"}"#);
        assert!(result.is_err());
    }
}
