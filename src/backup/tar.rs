use crate::backup::compress::{CompressorBuilder, CompressorConfig};
use crate::backup::finish::Finish;
use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use function_name::named;
use std::io::{BufWriter, IntoInnerError};
use std::path::Path;
use tempfile::NamedTempFile;

/// Archives a single file into `archive_path` through the configured compressor.
///
/// The entry is stored under the file's own name, without any directory prefix.
/// The archive is written to a temporary file next to `archive_path` and only
/// renamed into place once fully flushed, so a failure never leaves a
/// truncated archive behind.
#[named]
pub fn create_file_archive<P1: AsRef<Path>, P2: AsRef<Path>>(
    src: P1,
    archive_path: P2,
    compressor: &CompressorConfig,
) -> Result<()> {
    let src = src.as_ref();
    let archive_path = archive_path.as_ref();
    let entry_name = src.file_name().ok_or_else(|| {
        Error::from(std::io::Error::other(format!(
            "{:?} has no file name to archive",
            src
        )))
    })?;
    let parent = archive_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut archive_temp = NamedTempFile::new_in(parent)
        .map_err(Error::from)
        .add_msg(format!("Failed to create temporary archive in {:?}", parent))?;

    let mut writer = compressor
        .build_compressor(BufWriter::new(archive_temp.as_file_mut()))
        .map(tar::Builder::new)?;
    writer
        .append_path_with_name(src, entry_name)
        .map_err(Error::from)
        .add_msg(format!("Failed to append {:?} to archive", src))?;

    writer
        .into_inner()?
        .finish()?
        .into_inner()
        .map_err(IntoInnerError::into_error)?;

    archive_temp
        .persist(archive_path)
        .map_err(|e| Error::from(e.error))
        .add_msg(format!("Failed to move archive into {:?}", archive_path))
        .add_fn_name(function_path!())?;

    tracing::debug!("Archived {:?} into {:?}", src, archive_path);
    Ok(())
}
