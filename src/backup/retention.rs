//! Numbered-generation retention of compressed database dumps.
//!
//! A dump file `<base>` keeps up to `depth` archives named
//! `<base>.1.<ext>` … `<base>.<depth>.<ext>`, `1` being the newest. Each
//! rotation drops the oldest, shifts the others up by one and archives the
//! current dump as the new generation `1`.

use crate::backup::compress::CompressorConfig;
use crate::backup::function_path;
use crate::backup::result_error::error::Error;
use crate::backup::result_error::result::Result;
use crate::backup::result_error::{AddFunctionName, AddMsg};
use crate::backup::run_context::RunContext;
use crate::backup::tar::create_file_archive;
use bon::Builder;
use function_name::named;
use getset::Getters;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Builder, Getters)]
#[getset(get = "pub")]
pub struct GenerationSet {
    /// The uncompressed dump the generations are made from.
    #[builder(into)]
    base: PathBuf,
    /// Number of generations kept. [`GenerationSet::rotate`] refuses 0.
    depth: u32,
    #[builder(into)]
    ext: Arc<str>,
}

impl GenerationSet {
    /// The generation set of the run's database dump, if the run has one.
    pub fn for_run(ctx: &RunContext) -> Option<Self> {
        let base = ctx.paths().db_file().clone()?;
        Some(
            GenerationSet::builder()
                .base(base)
                .depth(*ctx.retention_depth())
                .ext(ctx.archive_ext())
                .build(),
        )
    }

    /// `<base>.<generation>.<ext>`
    pub fn path(&self, generation: u32) -> PathBuf {
        let mut name = self.base.clone().into_os_string();
        name.push(format!(".{}.{}", generation, self.ext));
        PathBuf::from(name)
    }

    /// Generations currently on disk, ascending.
    pub fn existing(&self) -> Vec<u32> {
        (1..=self.depth).filter(|g| self.path(*g).exists()).collect()
    }

    /// The renames of one shift, `(from, to)`, oldest first.
    ///
    /// Must run in this order: moving `i` before `i + 1` has moved away would
    /// overwrite `i + 1`.
    pub fn shift_plan(&self) -> impl Iterator<Item = (u32, u32)> {
        (1..self.depth).rev().map(|i| (i, i + 1))
    }

    /// Drops the oldest generation and moves every other one up by one.
    ///
    /// Missing generations are skipped. Leaves generation `1` free.
    pub fn shift(&self) -> Result<()> {
        let oldest = self.path(self.depth);
        if oldest.exists() {
            tracing::debug!("Removing oldest generation {:?}", oldest);
            std::fs::remove_file(&oldest)
                .map_err(Error::from)
                .add_msg(format!("Failed to remove {:?}", oldest))?;
        }

        for (from, to) in self.shift_plan() {
            let src = self.path(from);
            if !src.exists() {
                continue;
            }
            let dst = self.path(to);
            tracing::trace!("Renaming {:?} to {:?}", src, dst);
            std::fs::rename(&src, &dst)
                .map_err(Error::from)
                .add_msg(format!("Failed to rename {:?} to {:?}", src, dst))?;
        }

        Ok(())
    }

    /// Shifts the generations and archives the dump as the new generation `1`.
    ///
    /// The dump file itself is kept. Any failure is returned as
    /// [`Error::Rotation`]; nothing is retried.
    #[named]
    pub fn rotate(&self, compressor: &CompressorConfig) -> Result<PathBuf> {
        if self.depth == 0 {
            return Err(Error::rotation(
                &self.base,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "retention depth must be at least 1",
                ),
            ))
            .add_fn_name(function_path!());
        }

        let newest = self.path(1);
        self.shift()
            .and_then(|_| create_file_archive(&self.base, &newest, compressor))
            .map_err(|e| Error::rotation(&self.base, e))
            .add_fn_name(function_path!())?;

        log_listing([self.base.as_path(), newest.as_path()]);
        Ok(newest)
    }
}

/// Size listing of the given files in the run log, for audit.
fn log_listing<'a, I: IntoIterator<Item = &'a Path>>(files: I) {
    for file in files {
        match std::fs::metadata(file) {
            Ok(md) => tracing::info!("{:>6} {}", human_size(md.len()), file.display()),
            Err(e) => tracing::warn!("Cannot stat {}: {}", file.display(), e),
        }
    }
}

/// Byte count in the style of `ls -h`.
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["K", "M", "G", "T", "P", "E"];
    if bytes < 1024 {
        return bytes.to_string();
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if size < 10.0 {
        format!("{:.1}{}", size, UNITS[unit])
    } else {
        format!("{:.0}{}", size, UNITS[unit])
    }
}
