use std::sync::Arc;

/// Supplies the file extension a writer stage adds, without the leading dot.
///
/// Dump generations are named `<dump>.<n>.<ext>`, `ext` being `tar` followed
/// by the compressor's own extension, if any.
pub trait FileExtProvider {
    fn file_ext(&self) -> Option<Arc<str>>;
}
