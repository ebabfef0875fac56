//! Result types returned by the conversion entry points.

use std::path::PathBuf;

/// The outcome of one successful conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    /// Post-processed Markdown, exactly as the binary prints it.
    pub markdown: String,

    /// Image files in the assets directory that the Markdown links to, in
    /// order of first reference.
    pub images: Vec<PathBuf>,

    /// Bytes the engine wrote to stdout that were discarded.
    pub suppressed_bytes: usize,

    /// Wall-clock time of the whole conversion.
    pub duration_ms: u64,
}
