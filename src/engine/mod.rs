//! The conversion engine: PDF in, Markdown (and image files) out.
//!
//! Everything that understands PDF structure sits behind [`MarkdownEngine`].
//! The pipeline in [`crate::convert`] only prepares directories, silences
//! stdout around [`MarkdownEngine::to_markdown`], and post-processes the
//! returned text, so any engine honouring the contract below can be plugged in
//! through [`crate::ConversionConfigBuilder::engine`].
//!
//! The default engine, [`PdfiumEngine`], is split so most of it is testable
//! without a pdfium library:
//!
//! 1. [`pdfium`] — pulls glyphs, path bounds and image crops out of pdfium
//! 2. [`table`]  — finds ruled tables from path edges
//! 3. [`layout`] — orders text, tables and images into Markdown

pub mod layout;
pub mod pdfium;
pub mod table;

pub use self::pdfium::PdfiumEngine;

use crate::config::{ConversionConfig, ImageFormat, TableStrategy};
use crate::error::Pdf2MdxError;
use std::path::{Path, PathBuf};

/// Settings handed to an engine for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Extract embedded images into `image_path`.
    pub write_images: bool,
    /// Directory extracted images are written to. Already exists when the
    /// engine is called.
    pub image_path: PathBuf,
    pub image_format: ImageFormat,
    /// Resolution of extracted images.
    pub dpi: u32,
    pub table_strategy: TableStrategy,
    pub password: Option<String>,
}

impl From<&ConversionConfig> for EngineOptions {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            write_images: config.write_images,
            image_path: config.assets_dir.clone(),
            image_format: config.image_format,
            dpi: config.dpi,
            table_strategy: config.table_strategy,
            password: config.password.clone(),
        }
    }
}

/// A PDF-to-Markdown converter.
///
/// Contract:
/// - returns the whole document as one Markdown string;
/// - when `options.write_images` is set, writes image files into
///   `options.image_path` and references each with a Markdown image link
///   whose target ends in the file's name;
/// - may print to stdout freely; the caller discards it.
pub trait MarkdownEngine: Send + Sync {
    fn to_markdown(&self, pdf_path: &Path, options: &EngineOptions)
        -> Result<String, Pdf2MdxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_follow_config() {
        let config = ConversionConfig::builder()
            .assets_dir("/out/img")
            .dpi(96)
            .table_strategy(TableStrategy::None)
            .password("pw")
            .build()
            .unwrap();
        let opts = EngineOptions::from(&config);
        assert_eq!(opts.image_path, PathBuf::from("/out/img"));
        assert_eq!(opts.dpi, 96);
        assert_eq!(opts.table_strategy, TableStrategy::None);
        assert_eq!(opts.password.as_deref(), Some("pw"));
        assert!(opts.write_images);
    }
}
