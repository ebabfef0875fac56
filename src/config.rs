//! Configuration types for PDF-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults are the fixed settings the
//! `pdf2mdx` binary has always used: images written as PNG at 180 DPI, tables
//! detected from stroked ruling lines only.

use crate::engine::MarkdownEngine;
use crate::error::Pdf2MdxError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a PDF-to-Markdown conversion.
///
/// Built via [`ConversionConfig::builder()`].
///
/// # Example
/// ```rust
/// use pdf2mdx::{ConversionConfig, TableStrategy};
///
/// let config = ConversionConfig::builder()
///     .assets_dir("/srv/site/public/img/report")
///     .assets_rel("/img/report/")
///     .dpi(150)
///     .table_strategy(TableStrategy::Lines)
///     .build()
///     .unwrap();
/// assert_eq!(config.assets_rel, "/img/report");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Directory extracted images are written to. Created if absent.
    pub assets_dir: PathBuf,

    /// Path prefix used in rewritten image links, without trailing `/`.
    ///
    /// Never checked against the filesystem; it only has to make sense to
    /// whatever serves the Markdown.
    pub assets_rel: String,

    /// Extract embedded images. Default: true.
    pub write_images: bool,

    /// Encoding of extracted images. Default: [`ImageFormat::Png`].
    pub image_format: ImageFormat,

    /// Resolution used when cropping images out of the rendered page.
    /// Range: 72–600. Default: 180.
    pub dpi: u32,

    /// How ruled tables are recognised. Default: [`TableStrategy::LinesStrict`].
    pub table_strategy: TableStrategy,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Pre-constructed engine. If None, a [`crate::engine::PdfiumEngine`]
    /// is bound at conversion time.
    pub engine: Option<Arc<dyn MarkdownEngine>>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            assets_rel: String::from("assets"),
            write_images: true,
            image_format: ImageFormat::default(),
            dpi: 180,
            table_strategy: TableStrategy::default(),
            password: None,
            engine: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("assets_dir", &self.assets_dir)
            .field("assets_rel", &self.assets_rel)
            .field("write_images", &self.write_images)
            .field("image_format", &self.image_format)
            .field("dpi", &self.dpi)
            .field("table_strategy", &self.table_strategy)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("engine", &self.engine.as_ref().map(|_| "<dyn MarkdownEngine>"))
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn assets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.assets_dir = dir.into();
        self
    }

    /// Set the link prefix. Trailing slashes are stripped.
    pub fn assets_rel(mut self, rel: impl AsRef<str>) -> Self {
        self.config.assets_rel = strip_trailing_slashes(rel.as_ref()).to_string();
        self
    }

    pub fn write_images(mut self, v: bool) -> Self {
        self.config.write_images = v;
        self
    }

    pub fn image_format(mut self, format: ImageFormat) -> Self {
        self.config.image_format = format;
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn table_strategy(mut self, strategy: TableStrategy) -> Self {
        self.config.table_strategy = strategy;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn engine(mut self, engine: Arc<dyn MarkdownEngine>) -> Self {
        self.config.engine = Some(engine);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2MdxError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(Pdf2MdxError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        if c.write_images && c.assets_dir.as_os_str().is_empty() {
            return Err(Pdf2MdxError::InvalidConfig(
                "assets_dir must not be empty when images are written".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Strip every trailing `/` from a link prefix (`"img//"` → `"img"`).
pub fn strip_trailing_slashes(rel: &str) -> &str {
    rel.trim_end_matches('/')
}

// ── Enums ────────────────────────────────────────────────────────────────

/// File format of extracted images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Lossless; keeps chart lines and small text crisp. (default)
    #[default]
    Png,
    /// Smaller files for photographic figures.
    Jpeg,
}

impl ImageFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    pub(crate) fn to_image_crate(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Which drawn lines count as table rulings.
///
/// | Strategy | Edges used |
/// |----------|------------|
/// | `LinesStrict` | stroked line segments only; filled rectangles (cell shading, backgrounds) are ignored |
/// | `Lines` | line segments plus the four borders of every rectangle |
/// | `None` | table detection disabled |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStrategy {
    #[default]
    LinesStrict,
    Lines,
    None,
}

impl TableStrategy {
    /// Name of the strategy as accepted on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            TableStrategy::LinesStrict => "lines_strict",
            TableStrategy::Lines => "lines",
            TableStrategy::None => "none",
        }
    }
}

impl fmt::Display for TableStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_configuration() {
        let c = ConversionConfig::default();
        assert!(c.write_images);
        assert_eq!(c.image_format, ImageFormat::Png);
        assert_eq!(c.dpi, 180);
        assert_eq!(c.table_strategy, TableStrategy::LinesStrict);
        assert!(c.engine.is_none());
    }

    #[test]
    fn assets_rel_trailing_slashes_stripped() {
        let c = ConversionConfig::builder()
            .assets_rel("assets/doc1///")
            .build()
            .unwrap();
        assert_eq!(c.assets_rel, "assets/doc1");
    }

    #[test]
    fn dpi_is_clamped() {
        let c = ConversionConfig::builder().dpi(10).build().unwrap();
        assert_eq!(c.dpi, 72);
        let c = ConversionConfig::builder().dpi(5000).build().unwrap();
        assert_eq!(c.dpi, 600);
    }

    #[test]
    fn empty_assets_dir_rejected_when_writing_images() {
        let err = ConversionConfig::builder().assets_dir("").build().unwrap_err();
        assert!(matches!(err, Pdf2MdxError::InvalidConfig(_)));

        let ok = ConversionConfig::builder()
            .assets_dir("")
            .write_images(false)
            .build();
        assert!(ok.is_ok());
    }

    #[test]
    fn debug_redacts_password() {
        let c = ConversionConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn image_format_extensions() {
        assert_eq!(ImageFormat::Png.extension(), "png");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn table_strategy_names() {
        assert_eq!(TableStrategy::LinesStrict.to_string(), "lines_strict");
        assert_eq!(TableStrategy::None.as_str(), "none");
    }
}
