//! The default engine: extracts page content through pdfium.
//!
//! pdfium is bound once per process. Binding, document loading and all page
//! work happen on the calling thread, which [`crate::convert`] arranges to be
//! a blocking-pool thread with stdout silenced.

use super::layout::{self, BBox, Glyph, PageContent, PlacedImage};
use super::{EngineOptions, MarkdownEngine};
use crate::error::Pdf2MdxError;
use crate::pipeline::input::check_pdf;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

static PDFIUM: OnceLock<Pdfium> = OnceLock::new();

/// Extracts text, ruled tables and images with pdfium and lays them out as
/// Markdown.
#[derive(Debug, Clone, Default)]
pub struct PdfiumEngine {
    library_path: Option<PathBuf>,
}

impl PdfiumEngine {
    /// Locate pdfium through `pdfium-auto`: the bundled copy if this build
    /// has one, else `PDFIUM_LIB_PATH`, else the download cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a specific pdfium library instead.
    ///
    /// Only the first binding in a process takes effect.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn pdfium(&self) -> Result<&'static Pdfium, Pdf2MdxError> {
        if let Some(pdfium) = PDFIUM.get() {
            return Ok(pdfium);
        }

        let lib_path = match &self.library_path {
            Some(path) => path.clone(),
            None => pdfium_auto::locate_pdfium()
                .map_err(|e| Pdf2MdxError::PdfiumBindingFailed(e.to_string()))?,
        };
        debug!("Binding pdfium from {}", lib_path.display());
        let pdfium = pdfium_auto::bind_library(&lib_path)
            .map_err(|e| Pdf2MdxError::PdfiumBindingFailed(e.to_string()))?;

        // A concurrent caller may have won the race; either binding works.
        let _ = PDFIUM.set(pdfium);
        PDFIUM
            .get()
            .ok_or_else(|| Pdf2MdxError::Internal("pdfium binding was lost".into()))
    }
}

impl MarkdownEngine for PdfiumEngine {
    fn to_markdown(&self, pdf_path: &Path, options: &EngineOptions) -> Result<String, Pdf2MdxError> {
        check_pdf(pdf_path)?;
        let pdfium = self.pdfium()?;

        let password = options.password.as_deref();
        let document = pdfium
            .load_pdf_from_file(pdf_path, password)
            .map_err(|e| open_error(pdf_path, password.is_some(), e))?;

        let file_name = pdf_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut contents = Vec::with_capacity(pages.len() as usize);
        for (index, page) in pages.iter().enumerate() {
            let content = extract_page(&page, index, &file_name, options)?;
            debug!(
                "Page {}: {} glyphs, {} paths, {} images",
                index + 1,
                content.glyphs.len(),
                content.paths.len(),
                content.images.len()
            );
            contents.push(content);
        }

        Ok(layout::render_document(&contents, options.table_strategy))
    }
}

fn open_error(path: &Path, had_password: bool, e: PdfiumError) -> Pdf2MdxError {
    let detail = format!("{e:?}");
    if detail.to_ascii_lowercase().contains("password") {
        if had_password {
            Pdf2MdxError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            Pdf2MdxError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        Pdf2MdxError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}

/// Converts pdfium's bottom-up page space into the top-down boxes layout uses.
#[derive(Debug, Clone, Copy)]
struct PageSpace {
    height: f32,
}

impl PageSpace {
    fn bbox(&self, rect: &PdfRect) -> BBox {
        BBox::new(
            rect.left().value,
            self.height - rect.top().value,
            rect.right().value,
            self.height - rect.bottom().value,
        )
    }
}

fn extract_page(
    page: &PdfPage,
    index: usize,
    file_name: &str,
    options: &EngineOptions,
) -> Result<PageContent, Pdf2MdxError> {
    let page_no = index + 1;
    let page_err = |e: PdfiumError| Pdf2MdxError::PageFailed {
        page: page_no,
        detail: format!("{e:?}"),
    };
    let space = PageSpace {
        height: page.height().value,
    };

    let mut content = PageContent::default();

    let text = page.text().map_err(page_err)?;
    for ch in text.chars().iter() {
        let Some(c) = ch.unicode_char() else { continue };
        let Ok(rect) = ch.loose_bounds() else { continue };
        content
            .glyphs
            .push(Glyph::new(c, space.bbox(&rect), ch.scaled_font_size().value));
    }

    let mut image_boxes = Vec::new();
    for object in page.objects().iter() {
        let Ok(bounds) = object.bounds() else { continue };
        let bbox = space.bbox(&bounds.to_rect());
        match object.object_type() {
            PdfPageObjectType::Path => content.paths.push(bbox),
            PdfPageObjectType::Image => image_boxes.push(bbox),
            _ => {}
        }
    }

    if options.write_images && !image_boxes.is_empty() {
        let scale = options.dpi as f32 / 72.0;
        let render = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page.render_with_config(&render).map_err(page_err)?;
        let rendered = bitmap.as_image();

        for (i, bbox) in image_boxes.into_iter().enumerate() {
            let name = image_file_name(file_name, index, i, options.image_format.extension());
            let dest = options.image_path.join(&name);
            if !save_crop(&rendered, bbox, scale, &dest, options)? {
                warn!("Skipping empty image {} on page {}", i, page_no);
                continue;
            }
            content.images.push(PlacedImage {
                bbox,
                link: image_link(&name),
            });
        }
    }

    Ok(content)
}

/// Markdown link to an extracted image. Only the file name goes in the
/// target: the directory may contain `)` or spaces, which would end or split
/// the link.
fn image_link(file_name: &str) -> String {
    format!("![]({file_name})")
}

/// `<pdf file name>-<page index>-<image index>.<ext>`, both indices 0-based.
fn image_file_name(file_name: &str, page: usize, index: usize, ext: &str) -> String {
    format!("{file_name}-{page}-{index}.{ext}")
}

/// Pixel rectangle `(x, y, w, h)` of `bbox` on a page rendered at `scale`,
/// clipped to the bitmap. `None` when nothing is left.
fn pixel_rect(bbox: BBox, scale: f32, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let clamp = |v: f32, max: u32| (v * scale).round().clamp(0.0, max as f32) as u32;
    let (x0, x1) = (clamp(bbox.x0, width), clamp(bbox.x1, width));
    let (y0, y1) = (clamp(bbox.top, height), clamp(bbox.bottom, height));
    (x1 > x0 && y1 > y0).then(|| (x0, y0, x1 - x0, y1 - y0))
}

fn save_crop(
    page: &DynamicImage,
    bbox: BBox,
    scale: f32,
    dest: &Path,
    options: &EngineOptions,
) -> Result<bool, Pdf2MdxError> {
    let Some((x, y, w, h)) = pixel_rect(bbox, scale, page.width(), page.height()) else {
        return Ok(false);
    };
    page.crop_imm(x, y, w, h)
        .to_rgb8()
        .save_with_format(dest, options.image_format.to_image_crate())
        .map_err(|e| Pdf2MdxError::ImageWriteFailed {
            path: dest.to_path_buf(),
            detail: e.to_string(),
        })?;
    debug!("Wrote {} ({}x{} px)", dest.display(), w, h);
    Ok(true)
}
