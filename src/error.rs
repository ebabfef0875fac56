//! Error types for the pdf2mdx library.
//!
//! Every failure in the pipeline is fatal: a half-converted document is never
//! written to stdout, so there is a single error enum rather than separate
//! fatal and per-page types. The CLI maps any [`Pdf2MdxError`] to a non-zero
//! exit status through `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2mdx library.
#[derive(Debug, Error)]
pub enum Pdf2MdxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium failed while reading one page.
    #[error("Failed to read page {page}: {detail}")]
    PageFailed { page: usize, detail: String },

    // ── Asset errors ──────────────────────────────────────────────────────
    /// The image output directory could not be created.
    #[error("Failed to create image directory '{path}': {source}")]
    AssetsDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An extracted image could not be encoded or written.
    #[error("Failed to write image '{path}': {detail}")]
    ImageWriteFailed { path: PathBuf, detail: String },

    // ── Stream errors ─────────────────────────────────────────────────────
    /// Standard output could not be redirected around the engine call.
    #[error("Failed to redirect stdout during conversion: {0}")]
    StdoutRedirect(String),

    /// The final Markdown could not be written.
    #[error("Failed to write Markdown output: {source}")]
    OutputWriteFailed {
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
