//! Pipeline stages for PDF-to-Markdown conversion.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ assets ──▶ engine (silenced) ──▶ postprocess ──▶ stdout
//! (path)    (mkdir -p)  (pdfium)               (links, MDX)
//! ```
//!
//! 1. [`input`]   — check the PDF exists, is readable, and starts with `%PDF`
//! 2. [`assets`]  — create the image directory (idempotent)
//! 3. [`silence`] — scope guard that swallows engine chatter on stdout
//! 4. [`postprocess`] — rewrite image links and apply MDX-safety rules
//!
//! The engine call itself lives in [`crate::engine`].

pub mod assets;
pub mod input;
pub mod postprocess;
pub mod silence;
