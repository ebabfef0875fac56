//! # pdf2mdx
//!
//! Convert a PDF into Markdown that an MDX compiler accepts, extracting its
//! images into a directory the Markdown links to.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Assets    mkdir -p the image directory
//!  ├─ 2. Engine    pdfium → glyphs, ruled tables, image crops → Markdown
//!  │               (blocking thread, stdout silenced)
//!  ├─ 3. Polish    image links → <rel>/<file>, bare `...` → （省略）, <br> → <br />
//!  └─ 4. Output    Markdown string (the binary prints it verbatim)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2mdx::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .assets_dir("/srv/blog/public/images/paper")
//!         .assets_rel("/images/paper")
//!         .build()?;
//!     let output = convert("paper.pdf", &config).await?;
//!     print!("{}", output.markdown);
//!     eprintln!("{} images extracted", output.images.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Custom engines
//!
//! The PDF-understanding half sits behind [`MarkdownEngine`]. Supply your own
//! through [`ConversionConfigBuilder::engine`] to reuse the directory
//! handling, stdout silencing and MDX post-processing with a different
//! extractor.
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `pdf2mdx` binary (clap + anyhow + tracing-subscriber) |
//! | `bundled` | off     | Embeds the pdfium library at build time (`PDFIUM_BUNDLE_LIB`) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2mdx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ImageFormat, TableStrategy};
pub use convert::{convert, convert_from_bytes, convert_sync, write_markdown};
pub use engine::{EngineOptions, MarkdownEngine, PdfiumEngine};
pub use error::Pdf2MdxError;
pub use output::ConversionOutput;
pub use pipeline::postprocess::{finalize, OMISSION_MARKER};
