//! Conversion entry points.
//!
//! Every entry point runs the same fixed sequence:
//!
//! 1. create the image directory
//! 2. call the engine with stdout silenced
//! 3. post-process the returned Markdown
//!
//! Nothing is written to stdout here; the caller decides what to do with
//! [`ConversionOutput::markdown`]. [`write_markdown`] is the verbatim writer
//! the binary uses.

use crate::config::ConversionConfig;
use crate::engine::{EngineOptions, MarkdownEngine, PdfiumEngine};
use crate::error::Pdf2MdxError;
use crate::output::ConversionOutput;
use crate::pipeline::{assets, postprocess, silence::StdoutSilencer};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF file to MDX-safe Markdown.
///
/// Images are written into `config.assets_dir` (created if missing) and the
/// returned Markdown links them under `config.assets_rel`.
///
/// # Errors
/// Any failure is fatal: directory creation, engine binding, loading the PDF,
/// or writing an image. No partial Markdown is returned.
///
/// # Example
/// ```rust,no_run
/// use pdf2mdx::{convert, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::builder()
///     .assets_dir("/srv/site/public/img/report")
///     .assets_rel("/img/report")
///     .build()?;
/// let output = convert("report.pdf", &config).await?;
/// print!("{}", output.markdown);
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2MdxError> {
    let start = Instant::now();
    let pdf_path = pdf_path.as_ref().to_path_buf();
    info!("Starting conversion: {}", pdf_path.display());

    // ── Step 1: Image directory ─────────────────────────────────────────
    assets::prepare_assets_dir(&config.assets_dir).await?;

    // ── Step 2: Engine, with stdout silenced ────────────────────────────
    let engine = resolve_engine(config);
    let options = EngineOptions::from(config);
    debug!(
        "Engine options: images={} format={} dpi={} tables={}",
        options.write_images,
        options.image_format.extension(),
        options.dpi,
        options.table_strategy
    );
    let (raw, suppressed_bytes) = tokio::task::spawn_blocking(move || {
        StdoutSilencer::run(|| engine.to_markdown(&pdf_path, &options))
    })
    .await
    .map_err(|e| Pdf2MdxError::Internal(format!("Conversion task panicked: {e}")))??;
    let raw = raw?;
    debug!(
        "Engine returned {} bytes of Markdown ({} bytes of stdout discarded)",
        raw.len(),
        suppressed_bytes
    );

    // ── Step 3: Post-process ────────────────────────────────────────────
    let markdown = postprocess::finalize(&raw, &config.assets_rel);
    let images = written_images(&raw, &config.assets_dir);

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: {} bytes, {} images, {}ms",
        markdown.len(),
        images.len(),
        duration_ms
    );

    Ok(ConversionOutput {
        markdown,
        images,
        suppressed_bytes,
        duration_ms,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    pdf_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2MdxError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Pdf2MdxError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(pdf_path, config))
}

/// Convert PDF bytes held in memory.
///
/// The bytes are written to a managed temp directory under `file_name`, which
/// is also the prefix of every extracted image's name. The temp copy is
/// removed on return.
pub async fn convert_from_bytes(
    bytes: &[u8],
    file_name: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2MdxError> {
    let name = Path::new(file_name)
        .file_name()
        .ok_or_else(|| Pdf2MdxError::InvalidConfig(format!("not a file name: '{file_name}'")))?;

    let tmp = tempfile::tempdir().map_err(|e| Pdf2MdxError::Internal(format!("tempdir: {e}")))?;
    let path = tmp.path().join(name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| Pdf2MdxError::Internal(format!("tempfile write: {e}")))?;

    // `tmp` is dropped (and the copy deleted) when `convert` returns
    convert(&path, config).await
}

/// Write `markdown` to stdout exactly as given and flush.
pub fn write_markdown(markdown: &str) -> Result<(), Pdf2MdxError> {
    let mut out = std::io::stdout().lock();
    out.write_all(markdown.as_bytes())
        .and_then(|()| out.flush())
        .map_err(|source| Pdf2MdxError::OutputWriteFailed { source })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn resolve_engine(config: &ConversionConfig) -> Arc<dyn MarkdownEngine> {
    match &config.engine {
        Some(engine) => Arc::clone(engine),
        None => Arc::new(PdfiumEngine::new()),
    }
}

/// Linked images that actually exist in `assets_dir`.
fn written_images(raw: &str, assets_dir: &Path) -> Vec<PathBuf> {
    postprocess::linked_image_files(raw)
        .into_iter()
        .map(|name| assets_dir.join(name))
        .filter(|path| path.is_file())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::postprocess::OMISSION_MARKER;

    /// Prints to stdout, writes one image, returns engine-style Markdown.
    struct ChattyEngine;

    impl MarkdownEngine for ChattyEngine {
        fn to_markdown(
            &self,
            pdf_path: &Path,
            options: &EngineOptions,
        ) -> Result<String, Pdf2MdxError> {
            std::io::stdout()
                .write_all(b"Processing page 1/1 ...\n")
                .unwrap();
            let name = format!(
                "{}-0-0.png",
                pdf_path.file_name().unwrap().to_string_lossy()
            );
            let image = options.image_path.join(&name);
            std::fs::write(&image, b"png").unwrap();
            Ok(format!(
                "# Title\n\n![]({})\n\n...\n\n| a<br>b | c |\n| --- | --- |\n",
                image.display()
            ))
        }
    }

    struct FailingEngine;

    impl MarkdownEngine for FailingEngine {
        fn to_markdown(&self, pdf_path: &Path, _: &EngineOptions) -> Result<String, Pdf2MdxError> {
            std::io::stdout().write_all(b"about to fail\n").unwrap();
            Err(Pdf2MdxError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: "xref".into(),
            })
        }
    }

    fn config(dir: &Path, engine: Arc<dyn MarkdownEngine>) -> ConversionConfig {
        ConversionConfig::builder()
            .assets_dir(dir)
            .assets_rel("img")
            .engine(engine)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn converts_and_post_processes() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = tmp.path().join("public/img");
        let cfg = config(&assets, Arc::new(ChattyEngine));

        let out = convert(tmp.path().join("doc.pdf"), &cfg).await.unwrap();

        assert!(assets.is_dir());
        assert_eq!(
            out.markdown,
            format!("# Title\n\n![](img/doc.pdf-0-0.png)\n\n{OMISSION_MARKER}\n\n| a<br />b | c |\n| --- | --- |\n")
        );
        assert_eq!(out.images, vec![assets.join("doc.pdf-0-0.png")]);
        assert_eq!(out.suppressed_bytes, "Processing page 1/1 ...\n".len());
    }

    #[tokio::test]
    async fn second_run_reuses_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = tmp.path().join("img");
        let cfg = config(&assets, Arc::new(ChattyEngine));

        let first = convert(tmp.path().join("doc.pdf"), &cfg).await.unwrap();
        let second = convert(tmp.path().join("doc.pdf"), &cfg).await.unwrap();
        assert_eq!(first.markdown, second.markdown);
    }

    #[tokio::test]
    async fn engine_error_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path(), Arc::new(FailingEngine));

        let err = convert(tmp.path().join("bad.pdf"), &cfg).await.unwrap_err();
        assert!(matches!(err, Pdf2MdxError::CorruptPdf { .. }));
    }

    #[tokio::test]
    async fn directory_failure_stops_before_engine() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let cfg = config(&blocker.join("img"), Arc::new(FailingEngine));

        let err = convert(tmp.path().join("doc.pdf"), &cfg).await.unwrap_err();
        assert!(matches!(err, Pdf2MdxError::AssetsDir { .. }));
    }

    #[tokio::test]
    async fn from_bytes_names_images_after_file_name() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path(), Arc::new(ChattyEngine));

        let out = convert_from_bytes(b"%PDF-1.7", "upload.pdf", &cfg)
            .await
            .unwrap();
        assert!(out.markdown.contains("![](img/upload.pdf-0-0.png)"));
    }

    #[tokio::test]
    async fn from_bytes_rejects_empty_name() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path(), Arc::new(ChattyEngine));
        let err = convert_from_bytes(b"%PDF", "", &cfg).await.unwrap_err();
        assert!(matches!(err, Pdf2MdxError::InvalidConfig(_)));
    }

    #[test]
    fn sync_wrapper_runs_pipeline() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = config(tmp.path(), Arc::new(ChattyEngine));
        let out = convert_sync(tmp.path().join("s.pdf"), &cfg).unwrap();
        assert!(out.markdown.starts_with("# Title"));
    }

    #[test]
    fn written_images_skips_missing_and_remote() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("a.png"), b"x").unwrap();
        let raw = "![](/x/a.png) ![](/x/gone.png) ![](https://h/a.png)";
        assert_eq!(written_images(raw, tmp.path()), vec![tmp.path().join("a.png")]);
    }
}
