//! CLI binary for pdf2mdx.
//!
//! A thin shim over the library crate: maps arguments to `ConversionConfig`,
//! runs one conversion, and prints the Markdown to stdout verbatim.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2mdx::{convert, write_markdown, ConversionConfig, ImageFormat, TableStrategy};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Images land in the site's public dir; links point at the served path
  pdf2mdx report.pdf /srv/blog/public/img/report /img/report > report.mdx

  # Relative link prefix
  pdf2mdx paper.pdf "$PWD/assets/paper" assets/paper > paper.md

OUTPUT:
  stdout  the Markdown, exactly as produced (no trailing newline added)
  stderr  usage errors, diagnostics and logs

  Image links become ![](<ASSETS_DIR_REL>/<file>); http(s) and data: links
  are kept. A line that is exactly "..." becomes "（省略）" and every <br>
  becomes <br /> so the result compiles as MDX.

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Log filter (overrides --verbose)

  PDFium (~30 MB) is downloaded automatically on first run and cached in
  ~/.cache/pdf2mdx/pdfium-7690/ unless this build bundles it.
"#;

/// Convert a PDF to MDX-safe Markdown, extracting its images.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2mdx",
    version,
    about = "Convert a PDF to MDX-safe Markdown, extracting images to a directory",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to convert.
    pdf_path: PathBuf,

    /// Directory extracted images are written to (created if missing).
    assets_dir_abs: PathBuf,

    /// Prefix used for image links in the Markdown.
    assets_dir_rel: String,

    /// Resolution of extracted images (72–600).
    #[arg(long, env = "PDF2MDX_DPI", default_value_t = 180,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Encoding of extracted images.
    #[arg(long, env = "PDF2MDX_IMAGE_FORMAT", value_enum, default_value = "png")]
    image_format: ImageFormatArg,

    /// How ruled tables are detected.
    #[arg(long, env = "PDF2MDX_TABLE_STRATEGY", value_enum, default_value = "lines-strict")]
    table_strategy: TableStrategyArg,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2MDX_PASSWORD")]
    password: Option<String>,

    /// Enable DEBUG-level tracing logs on stderr.
    #[arg(short, long, env = "PDF2MDX_VERBOSE")]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum ImageFormatArg {
    Png,
    Jpeg,
}

impl From<ImageFormatArg> for ImageFormat {
    fn from(v: ImageFormatArg) -> Self {
        match v {
            ImageFormatArg::Png => ImageFormat::Png,
            ImageFormatArg::Jpeg => ImageFormat::Jpeg,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum TableStrategyArg {
    LinesStrict,
    Lines,
    None,
}

impl From<TableStrategyArg> for TableStrategy {
    fn from(v: TableStrategyArg) -> Self {
        match v {
            TableStrategyArg::LinesStrict => TableStrategy::LinesStrict,
            TableStrategyArg::Lines => TableStrategy::Lines,
            TableStrategyArg::None => TableStrategy::None,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // stdout carries only the Markdown, so logs always go to stderr.
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli).context("Invalid arguments")?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = convert(&cli.pdf_path, &config)
        .await
        .with_context(|| format!("Conversion of '{}' failed", cli.pdf_path.display()))?;

    write_markdown(&output.markdown).context("Failed to write to stdout")?;

    tracing::debug!(
        "{} images, {} bytes of engine stdout discarded, {}ms",
        output.images.len(),
        output.suppressed_bytes,
        output.duration_ms
    );
    Ok(())
}

fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .assets_dir(&cli.assets_dir_abs)
        .assets_rel(&cli.assets_dir_rel)
        .dpi(cli.dpi)
        .image_format(cli.image_format.clone().into())
        .table_strategy(cli.table_strategy.clone().into());

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }

    Ok(builder.build()?)
}
