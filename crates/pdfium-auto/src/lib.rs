//! # pdfium-auto
//!
//! Finds a pdfium shared library for `pdfium-render` and binds it.
//!
//! [`locate_pdfium`] resolves the library once per process, first match wins:
//!
//! 1. the copy embedded by the `bundled` feature, written to the cache dir;
//! 2. `PDFIUM_LIB_PATH`, when it names an existing file;
//! 3. a previously downloaded library in the cache dir;
//! 4. a fresh download of the platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    unpacked into the cache dir.
//!
//! The cache dir is `<platform cache>/pdf2mdx/pdfium-<version>/`, or
//! `$PDFIUM_AUTO_CACHE_DIR/pdfium-<version>/` when that is set.
//!
//! ```rust,no_run
//! let path = pdfium_auto::locate_pdfium()?;
//! let pdfium = pdfium_auto::bind_library(&path)?;
//! # Ok::<(), pdfium_auto::PdfiumAutoError>(())
//! ```

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

/// pdfium-binaries release (`chromium/<n>`) that downloads come from.
pub const PDFIUM_VERSION: &str = "7690";

const CACHE_NAMESPACE: &str = "pdf2mdx";

const RELEASES_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("No pdfium build for {os}/{arch}")]
    UnsupportedPlatform { os: &'static str, arch: &'static str },

    #[error("Cannot write pdfium to '{path}': {source}")]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pdfium download failed: {0}")]
    Download(String),

    #[error("pdfium archive unreadable: {0}")]
    Extract(String),

    #[error("Failed to bind pdfium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Platforms ────────────────────────────────────────────────────────────────

/// One published pdfium build.
#[derive(Debug, PartialEq, Eq)]
struct Platform {
    os: &'static str,
    arch: &'static str,
    /// Release asset, e.g. `pdfium-linux-x64.tgz`.
    archive: &'static str,
    /// Library path inside the archive.
    member: &'static str,
}

impl Platform {
    fn library_name(&self) -> &'static str {
        self.member.rsplit('/').next().unwrap_or(self.member)
    }
}

const PLATFORMS: &[Platform] = &[
    Platform { os: "linux", arch: "x86_64", archive: "pdfium-linux-x64.tgz", member: "lib/libpdfium.so" },
    Platform { os: "linux", arch: "aarch64", archive: "pdfium-linux-arm64.tgz", member: "lib/libpdfium.so" },
    Platform { os: "macos", arch: "x86_64", archive: "pdfium-mac-x64.tgz", member: "lib/libpdfium.dylib" },
    Platform { os: "macos", arch: "aarch64", archive: "pdfium-mac-arm64.tgz", member: "lib/libpdfium.dylib" },
    Platform { os: "windows", arch: "x86_64", archive: "pdfium-win-x64.tgz", member: "bin/pdfium.dll" },
    Platform { os: "windows", arch: "aarch64", archive: "pdfium-win-arm64.tgz", member: "bin/pdfium.dll" },
    Platform { os: "windows", arch: "x86", archive: "pdfium-win-x86.tgz", member: "bin/pdfium.dll" },
];

fn platform_for(os: &str, arch: &str) -> Option<&'static Platform> {
    PLATFORMS.iter().find(|p| p.os == os && p.arch == arch)
}

fn current_platform() -> Result<&'static Platform, PdfiumAutoError> {
    let (os, arch) = (std::env::consts::OS, std::env::consts::ARCH);
    platform_for(os, arch).ok_or(PdfiumAutoError::UnsupportedPlatform { os, arch })
}

// ── Locations ────────────────────────────────────────────────────────────────

/// Directory the library is written to for this pdfium version.
pub fn cache_dir() -> PathBuf {
    cache_dir_in(std::env::var_os("PDFIUM_AUTO_CACHE_DIR").map(PathBuf::from))
}

fn cache_dir_in(override_dir: Option<PathBuf>) -> PathBuf {
    let versioned = format!("pdfium-{PDFIUM_VERSION}");
    match override_dir {
        Some(dir) => dir.join(versioned),
        None => dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .unwrap_or_else(std::env::temp_dir)
            .join(CACHE_NAMESPACE)
            .join(versioned),
    }
}

/// `PDFIUM_LIB_PATH`, if it names an existing file.
fn explicit_library(value: Option<OsString>) -> Option<PathBuf> {
    let path = PathBuf::from(value.filter(|v| !v.is_empty())?);
    if path.is_file() {
        Some(path)
    } else {
        warn!("PDFIUM_LIB_PATH '{}' is not a file; ignoring it", path.display());
        None
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

static LOCATED: OnceLock<PathBuf> = OnceLock::new();

/// Path of a usable pdfium library, downloading it on first use if needed.
///
/// The result is memoised for the life of the process.
pub fn locate_pdfium() -> Result<PathBuf, PdfiumAutoError> {
    if let Some(path) = LOCATED.get() {
        return Ok(path.clone());
    }
    let path = resolve()?;
    debug!("pdfium library: {}", path.display());
    Ok(LOCATED.get_or_init(|| path).clone())
}

fn resolve() -> Result<PathBuf, PdfiumAutoError> {
    let platform = current_platform()?;
    let target = cache_dir().join(platform.library_name());

    if let Some(bytes) = bundled_bytes() {
        install(&target, bytes)?;
        return Ok(target);
    }
    if let Some(path) = explicit_library(std::env::var_os("PDFIUM_LIB_PATH")) {
        return Ok(path);
    }
    if target.is_file() {
        return Ok(target);
    }

    let url = format!("{RELEASES_URL}/chromium%2F{PDFIUM_VERSION}/{}", platform.archive);
    info!("Downloading pdfium {PDFIUM_VERSION} from {url}");
    let archive = download(&url)?;
    let library = read_member(archive.as_slice(), platform.member)?;
    install(&target, &library)?;
    Ok(target)
}

#[cfg(feature = "bundled")]
mod bundled {
    include!(concat!(env!("OUT_DIR"), "/bundled.rs"));
}

/// The library embedded by the `bundled` feature, if any.
fn bundled_bytes() -> Option<&'static [u8]> {
    #[cfg(feature = "bundled")]
    return Some(bundled::PDFIUM_BYTES);
    #[cfg(not(feature = "bundled"))]
    None
}

/// Load the library at `path`.
pub fn bind_library(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── I/O helpers ──────────────────────────────────────────────────────────────

fn download(url: &str) -> Result<Vec<u8>, PdfiumAutoError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PdfiumAutoError::Download(e.to_string()))?;
    let bytes = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map_err(|e| PdfiumAutoError::Download(format!("GET {url}: {e}")))?;
    Ok(bytes.to_vec())
}

/// Contents of `member` inside a gzipped tar archive.
fn read_member(archive: impl Read, member: &str) -> Result<Vec<u8>, PdfiumAutoError> {
    let extract = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(archive));
    for entry in tar.entries().map_err(extract)? {
        let mut entry = entry.map_err(extract)?;
        if entry.path().map_err(extract)? == Path::new(member) {
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).map_err(extract)?;
            return Ok(bytes);
        }
    }
    Err(PdfiumAutoError::Extract(format!("'{member}' not in archive")))
}

/// Write `bytes` to `dest` unless a file of the same length is already there.
///
/// The bytes go to a sibling `.partial` file first and are renamed into place,
/// so another process never loads a half-written library.
fn install(dest: &Path, bytes: &[u8]) -> Result<(), PdfiumAutoError> {
    if std::fs::metadata(dest).is_ok_and(|m| m.len() == bytes.len() as u64) {
        return Ok(());
    }
    let cache = |source| PdfiumAutoError::Cache {
        path: dest.to_path_buf(),
        source,
    };
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(cache)?;
    }
    let partial = dest.with_extension("partial");
    std::fs::write(&partial, bytes)
        .and_then(|()| std::fs::rename(&partial, dest))
        .map_err(cache)?;
    debug!("Wrote {} bytes to {}", bytes.len(), dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;

    fn tgz(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    #[test]
    fn current_platform_is_published() {
        let platform = current_platform().unwrap();
        assert!(platform.archive.ends_with(".tgz"));
    }

    #[test]
    fn platform_lookup() {
        let linux = platform_for("linux", "x86_64").unwrap();
        assert_eq!(linux.member, "lib/libpdfium.so");
        assert_eq!(linux.library_name(), "libpdfium.so");
        assert_eq!(platform_for("windows", "x86").unwrap().library_name(), "pdfium.dll");
        assert!(platform_for("freebsd", "x86_64").is_none());
    }

    #[test]
    fn cache_dir_is_versioned() {
        let default = cache_dir_in(None);
        assert!(default.ends_with(format!("{CACHE_NAMESPACE}/pdfium-{PDFIUM_VERSION}")));

        let custom = cache_dir_in(Some(PathBuf::from("/opt/cache")));
        assert_eq!(custom, Path::new("/opt/cache").join(format!("pdfium-{PDFIUM_VERSION}")));
    }

    #[test]
    fn explicit_library_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let lib = tmp.path().join("libpdfium.so");
        std::fs::write(&lib, b"elf").unwrap();

        assert_eq!(explicit_library(Some(lib.clone().into())), Some(lib));
        assert_eq!(explicit_library(Some(tmp.path().join("gone.so").into())), None);
        assert_eq!(explicit_library(Some(OsString::new())), None);
        assert_eq!(explicit_library(None), None);
    }

    #[test]
    fn read_member_finds_library() {
        let archive = tgz(&[("include/fpdfview.h", b"header"), ("lib/libpdfium.so", b"library")]);
        assert_eq!(read_member(archive.as_slice(), "lib/libpdfium.so").unwrap(), b"library");
    }

    #[test]
    fn read_member_reports_missing_entry() {
        let archive = tgz(&[("lib/other.so", b"x")]);
        let err = read_member(archive.as_slice(), "lib/libpdfium.so").unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Extract(msg) if msg.contains("libpdfium.so")));
    }

    #[test]
    fn read_member_rejects_non_gzip() {
        let err = read_member(&b"not an archive"[..], "lib/libpdfium.so").unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Extract(_)));
    }

    #[test]
    fn install_writes_once_per_length() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("nested/libpdfium.so");

        install(&dest, b"fake library").unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"fake library");
        assert!(!dest.with_extension("partial").exists());

        // Same length: kept.
        install(&dest, b"FAKE LIBRARY").unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"fake library");

        install(&dest, b"newer").unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"newer");
    }

    #[test]
    fn install_into_blocked_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let err = install(&blocker.join("libpdfium.so"), b"lib").unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Cache { .. }));
    }

    #[cfg(not(feature = "bundled"))]
    #[test]
    fn unbundled_build_has_no_embedded_library() {
        assert!(bundled_bytes().is_none());
    }
}
