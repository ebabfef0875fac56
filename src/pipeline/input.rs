//! Input validation: confirm a path names a readable PDF before pdfium sees it.
//!
//! pdfium reports a missing file, a permission problem and a non-PDF all as a
//! generic load failure. Checking up front gives the user an error that says
//! which one it was.

use crate::error::Pdf2MdxError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// How far into the file the `%PDF` header may start. Readers tolerate junk
/// (BOMs, blank lines, mail headers) before it.
const HEADER_SEARCH_LEN: usize = 1024;

/// Validate that `path` exists, is readable, and carries a `%PDF` header within
/// its first [`HEADER_SEARCH_LEN`] bytes.
pub fn check_pdf(path: &Path) -> Result<(), Pdf2MdxError> {
    if !path.exists() {
        return Err(Pdf2MdxError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2MdxError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Pdf2MdxError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let mut head = Vec::with_capacity(HEADER_SEARCH_LEN);
    // An unreadable head is left for pdfium to report.
    if file.take(HEADER_SEARCH_LEN as u64).read_to_end(&mut head).is_ok()
        && !has_pdf_header(&head)
    {
        let mut magic = [0u8; 4];
        let n = head.len().min(4);
        magic[..n].copy_from_slice(&head[..n]);
        return Err(Pdf2MdxError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Input PDF looks valid: {}", path.display());
    Ok(())
}

fn has_pdf_header(head: &[u8]) -> bool {
    head.windows(4).any(|w| w == b"%PDF")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let err = check_pdf(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, Pdf2MdxError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_magic_is_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"hello world").unwrap();

        let err = check_pdf(&path).unwrap_err();
        match err {
            Pdf2MdxError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn header_after_leading_bytes_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crlf.pdf");
        std::fs::write(&path, b"\r\n%PDF-1.4\n%%EOF\n").unwrap();
        assert!(check_pdf(&path).is_ok());
    }

    #[test]
    fn header_beyond_search_window_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.pdf");
        let mut bytes = vec![b' '; HEADER_SEARCH_LEN];
        bytes.extend_from_slice(b"%PDF-1.4\n");
        std::fs::write(&path, bytes).unwrap();
        assert!(matches!(
            check_pdf(&path).unwrap_err(),
            Pdf2MdxError::NotAPdf { .. }
        ));
    }

    #[test]
    fn empty_file_is_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, b"").unwrap();
        match check_pdf(&path).unwrap_err() {
            Pdf2MdxError::NotAPdf { magic, .. } => assert_eq!(magic, [0; 4]),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn pdf_magic_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.pdf");
        std::fs::write(&path, b"%PDF-1.7\n%%EOF\n").unwrap();
        assert!(check_pdf(&path).is_ok());
    }
}
