//! Stdout suppression around the conversion engine.
//!
//! pdfium (and any engine a caller plugs in) may print diagnostics straight to
//! file descriptor 1. The binary's stdout carries the Markdown and nothing
//! else, so the engine call runs inside a [`StdoutSilencer`]: fd 1 is pointed
//! at an anonymous temp file for the lifetime of the guard and restored when
//! the guard drops, whether the call returned, failed or panicked.
//!
//! Only one redirect can be active per process. The guard holds a global lock
//! for its whole lifetime, so concurrent conversions in one process queue up
//! instead of failing.

use crate::error::Pdf2MdxError;
use gag::BufferRedirect;
use std::io::{self, Read, Write};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

static REDIRECT_LOCK: Mutex<()> = Mutex::new(());

/// Scope guard capturing everything written to stdout while it is alive.
pub struct StdoutSilencer {
    // Field order matters: the redirect is undone before the lock is released.
    redirect: Option<BufferRedirect>,
    _lock: MutexGuard<'static, ()>,
}

impl StdoutSilencer {
    /// Start capturing stdout.
    ///
    /// Anything already buffered in Rust's stdout is flushed to the real
    /// stream first so it is not swallowed.
    pub fn start() -> Result<Self, Pdf2MdxError> {
        let lock = REDIRECT_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        io::stdout()
            .flush()
            .map_err(|e| Pdf2MdxError::StdoutRedirect(e.to_string()))?;

        let redirect =
            BufferRedirect::stdout().map_err(|e| Pdf2MdxError::StdoutRedirect(e.to_string()))?;

        Ok(Self {
            redirect: Some(redirect),
            _lock: lock,
        })
    }

    /// Stop capturing, restore stdout, and return the swallowed bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let _ = io::stdout().flush();
        let mut captured = Vec::new();
        if let Some(redirect) = self.redirect.take() {
            // The buffer is read through its own handle, positioned at the start.
            let _ = redirect.into_inner().read_to_end(&mut captured);
        }
        if !captured.is_empty() {
            debug!("Discarded {} bytes of engine stdout", captured.len());
        }
        captured
    }

    /// Run `f` with stdout silenced. Returns `f`'s result and the number of
    /// bytes that were discarded.
    pub fn run<T>(f: impl FnOnce() -> T) -> Result<(T, usize), Pdf2MdxError> {
        let guard = Self::start()?;
        let value = f();
        let discarded = guard.finish().len();
        Ok((value, discarded))
    }
}

impl Drop for StdoutSilencer {
    fn drop(&mut self) {
        // Push pending Rust-side output into the sink before fd 1 is restored.
        if self.redirect.is_some() {
            let _ = io::stdout().flush();
        }
    }
}
