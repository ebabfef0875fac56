//! Image directory preparation.

use crate::error::Pdf2MdxError;
use std::path::Path;
use tracing::debug;

/// Create `dir` and any missing parents. An existing directory is fine.
pub async fn prepare_assets_dir(dir: &Path) -> Result<(), Pdf2MdxError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| Pdf2MdxError::AssetsDir {
            path: dir.to_path_buf(),
            source,
        })?;
    debug!("Image directory ready: {}", dir.display());
    Ok(())
}
