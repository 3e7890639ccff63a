//! Persisting the session's cart and wishlist as JSON.

use std::path::{Path, PathBuf};

use bazaar_core::{CartState, Wishlist};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Errors loading or saving a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid snapshot {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything the client keeps between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub cart: CartState,
    #[serde(default)]
    pub wishlist: Wishlist,
}

impl Snapshot {
    /// Read a snapshot. A missing file is an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Io` if the file exists but cannot be read, or
    /// `SnapshotError::Json` if it is not a valid snapshot.
    #[instrument(fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, SnapshotError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No snapshot yet, starting empty");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SnapshotError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the snapshot, replacing `path` only once the new contents are
    /// fully on disk.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::Io` if the temporary file cannot be written or
    /// renamed.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec_pretty(self).map_err(|source| SnapshotError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        let io_err = |source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        };
        tokio::fs::write(&tmp, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;

        debug!(items = self.cart.items().len(), "Snapshot saved");
        Ok(())
    }
}
