use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads a JSON document. A missing file is `T::default()`; anything else
/// that goes wrong is an error.
pub async fn read_json<T>(path: &Path) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Like [`read_json`], but falls back to `T::default()` when the file is
/// unreadable.
pub async fn load_json<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    read_json(path).await.unwrap_or_else(|err| {
        error!("{err}");
        T::default()
    })
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes to a sibling `.tmp` file and renames it over `path`, so a crash
/// mid-write leaves the previous document intact.
pub async fn persist_json<T: Serialize>(path: &Path, data: &T) -> std::io::Result<()> {
    let payload = serde_json::to_vec_pretty(data)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let staging = staging_path(path);
    fs::write(&staging, payload).await?;
    fs::File::open(&staging).await?.sync_all().await?;
    fs::rename(&staging, path).await
}
