use crate::error::DownloaderError;
use std::io;
use std::path::Path;
use tokio::fs::{self, OpenOptions};

/// Checks that `path` is an existing directory files can be written to. Nothing is
/// left behind in it.
pub async fn ensure_destination_dir(path: &Path) -> Result<(), DownloaderError> {
    let metadata = match fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => metadata,
        Ok(_) => return Err(DownloaderError::InvalidDirectory(path.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DownloaderError::InvalidDirectory(path.to_path_buf()))
        }
        Err(e) => return Err(DownloaderError::DirectoryMetadata(path.to_path_buf(), e)),
    };
    if metadata.permissions().readonly() {
        return Err(DownloaderError::UnwritableDirectory(
            path.to_path_buf(),
            io::ErrorKind::PermissionDenied.into(),
        ));
    }

    // permission bits alone miss ACLs and read-only mounts
    let check = path.join(format!(".opendata-downloader-{}.tmp", std::process::id()));
    match OpenOptions::new().write(true).create_new(true).open(&check).await {
        Ok(file) => {
            drop(file);
            fs::remove_file(&check)
                .await
                .map_err(|e| DownloaderError::UnwritableDirectory(path.to_path_buf(), e))
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(DownloaderError::UnwritableDirectory(path.to_path_buf(), e)),
    }
}
