use anyhow::Result;
use std::path::PathBuf;
use tokio::fs;
use tracing::info;

/// On-disk image storage.
///
/// Each upload is stored as a single flat file at `{storage_dir}/{image_id}`.
/// Metadata (content type, size, hash) lives in the images table.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Path to the file for a given image.
    pub fn file_path(&self, image_id: &str) -> PathBuf {
        self.dir.join(image_id)
    }

    pub async fn write(&self, image_id: &str, data: &[u8]) -> Result<()> {
        fs::write(self.file_path(image_id), data).await?;
        Ok(())
    }

    pub async fn read(&self, image_id: &str) -> Result<Vec<u8>> {
        Ok(fs::read(self.file_path(image_id)).await?)
    }

    /// Delete an image file. Missing files are not an error: the DB row is
    /// the source of truth and may outlive a manually-pruned file.
    pub async fn delete(&self, image_id: &str) -> Result<()> {
        match fs::remove_file(self.file_path(image_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
