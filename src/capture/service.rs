use super::camera::StillCamera;
use crate::error::CaptureError;
use chrono::{Local, NaiveDateTime};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// File name for a capture taken at `timestamp`. Later shots within the same
/// second get a numeric suffix.
pub fn artifact_file_name(timestamp: NaiveDateTime, attempt: u32) -> String {
    let stem = timestamp.format("%Y-%m-%d_%H:%M:%S");
    if attempt == 0 {
        format!("{}.jpg", stem)
    } else {
        format!("{}_{}.jpg", stem, attempt)
    }
}

/// Takes single photos and stores them as timestamped JPEG files
pub struct CaptureService {
    output_dir: PathBuf,
    camera: Arc<dyn StillCamera>,
}

impl CaptureService {
    pub fn new<P: Into<PathBuf>>(output_dir: P, camera: Arc<dyn StillCamera>) -> Self {
        Self {
            output_dir: output_dir.into(),
            camera,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Capture one photo and return the path of the written artifact
    pub async fn capture(&self) -> Result<PathBuf, CaptureError> {
        self.ensure_output_dir().await?;

        let (path, mut file) = self.create_artifact(Local::now().naive_local()).await?;

        info!("Taking photo with {} -> {}", self.camera.name(), path.display());

        let bytes = match self.camera.capture_jpeg().await {
            Ok(bytes) => bytes,
            Err(e) => {
                drop(file);
                self.discard(&path).await;
                return Err(e);
            }
        };

        let written = match file.write_all(&bytes).await {
            Ok(()) => file.flush().await,
            Err(e) => Err(e),
        };

        if let Err(source) = written {
            drop(file);
            self.discard(&path).await;
            return Err(CaptureError::Write {
                path: path.display().to_string(),
                source,
            });
        }

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    async fn ensure_output_dir(&self) -> Result<(), CaptureError> {
        if fs::metadata(&self.output_dir).await.is_ok() {
            return Ok(());
        }

        fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| CaptureError::DirectoryCreation {
                path: self.output_dir.display().to_string(),
                source,
            })?;
        info!("Created capture directory: {}", self.output_dir.display());
        Ok(())
    }

    async fn create_artifact(
        &self,
        timestamp: NaiveDateTime,
    ) -> Result<(PathBuf, File), CaptureError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.output_dir.join(artifact_file_name(timestamp, attempt));

            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(source) => {
                    return Err(CaptureError::FileCreation {
                        path: path.display().to_string(),
                        source,
                    })
                }
            }
        }

        Err(CaptureError::FileCreation {
            path: self
                .output_dir
                .join(artifact_file_name(timestamp, 0))
                .display()
                .to_string(),
            source: std::io::Error::from(std::io::ErrorKind::AlreadyExists),
        })
    }

    async fn discard(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            warn!("Failed to remove incomplete capture {}: {}", path.display(), e);
        }
    }
}
