use crate::config::CaptureConfig;
use crate::error::CaptureError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// A mechanism able to take a single still photo
#[async_trait]
pub trait StillCamera: Send + Sync {
    /// Take one photo and return the encoded JPEG bytes
    async fn capture_jpeg(&self) -> Result<Vec<u8>, CaptureError>;

    /// Name used in logs
    fn name(&self) -> &str;
}

/// Camera backed by an external still-capture program writing JPEG data to stdout
pub struct CommandCamera {
    program: String,
    args: Vec<String>,
}

impl CommandCamera {
    pub fn new(config: &CaptureConfig) -> Self {
        info!(
            "Using still capture command: {} {}",
            config.command,
            config.args.join(" ")
        );
        Self {
            program: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait]
impl StillCamera for CommandCamera {
    // No timeout: a hung capture program stalls the calling task
    async fn capture_jpeg(&self) -> Result<Vec<u8>, CaptureError> {
        debug!("Running {} {:?}", self.program, self.args);

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    CaptureError::CameraUnavailable {
                        details: format!("cannot run {}: {}", self.program, e),
                    }
                }
                _ => CaptureError::Mechanism {
                    details: format!("failed to run {}: {}", self.program, e),
                },
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureError::Mechanism {
                details: format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            });
        }

        if output.stdout.is_empty() {
            return Err(CaptureError::EmptyImage);
        }

        debug!("Captured {} bytes", output.stdout.len());
        Ok(output.stdout)
    }

    fn name(&self) -> &str {
        &self.program
    }
}
