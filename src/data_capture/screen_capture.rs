use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};

use super::command::{run_command, CommandFailure};
use super::types::CapturedImage;
use crate::error_handling::types::CaptureError;

/// Source of screen images.
#[async_trait]
pub trait ScreenCapture: Send + Sync {
    async fn capture(&self) -> Result<CapturedImage, CaptureError>;
}

/// Captures the screen by running an external screenshot tool.
///
/// The configured command must write the image to `{path}`, e.g.
/// `["scrot", "--overwrite", "{path}"]` or `["grim", "{path}"]`.
pub struct CommandCapture {
    command: Vec<String>,
    extension: String,
    timeout: Duration,
}

impl CommandCapture {
    pub fn new(command: Vec<String>, extension: &str, timeout: Duration) -> Self {
        Self {
            command,
            extension: extension.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl ScreenCapture for CommandCapture {
    async fn capture(&self) -> Result<CapturedImage, CaptureError> {
        let target = tempfile::Builder::new()
            .prefix("recall-capture-")
            .suffix(&format!(".{}", self.extension))
            .tempfile()
            .map_err(|e| {
                error!("Failed to create capture target: {}", e);
                CaptureError::IoError(e)
            })?;

        run_command(&self.command, target.path(), self.timeout)
            .await
            .map_err(|failure| match failure {
                CommandFailure::Spawn(e) => CaptureError::IoError(e),
                CommandFailure::TimedOut => CaptureError::Timeout(self.timeout.as_secs()),
                CommandFailure::Status(msg) => CaptureError::CommandFailed(msg),
            })?;

        let bytes = tokio::fs::read(target.path()).await?;
        if bytes.is_empty() {
            return Err(CaptureError::EmptyImage);
        }
        debug!("Captured {} byte(s) of {}", bytes.len(), self.extension);
        Ok(CapturedImage::new(bytes, &self.extension))
    }
}
