use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};

use super::command::{run_command, CommandFailure};
use super::types::CapturedImage;
use crate::error_handling::types::OcrError;

/// Turns an image into raw text.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, image: &CapturedImage) -> Result<String, OcrError>;
}

/// Folds OCR output onto a single line: line breaks become spaces and the
/// result is trimmed.
pub fn normalize_text(raw: &str) -> String {
    raw.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Runs an external OCR tool on a temp copy of the image and returns its
/// stdout, `["tesseract", "{path}", "stdout"]` by default.
pub struct CommandOcr {
    command: Vec<String>,
    timeout: Duration,
}

impl CommandOcr {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

#[async_trait]
impl OcrEngine for CommandOcr {
    async fn extract_text(&self, image: &CapturedImage) -> Result<String, OcrError> {
        let mut input = tempfile::Builder::new()
            .prefix("recall-ocr-")
            .suffix(&format!(".{}", image.extension))
            .tempfile()
            .map_err(|e| {
                error!("Failed to create OCR input: {}", e);
                OcrError::IoError(e)
            })?;
        input.write_all(&image.bytes)?;
        input.flush()?;

        let stdout = run_command(&self.command, input.path(), self.timeout)
            .await
            .map_err(|failure| match failure {
                CommandFailure::Spawn(e) => OcrError::IoError(e),
                CommandFailure::TimedOut => OcrError::Timeout(self.timeout.as_secs()),
                CommandFailure::Status(msg) => OcrError::CommandFailed(msg),
            })?;

        let text = String::from_utf8(stdout).map_err(|e| OcrError::InvalidOutput(e.to_string()))?;
        debug!("OCR extracted {} char(s)", text.chars().count());
        Ok(text)
    }
}
