//! In-process collaborators for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::ocr::OcrEngine;
use super::screen_capture::ScreenCapture;
use super::types::CapturedImage;
use crate::error_handling::types::{CaptureError, OcrError};

/// Returns `image-<n>` as PNG bytes, where n counts calls from 0.
#[derive(Default)]
pub struct FakeCapture {
    pub calls: AtomicUsize,
    pub failing: AtomicBool,
}

impl FakeCapture {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ScreenCapture for FakeCapture {
    async fn capture(&self) -> Result<CapturedImage, CaptureError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CaptureError::CommandFailed("no display".to_string()));
        }
        Ok(CapturedImage::new(format!("image-{}", n).into_bytes(), "png"))
    }
}

/// Reads the image bytes back as text, framed as `"  Inbox\n<bytes>\n"`.
#[derive(Default)]
pub struct FakeOcr {
    pub failing: AtomicBool,
}

impl FakeOcr {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn extract_text(&self, image: &CapturedImage) -> Result<String, OcrError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(OcrError::CommandFailed("tesseract crashed".to_string()));
        }
        let body = String::from_utf8_lossy(&image.bytes);
        Ok(format!("  Inbox\n{}\n", body))
    }
}
