//! Common data types used across the data_capture subsystem.

/// One screen image as returned by a [`ScreenCapture`](super::ScreenCapture).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    /// Encoded image bytes, ready to be written to disk as is.
    pub bytes: Vec<u8>,
    /// File extension matching the encoding, without the dot.
    pub extension: String,
}

impl CapturedImage {
    pub fn new(bytes: Vec<u8>, extension: &str) -> Self {
        Self {
            bytes,
            extension: extension.to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
