use serde::Deserialize;

/// `[capture]` section: how and how often the screen is captured.
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    /// Seconds slept between two ticks of the capture loop
    pub interval_secs: u64,
    /// Leading segment of every artifact filename
    pub prefix: String,
    /// Image file extension, without the dot
    pub extension: String,
    /// Screenshot command; `{path}` is replaced by the file to write
    pub command: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            prefix: String::from("snapshot"),
            extension: String::from("png"),
            command: vec![
                String::from("scrot"),
                String::from("--overwrite"),
                String::from("{path}"),
            ],
            timeout_secs: 30,
        }
    }
}

/// `[ocr]` section
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OcrConfig {
    /// OCR command; `{path}` is replaced by the image, text is read from stdout
    pub command: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: vec![
                String::from("tesseract"),
                String::from("{path}"),
                String::from("stdout"),
            ],
            timeout_secs: 30,
        }
    }
}

/// `[retention]` section
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetentionConfig {
    /// Capacity written to a freshly created control state
    pub default_capacity: usize,
    /// Upper bound accepted by `set-capacity`
    pub max_capacity: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            default_capacity: 100,
            max_capacity: 1000,
        }
    }
}

/// `[web]` section
#[derive(Debug, PartialEq, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebConfig {
    pub bind_address: String,
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_address: String::from("127.0.0.1"),
            port: 8501,
        }
    }
}
