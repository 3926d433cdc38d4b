use std::fmt;
use std::path::PathBuf;

use crate::storage::types::ArtifactId;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
    InvalidValue(String),
    NotInRange(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {}", e),
            ConfigError::NotInRange(e) => write!(f, "Value out of range: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

/// Failures of the artifact directory and the description store.
#[derive(Debug)]
pub enum StorageError {
    ReadFailed(PathBuf, std::io::Error),
    WriteFailed(PathBuf, std::io::Error),
    InvalidIdentifier(String),
    NotFound(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ReadFailed(p, e) => {
                write!(f, "Storage read failed for {}: {}", p.display(), e)
            }
            StorageError::WriteFailed(p, e) => {
                write!(f, "Storage write failed for {}: {}", p.display(), e)
            }
            StorageError::InvalidIdentifier(id) => write!(f, "Invalid artifact identifier: {}", id),
            StorageError::NotFound(id) => write!(f, "Artifact not found: {}", id),
        }
    }
}

impl std::error::Error for StorageError {}

#[derive(Debug)]
pub enum CaptureError {
    IoError(std::io::Error),
    CommandFailed(String),
    Timeout(u64),
    EmptyImage,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::IoError(e) => write!(f, "Screen capture IO error: {}", e),
            CaptureError::CommandFailed(e) => write!(f, "Screen capture command failed: {}", e),
            CaptureError::Timeout(secs) => write!(f, "Screen capture timed out after {}s", secs),
            CaptureError::EmptyImage => write!(f, "Screen capture produced an empty image"),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::IoError(err)
    }
}

#[derive(Debug)]
pub enum OcrError {
    IoError(std::io::Error),
    CommandFailed(String),
    Timeout(u64),
    InvalidOutput(String),
}

impl fmt::Display for OcrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OcrError::IoError(e) => write!(f, "OCR IO error: {}", e),
            OcrError::CommandFailed(e) => write!(f, "OCR command failed: {}", e),
            OcrError::Timeout(secs) => write!(f, "OCR timed out after {}s", secs),
            OcrError::InvalidOutput(e) => write!(f, "OCR produced invalid output: {}", e),
        }
    }
}

impl std::error::Error for OcrError {}

impl From<std::io::Error> for OcrError {
    fn from(err: std::io::Error) -> Self {
        OcrError::IoError(err)
    }
}

/// Failures reading or writing the persisted run flag and capacity.
#[derive(Debug)]
pub enum ControlError {
    ReadFailed(PathBuf, std::io::Error),
    WriteFailed(PathBuf, std::io::Error),
    Corrupt(PathBuf, String),
    InvalidCapacity { requested: usize, max: usize },
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::ReadFailed(p, e) => {
                write!(f, "Control state read failed for {}: {}", p.display(), e)
            }
            ControlError::WriteFailed(p, e) => {
                write!(f, "Control state write failed for {}: {}", p.display(), e)
            }
            ControlError::Corrupt(p, e) => {
                write!(f, "Control state in {} is corrupt: {}", p.display(), e)
            }
            ControlError::InvalidCapacity { requested, max } => {
                write!(f, "Capacity {} is outside 1..={}", requested, max)
            }
        }
    }
}

impl std::error::Error for ControlError {}

/// A divergence between the artifact directory and the description store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyError {
    /// A description record whose artifact file no longer exists.
    OrphanRecord(ArtifactId),
    /// An artifact that has no description record.
    UndescribedArtifact(ArtifactId),
}

impl fmt::Display for ConsistencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyError::OrphanRecord(id) => {
                write!(f, "Description record without artifact: {}", id)
            }
            ConsistencyError::UndescribedArtifact(id) => {
                write!(f, "Artifact without description: {}", id)
            }
        }
    }
}

impl std::error::Error for ConsistencyError {}

#[derive(Debug)]
pub enum WebError {
    BindFailed(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::BindFailed(e) => write!(f, "Web server bind failed: {}", e),
        }
    }
}

impl std::error::Error for WebError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    StorageError(StorageError),
    ControlError(ControlError),
    WebError(WebError),
    InitializationFailed(String),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::StorageError(e) => write!(f, "Storage error: {}", e),
            ControllerError::ControlError(e) => write!(f, "Control error: {}", e),
            ControllerError::WebError(e) => write!(f, "Web error: {}", e),
            ControllerError::InitializationFailed(e) => write!(f, "Initialization failed: {}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<StorageError> for ControllerError {
    fn from(err: StorageError) -> Self {
        ControllerError::StorageError(err)
    }
}

impl From<ControlError> for ControllerError {
    fn from(err: ControlError) -> Self {
        ControllerError::ControlError(err)
    }
}

impl From<WebError> for ControllerError {
    fn from(err: WebError) -> Self {
        ControllerError::WebError(err)
    }
}
