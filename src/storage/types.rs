use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Local, NaiveDateTime, TimeZone, Timelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error_handling::types::StorageError;

/// Timestamp layout embedded in artifact filenames.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Human readable caption layout used by the timeline, in local time.
pub const DISPLAY_FORMAT: &str = "%A, %B %d, %Y • %H:%M:%S";

fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9-]+)_(\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2})\.([A-Za-z0-9-]+)$")
            .expect("artifact filename pattern is valid")
    })
}

/// Returns true when `segment` can be used as a filename prefix or extension.
pub fn is_valid_name_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Identifier of one captured artifact: its filename,
/// `<prefix>_<YYYY-MM-DD_HH-MM-SS>.<ext>`.
///
/// For a fixed prefix and extension the lexicographic order of identifiers is
/// their chronological order, so sorting ids never needs file metadata.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId {
    name: String,
    captured_at: NaiveDateTime,
}

impl ArtifactId {
    /// Builds the identifier for an artifact captured at `captured_at`.
    ///
    /// `prefix` and `extension` are validated by the configuration layer.
    pub fn new(prefix: &str, captured_at: NaiveDateTime, extension: &str) -> Self {
        let name = format!(
            "{}_{}.{}",
            prefix,
            captured_at.format(TIMESTAMP_FORMAT),
            extension
        );
        // Second resolution, so equality with a parsed id holds.
        let captured_at = captured_at.with_nanosecond(0).unwrap_or(captured_at);
        Self { name, captured_at }
    }

    pub fn parse(name: &str) -> Result<Self, StorageError> {
        let caps = filename_pattern()
            .captures(name)
            .ok_or_else(|| StorageError::InvalidIdentifier(name.to_string()))?;
        let captured_at = NaiveDateTime::parse_from_str(&caps[2], TIMESTAMP_FORMAT)
            .map_err(|_| StorageError::InvalidIdentifier(name.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            captured_at,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    pub fn prefix(&self) -> &str {
        self.name.split_once('_').map(|(p, _)| p).unwrap_or_default()
    }

    pub fn extension(&self) -> &str {
        self.name.rsplit_once('.').map(|(_, e)| e).unwrap_or_default()
    }

    /// Capture instant in UTC.
    pub fn captured_at(&self) -> NaiveDateTime {
        self.captured_at
    }

    pub fn display_time(&self) -> String {
        self.display_time_in(&Local)
    }

    /// Caption for the capture instant rendered in `tz`.
    pub fn display_time_in<Tz: TimeZone>(&self, tz: &Tz) -> String
    where
        Tz::Offset: fmt::Display,
    {
        Utc.from_utc_datetime(&self.captured_at)
            .with_timezone(tz)
            .format(DISPLAY_FORMAT)
            .to_string()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl FromStr for ArtifactId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.name
    }
}

/// One live entry of the description store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionRecord {
    pub id: ArtifactId,
    pub text: String,
}
