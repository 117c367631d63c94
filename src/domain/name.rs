// Copyright (c) 2025 - Cowboy AI, Inc.
//! Partition-Qualified Object Name with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Object name validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Name is empty")]
    Empty,

    #[error("Name must start with '/': {0}")]
    NotQualified(String),

    #[error("Name must have exactly a partition and a short name: {0}")]
    InvalidSegmentCount(String),

    #[error("Name segment is empty: {0}")]
    EmptySegment(String),

    #[error("Name exceeds maximum length of 255 characters: {0}")]
    TooLong(usize),

    #[error("Invalid character in name: {0:?}")]
    InvalidCharacter(char),

    #[error("Name segment must start with a letter, digit or '_': {0}")]
    InvalidSegmentStart(String),
}

/// Fully qualified BIG-IP object name: `/<partition>/<short-name>`
///
/// The full path is the identity key of every object on a device. Invariants:
/// - Starts with `/`
/// - Exactly two non-empty segments (partition, short name)
/// - Segments contain only ASCII alphanumerics, `-`, `_`, `.` and `:`
/// - Segments start with an alphanumeric or `_`
/// - Total length ≤ 255 characters
///
/// # Examples
///
/// ```rust
/// use bigip_network::domain::FullPath;
///
/// let name = FullPath::new("/Common/test-selfip").unwrap();
/// assert_eq!(name.partition(), "Common");
/// assert_eq!(name.short_name(), "test-selfip");
///
/// assert!(FullPath::new("test-selfip").is_err());
/// assert!(FullPath::new("/Common/").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullPath {
    full: String,
    split: usize,
}

impl FullPath {
    /// Maximum total length of a full path
    pub const MAX_LENGTH: usize = 255;

    /// Create a new full path with validation
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let full = name.into();

        if full.is_empty() {
            return Err(NameError::Empty);
        }

        if full.len() > Self::MAX_LENGTH {
            return Err(NameError::TooLong(full.len()));
        }

        let rest = full
            .strip_prefix('/')
            .ok_or_else(|| NameError::NotQualified(full.clone()))?;

        let segments: Vec<&str> = rest.split('/').collect();
        if segments.len() != 2 {
            return Err(NameError::InvalidSegmentCount(full.clone()));
        }

        for segment in &segments {
            Self::validate_segment(segment, &full)?;
        }

        // Position of the slash between partition and short name
        let split = 1 + segments[0].len();

        Ok(Self { full, split })
    }

    /// Build a full path from a partition and short name
    pub fn from_parts(partition: &str, short_name: &str) -> Result<Self, NameError> {
        Self::new(format!("/{}/{}", partition, short_name))
    }

    fn validate_segment(segment: &str, full: &str) -> Result<(), NameError> {
        let first = segment
            .chars()
            .next()
            .ok_or_else(|| NameError::EmptySegment(full.to_string()))?;

        for ch in segment.chars() {
            if !ch.is_ascii_alphanumeric() && !matches!(ch, '-' | '_' | '.' | ':') {
                return Err(NameError::InvalidCharacter(ch));
            }
        }

        if !(first.is_ascii_alphanumeric() || first == '_') {
            return Err(NameError::InvalidSegmentStart(segment.to_string()));
        }

        Ok(())
    }

    /// Get the full path as a string slice
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// Partition (administrative namespace) segment
    pub fn partition(&self) -> &str {
        &self.full[1..self.split]
    }

    /// Short name segment
    pub fn short_name(&self) -> &str {
        &self.full[self.split + 1..]
    }

    /// iControl REST form used in object URIs: `~Common~test-selfip`
    pub fn to_uri_segment(&self) -> String {
        self.full.replace('/', "~")
    }
}

impl fmt::Display for FullPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full)
    }
}

impl AsRef<str> for FullPath {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

impl TryFrom<String> for FullPath {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for FullPath {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FullPath> for String {
    fn from(value: FullPath) -> Self {
        value.full
    }
}
