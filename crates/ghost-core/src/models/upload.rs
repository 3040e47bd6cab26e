//! Upload entry model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for an upload entry, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UploadId(Uuid);

impl UploadId {
    /// Create a new unique upload ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for UploadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UploadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UploadId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Lifecycle status of a single upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Ready,
    Uploading,
    Success,
    Error,
}

/// File metadata handed to the form when the user picks or drops a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    /// Identifier the resulting upload entry will carry
    pub id: UploadId,
    /// Original file name
    pub name: String,
    /// File size in bytes
    pub size_bytes: u64,
}

impl SelectedFile {
    #[must_use]
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            id: UploadId::new(),
            name: name.into(),
            size_bytes,
        }
    }
}

/// A file in the share form, tracked from selection until removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadEntry {
    pub id: UploadId,
    pub name: String,
    pub size_bytes: u64,
    pub status: UploadStatus,
    /// Cosmetic progress percentage, present only while a progress bar is shown
    pub progress: Option<f64>,
    /// Remote file URL once the upload succeeded
    pub remote_url: Option<String>,
    /// Last upload failure, cleared on retry
    pub error_message: Option<String>,
    /// Whether the transient success checkmark is still displayed
    pub success_visible: bool,
}

impl UploadEntry {
    #[must_use]
    pub fn new(file: SelectedFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            size_bytes: file.size_bytes,
            status: UploadStatus::Ready,
            progress: None,
            remote_url: None,
            error_message: None,
            success_visible: false,
        }
    }

    /// Failed entries are clickable to retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.status == UploadStatus::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_id_unique() {
        let id1 = UploadId::new();
        let id2 = UploadId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_upload_id_parse() {
        let id = UploadId::new();
        let parsed: UploadId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_upload_entry_new_is_ready() {
        let file = SelectedFile::new("report.pdf", 2048);
        let id = file.id;
        let entry = UploadEntry::new(file);

        assert_eq!(entry.id, id);
        assert_eq!(entry.name, "report.pdf");
        assert_eq!(entry.size_bytes, 2048);
        assert_eq!(entry.status, UploadStatus::Ready);
        assert!(entry.remote_url.is_none());
        assert!(!entry.is_retryable());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&UploadStatus::Uploading).unwrap(),
            "\"uploading\""
        );
    }
}
