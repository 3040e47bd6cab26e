//! Upload lifecycle tracking.
//!
//! Entries move `ready -> uploading -> {success, error}`; a failed entry goes
//! back to `ready` on retry. Every operation is keyed by [`UploadId`] and is a
//! no-op for ids that are no longer tracked, so a late completion for a removed
//! entry cannot touch anything.

use serde::{Deserialize, Serialize};

use crate::models::{SelectedFile, UploadEntry, UploadId, UploadStatus};
use crate::progress::{self, PROGRESS_COMPLETE};

/// File list of the share form plus the URLs of completed uploads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadTracker {
    entries: Vec<UploadEntry>,
    /// Remote URLs in completion order
    uploaded_urls: Vec<String>,
}

impl UploadTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[UploadEntry] {
        &self.entries
    }

    pub fn uploaded_urls(&self) -> &[String] {
        &self.uploaded_urls
    }

    pub fn get(&self, id: UploadId) -> Option<&UploadEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Append a `ready` entry for a selected file.
    pub fn add(&mut self, file: SelectedFile) -> UploadId {
        let entry = UploadEntry::new(file);
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    /// `ready -> uploading`, resetting the progress bar.
    pub fn begin(&mut self, id: UploadId) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        if entry.status != UploadStatus::Ready {
            return false;
        }
        entry.status = UploadStatus::Uploading;
        entry.progress = Some(0.0);
        true
    }

    /// Advance the cosmetic progress of an in-flight upload.
    pub fn advance_progress(&mut self, id: UploadId, increment: f64) -> Option<f64> {
        let entry = self.entry_mut(id)?;
        if entry.status != UploadStatus::Uploading {
            return None;
        }
        let next = progress::advance(entry.progress.unwrap_or(0.0), increment);
        entry.progress = Some(next);
        Some(next)
    }

    /// `uploading -> success`; records the remote URL.
    pub fn complete(&mut self, id: UploadId, url: impl Into<String>) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        if entry.status != UploadStatus::Uploading {
            return false;
        }
        let url = url.into();
        entry.status = UploadStatus::Success;
        entry.progress = Some(PROGRESS_COMPLETE);
        entry.remote_url = Some(url.clone());
        entry.error_message = None;
        entry.success_visible = true;
        self.uploaded_urls.push(url);
        true
    }

    /// Collapse the transient success display. The entry and its URL stay.
    pub fn settle(&mut self, id: UploadId) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        if entry.status != UploadStatus::Success || !entry.success_visible {
            return false;
        }
        entry.success_visible = false;
        entry.progress = None;
        true
    }

    /// `uploading -> error`; progress display is discarded.
    pub fn fail(&mut self, id: UploadId, message: impl Into<String>) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        if entry.status != UploadStatus::Uploading {
            return false;
        }
        entry.status = UploadStatus::Error;
        entry.progress = None;
        entry.error_message = Some(message.into());
        true
    }

    /// `error -> ready`, clearing the previous error message.
    pub fn retry(&mut self, id: UploadId) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return false;
        };
        if entry.status != UploadStatus::Error {
            return false;
        }
        entry.status = UploadStatus::Ready;
        entry.error_message = None;
        true
    }

    /// Remove an entry in any state, dropping one occurrence of its URL.
    pub fn remove(&mut self, id: UploadId) -> Option<UploadEntry> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        let entry = self.entries.remove(index);
        if let Some(url) = entry.remote_url.as_deref() {
            if let Some(position) = self.uploaded_urls.iter().position(|u| u == url) {
                self.uploaded_urls.remove(position);
            }
        }
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.uploaded_urls.clear();
    }

    pub fn any_uploading(&self) -> bool {
        self.any_with_status(UploadStatus::Uploading)
    }

    pub fn any_error(&self) -> bool {
        self.any_with_status(UploadStatus::Error)
    }

    pub fn has_completed_upload(&self) -> bool {
        !self.uploaded_urls.is_empty()
    }

    fn any_with_status(&self, status: UploadStatus) -> bool {
        self.entries.iter().any(|entry| entry.status == status)
    }

    fn entry_mut(&mut self, id: UploadId) -> Option<&mut UploadEntry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }
}
