//! Data models for Ghost

mod lifetime;
mod share;
mod upload;

pub use lifetime::Lifetime;
pub use share::{ShareRequest, ShareResponse, UploadResponse};
pub use upload::{SelectedFile, UploadEntry, UploadId, UploadStatus};
