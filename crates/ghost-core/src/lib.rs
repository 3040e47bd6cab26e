//! ghost-core - Core library for Ghost
//!
//! This crate contains the share form state machine, field validation,
//! expiration math, upload lifecycle tracking, and the HTTP client used by
//! every Ghost interface (CLI today, any other front end later).

pub mod api;
pub mod config;
pub mod created;
pub mod error;
pub mod expiration;
pub mod form;
pub mod models;
pub mod progress;
pub mod qr;
pub mod session;
pub mod tracker;
pub mod util;
pub mod validation;

pub use error::{Error, Result};
pub use expiration::{calculate_expiration, ExpirationResult};
pub use form::{Effect, FormEvent, FormState};
pub use models::{Lifetime, ShareRequest, ShareResponse, UploadEntry, UploadId, UploadStatus};
pub use tracker::UploadTracker;
