//! Share form state machine.
//!
//! Every user action and every network outcome is a [`FormEvent`]. Applying
//! an event to [`FormState`] is a pure transition that returns the side
//! effects the caller must perform (uploads, timers, the share request).

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::expiration::{calculate_expiration_at, detect_timezone};
use crate::models::{Lifetime, SelectedFile, ShareRequest, ShareResponse, UploadId};
use crate::progress::SUCCESS_DISPLAY;
use crate::tracker::UploadTracker;
use crate::util::normalize_text_option;
use crate::validation::{
    accept_ip_input, validate_allowed_ip, validate_confirm_password, validate_max_views,
    validate_password, validate_passwords, FieldErrors, FieldKey, MaxViews, CONFIRM_MISSING,
    FILES_MISSING, SHARE_FAILED,
};

/// Clock and zone captured at the moment the user submits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitContext {
    pub now: NaiveDateTime,
    pub timezone: String,
}

impl SubmitContext {
    /// Current local time and detected zone.
    #[must_use]
    pub fn current() -> Self {
        Self {
            now: Local::now().naive_local(),
            timezone: detect_timezone(),
        }
    }
}

/// Why share creation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareFailure {
    /// Backend field errors, first message per field
    Fields(BTreeMap<String, String>),
    /// Network or unstructured failure
    Generic(String),
}

/// Reason the submit action is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmitBlocker {
    /// Neither message text nor a completed upload
    NothingToShare,
    UploadsInFlight,
    FailedUploads,
    AlreadySubmitting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormEvent {
    SetMessage(String),
    SetLifetime(Lifetime),
    SetMaxViews(MaxViews),
    SetPassword(String),
    SetConfirmPassword(String),
    /// Raw IP restriction input; ignored unless it only holds `[0-9.,:]`
    SetAllowedIp(String),
    /// Files picked or dropped; each one starts uploading immediately
    AddFiles(Vec<SelectedFile>),
    ProgressTick {
        id: UploadId,
        increment: f64,
    },
    UploadSucceeded {
        id: UploadId,
        url: String,
    },
    UploadFailed {
        id: UploadId,
        message: String,
    },
    SuccessDisplayElapsed {
        id: UploadId,
    },
    RetryUpload {
        id: UploadId,
    },
    RemoveFile {
        id: UploadId,
    },
    Submit(SubmitContext),
    ShareCreated(ShareResponse),
    ShareFailed(ShareFailure),
    Reset,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    /// Upload the file behind this entry and report back
    StartUpload { id: UploadId },
    /// Deliver `SuccessDisplayElapsed` after the delay
    ScheduleSettle { id: UploadId, after: Duration },
    /// Send the share request and report back
    CreateShare(ShareRequest),
    /// Show the confirmation screen
    ShowCreated(ShareResponse),
}

/// Complete state of the share form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    pub message: String,
    pub lifetime: Lifetime,
    pub max_views: MaxViews,
    pub password: String,
    pub confirm_password: String,
    pub allowed_ip: String,
    pub uploads: UploadTracker,
    pub errors: FieldErrors,
    pub submitting: bool,
}

impl FormState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event and return the effects to perform.
    pub fn apply(&mut self, event: FormEvent) -> Vec<Effect> {
        match event {
            FormEvent::SetMessage(message) => {
                self.message = message;
                Vec::new()
            }
            FormEvent::SetLifetime(lifetime) => {
                self.lifetime = lifetime;
                Vec::new()
            }
            FormEvent::SetMaxViews(max_views) => {
                self.max_views = max_views;
                Vec::new()
            }
            FormEvent::SetPassword(password) => {
                self.password = password;
                validate_passwords(&self.password, &self.confirm_password, &mut self.errors);
                Vec::new()
            }
            FormEvent::SetConfirmPassword(confirm_password) => {
                self.confirm_password = confirm_password;
                validate_passwords(&self.password, &self.confirm_password, &mut self.errors);
                Vec::new()
            }
            FormEvent::SetAllowedIp(raw) => {
                if accept_ip_input(&raw) {
                    self.allowed_ip = raw;
                }
                self.errors.remove(&FieldKey::AllowedIp);
                Vec::new()
            }
            FormEvent::AddFiles(files) => files
                .into_iter()
                .filter_map(|file| {
                    let id = self.uploads.add(file);
                    self.uploads
                        .begin(id)
                        .then_some(Effect::StartUpload { id })
                })
                .collect(),
            FormEvent::ProgressTick { id, increment } => {
                self.uploads.advance_progress(id, increment);
                Vec::new()
            }
            FormEvent::UploadSucceeded { id, url } => {
                if self.uploads.complete(id, url) {
                    vec![Effect::ScheduleSettle {
                        id,
                        after: SUCCESS_DISPLAY,
                    }]
                } else {
                    tracing::debug!("Ignoring upload result for untracked entry {id}");
                    Vec::new()
                }
            }
            FormEvent::UploadFailed { id, message } => {
                if self.uploads.fail(id, message) {
                    tracing::warn!("Upload {id} failed");
                } else {
                    tracing::debug!("Ignoring upload failure for untracked entry {id}");
                }
                Vec::new()
            }
            FormEvent::SuccessDisplayElapsed { id } => {
                self.uploads.settle(id);
                Vec::new()
            }
            FormEvent::RetryUpload { id } => {
                if self.uploads.retry(id) && self.uploads.begin(id) {
                    vec![Effect::StartUpload { id }]
                } else {
                    Vec::new()
                }
            }
            FormEvent::RemoveFile { id } => {
                self.uploads.remove(id);
                Vec::new()
            }
            FormEvent::Submit(context) => self.submit(&context),
            FormEvent::ShareCreated(response) => {
                self.submitting = false;
                vec![Effect::ShowCreated(response)]
            }
            FormEvent::ShareFailed(failure) => {
                self.submitting = false;
                self.apply_share_failure(failure);
                Vec::new()
            }
            FormEvent::Reset => {
                *self = Self::default();
                Vec::new()
            }
        }
    }

    /// Why the submit action is currently disabled, if it is.
    pub fn submit_blocker(&self) -> Option<SubmitBlocker> {
        if self.submitting {
            Some(SubmitBlocker::AlreadySubmitting)
        } else if self.uploads.any_uploading() {
            Some(SubmitBlocker::UploadsInFlight)
        } else if self.uploads.any_error() {
            Some(SubmitBlocker::FailedUploads)
        } else if self.message.trim().is_empty() && !self.uploads.has_completed_upload() {
            Some(SubmitBlocker::NothingToShare)
        } else {
            None
        }
    }

    pub fn can_submit(&self) -> bool {
        self.submit_blocker().is_none()
    }

    /// Full validation run on submit.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.uploads.uploaded_urls().is_empty() && self.message.trim().is_empty() {
            errors.insert(FieldKey::Files, FILES_MISSING);
        }
        if let Err(message) = validate_max_views(&self.max_views) {
            errors.insert(FieldKey::MaxViews, message);
        }
        if let Err(message) = validate_allowed_ip(&self.allowed_ip) {
            errors.insert(FieldKey::AllowedIp, message);
        }
        if !self.password.is_empty() && self.confirm_password.is_empty() {
            errors.insert(FieldKey::ConfirmPassword, CONFIRM_MISSING);
        }
        if let Err(message) = validate_password(&self.password) {
            errors.insert(FieldKey::Password, message);
        }
        if let Err(message) = validate_confirm_password(&self.password, &self.confirm_password) {
            errors.insert(FieldKey::ConfirmPassword, message);
        }
        errors
    }

    /// Assemble the share request from the current form values.
    pub fn build_share_request(&self, context: &SubmitContext) -> ShareRequest {
        let expiration = calculate_expiration_at(self.lifetime, context.now, &*context.timezone);
        ShareRequest {
            files: self.uploads.uploaded_urls().to_vec(),
            message: normalize_text_option(Some(self.message.clone())),
            password: (!self.password.is_empty()).then(|| self.password.clone()),
            max_views: validate_max_views(&self.max_views).ok().flatten(),
            expires_at: expiration.expires_at,
            allowed_ip: normalize_text_option(Some(self.allowed_ip.clone())),
            timezone: Some(expiration.timezone),
        }
    }

    fn submit(&mut self, context: &SubmitContext) -> Vec<Effect> {
        if let Some(blocker) = self
            .submit_blocker()
            .filter(|blocker| *blocker != SubmitBlocker::NothingToShare)
        {
            tracing::debug!("Submit ignored: {blocker:?}");
            return Vec::new();
        }

        let errors = self.validate();
        if !errors.is_empty() {
            self.errors = errors;
            return Vec::new();
        }

        self.errors.clear();
        self.submitting = true;
        vec![Effect::CreateShare(self.build_share_request(context))]
    }

    fn apply_share_failure(&mut self, failure: ShareFailure) {
        match failure {
            ShareFailure::Fields(fields) => {
                self.errors = fields
                    .into_iter()
                    .map(|(field, message)| (FieldKey::from(field), message))
                    .collect();
            }
            ShareFailure::Generic(detail) => {
                tracing::warn!("Share creation failed: {detail}");
                self.errors.insert(FieldKey::Api, SHARE_FAILED);
            }
        }
    }
}
