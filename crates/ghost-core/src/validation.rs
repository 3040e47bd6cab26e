//! Client-side field validation for the share form.
//!
//! Validation is purely local: failures block submission and never reach the
//! network.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const PASSWORD_INVALID: &str =
    "Password must be at least 6 characters and contain only valid symbols.";
pub const CONFIRM_WITHOUT_PASSWORD: &str = "Password is required before confirming";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match";
pub const CONFIRM_MISSING: &str = "Please confirm your password";
pub const ALLOWED_IP_INVALID: &str = "Please enter a valid IPv4 address (e.g., 192.168.1.1)";
pub const MAX_VIEWS_INVALID: &str = "Enter at least 1 view";
pub const FILES_MISSING: &str = "Please upload at least one file";
pub const SHARE_FAILED: &str = "Failed to create secret link. Please try again.";

/// Preset view limits offered next to the free-form input.
pub const MAX_VIEW_PRESETS: [u32; 4] = [5, 10, 25, 100];

const MAX_VIEWS_INPUT_LIMIT: u32 = 999;
const MAX_VIEWS_INPUT_DIGITS: usize = 3;

fn password_regex() -> &'static Regex {
    static PASSWORD: OnceLock<Regex> = OnceLock::new();
    PASSWORD.get_or_init(|| {
        Regex::new(r#"^[A-Za-z0-9!@#$%^&*()_+={}:;"'<>?,.]{6,}$"#).expect("Invalid regex")
    })
}

fn ipv4_regex() -> &'static Regex {
    static IPV4: OnceLock<Regex> = OnceLock::new();
    IPV4.get_or_init(|| {
        Regex::new(
            r"^(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)(\.(25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)){3}$",
        )
        .expect("Invalid regex")
    })
}

/// Form field an error message is attached to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKey {
    Files,
    Message,
    Password,
    ConfirmPassword,
    MaxViews,
    ExpiresAt,
    AllowedIp,
    Timezone,
    /// Generic share-creation failure shown near the submit action
    Api,
    /// Backend field this client has no dedicated slot for
    Other(String),
}

impl FieldKey {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Files => "files",
            Self::Message => "message",
            Self::Password => "password",
            Self::ConfirmPassword => "confirm_password",
            Self::MaxViews => "max_views",
            Self::ExpiresAt => "expires_at",
            Self::AllowedIp => "allowed_ip",
            Self::Timezone => "timezone",
            Self::Api => "api",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for FieldKey {
    fn from(value: &str) -> Self {
        match value {
            "files" => Self::Files,
            "message" => Self::Message,
            "password" => Self::Password,
            "confirm_password" | "confirmPassword" => Self::ConfirmPassword,
            "max_views" => Self::MaxViews,
            "expires_at" => Self::ExpiresAt,
            "allowed_ip" => Self::AllowedIp,
            "timezone" => Self::Timezone,
            "api" => Self::Api,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<FieldKey> for String {
    fn from(value: FieldKey) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error messages keyed by form field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FieldKey, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: FieldKey, message: impl Into<String>) {
        self.0.insert(key, message.into());
    }

    pub fn remove(&mut self, key: &FieldKey) -> Option<String> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &FieldKey) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &FieldKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Set `key` to the outcome of a validation: error stored, success cleared.
    pub fn apply(&mut self, key: FieldKey, outcome: Result<(), String>) {
        match outcome {
            Ok(()) => {
                self.0.remove(&key);
            }
            Err(message) => {
                self.0.insert(key, message);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &str)> {
        self.0.iter().map(|(key, message)| (key, message.as_str()))
    }
}

impl FromIterator<(FieldKey, String)> for FieldErrors {
    fn from_iter<I: IntoIterator<Item = (FieldKey, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// View limit selection: unlimited, or the raw text of the numeric input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum MaxViews {
    #[default]
    Unlimited,
    Limited(String),
}

impl MaxViews {
    /// Accept a keystroke-level edit of the numeric input.
    ///
    /// Blank input is allowed while typing; otherwise at most three digits
    /// with a value no greater than 999.
    pub fn accept_input(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return Some(Self::Limited(String::new()));
        }
        if raw.len() > MAX_VIEWS_INPUT_DIGITS || !raw.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let value = raw.parse::<u32>().ok()?;
        (value <= MAX_VIEWS_INPUT_LIMIT).then(|| Self::Limited(raw.to_string()))
    }

    #[must_use]
    pub fn preset(value: u32) -> Self {
        Self::Limited(value.to_string())
    }
}

/// Validate an optional password. Empty means no password.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() || password_regex().is_match(password) {
        Ok(())
    } else {
        Err(PASSWORD_INVALID.to_string())
    }
}

/// Validate the confirmation field against the password while typing.
pub fn validate_confirm_password(password: &str, confirm_password: &str) -> Result<(), String> {
    if confirm_password.is_empty() {
        return Ok(());
    }
    if password.is_empty() {
        return Err(CONFIRM_WITHOUT_PASSWORD.to_string());
    }
    if password != confirm_password {
        return Err(PASSWORD_MISMATCH.to_string());
    }
    Ok(())
}

/// Live password pair validation, run whenever either field changes.
pub fn validate_passwords(password: &str, confirm_password: &str, errors: &mut FieldErrors) {
    errors.apply(FieldKey::Password, validate_password(password));
    errors.apply(
        FieldKey::ConfirmPassword,
        validate_confirm_password(password, confirm_password),
    );
}

/// Validate the IP allow-list. Only a single dotted-quad IPv4 is accepted.
pub fn validate_allowed_ip(raw: &str) -> Result<(), String> {
    let value = raw.trim();
    if value.is_empty() || ipv4_regex().is_match(value) {
        Ok(())
    } else {
        Err(ALLOWED_IP_INVALID.to_string())
    }
}

/// Characters the IP restriction input lets through while typing.
pub fn accept_ip_input(raw: &str) -> bool {
    raw.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | ':'))
}

/// Validate the view limit and return the numeric cap, if any.
pub fn validate_max_views(max_views: &MaxViews) -> Result<Option<u32>, String> {
    match max_views {
        MaxViews::Unlimited => Ok(None),
        MaxViews::Limited(raw) => match raw.trim().parse::<u32>() {
            Ok(value) if value >= 1 => Ok(Some(value)),
            _ => Err(MAX_VIEWS_INVALID.to_string()),
        },
    }
}
