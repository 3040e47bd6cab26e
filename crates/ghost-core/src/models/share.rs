//! Share creation request and response payloads

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys the backend has used for the public share link, in lookup order.
const SHARE_URL_KEYS: [&str; 4] = ["secret_url", "secretUrl", "share_url", "url"];

/// Body of `POST /api/file-share/generate-url/`.
///
/// Absent values are omitted from the JSON entirely, never sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequest {
    /// Remote URLs of uploaded files, in completion order
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_views: Option<u32>,
    /// Naive local timestamp, `YYYY-MM-DDTHH:MM:SS`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::expiration::naive_timestamp"
    )]
    pub expires_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// Response of `POST /api/media/upload-file/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Remote URL of the stored file
    pub url: String,
    /// Any other metadata the media service returned
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Response of `POST /api/file-share/generate-url/`.
///
/// Only `id` is required; the remaining share metadata is passed through to
/// the confirmation view untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareResponse {
    pub id: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ShareResponse {
    /// Share identifier rendered as plain text.
    #[must_use]
    pub fn id_string(&self) -> String {
        match &self.id {
            Value::String(id) => id.clone(),
            other => other.to_string(),
        }
    }

    /// Public share link, when the backend included one.
    #[must_use]
    pub fn share_url(&self) -> Option<&str> {
        SHARE_URL_KEYS
            .iter()
            .find_map(|key| self.extra.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    #[test]
    fn request_omits_absent_fields() {
        let request = ShareRequest {
            files: vec!["https://cdn.example.com/a.png".to_string()],
            timezone: Some("Europe/Berlin".to_string()),
            ..Default::default()
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "files": ["https://cdn.example.com/a.png"],
                "timezone": "Europe/Berlin",
            })
        );
    }

    #[test]
    fn request_uses_backend_field_names() {
        let expires_at = NaiveDate::from_ymd_opt(2025, 9, 27)
            .unwrap()
            .and_hms_opt(15, 40, 59)
            .unwrap();
        let request = ShareRequest {
            files: Vec::new(),
            message: Some("hello".to_string()),
            password: Some("secret1".to_string()),
            max_views: Some(5),
            expires_at: Some(expires_at),
            allowed_ip: Some("10.0.0.1".to_string()),
            timezone: Some("Asia/Karachi".to_string()),
        };

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "files": [],
                "message": "hello",
                "password": "secret1",
                "max_views": 5,
                "expires_at": "2025-09-27T15:40:59",
                "allowed_ip": "10.0.0.1",
                "timezone": "Asia/Karachi",
            })
        );
    }

    #[test]
    fn upload_response_keeps_extra_metadata() {
        let response: UploadResponse = serde_json::from_str(
            r#"{"url": "https://cdn.example.com/a.png", "size": 42, "public": false}"#,
        )
        .unwrap();
        assert_eq!(response.url, "https://cdn.example.com/a.png");
        assert_eq!(response.extra.get("size"), Some(&serde_json::json!(42)));
    }

    #[test]
    fn upload_response_requires_url() {
        assert!(serde_json::from_str::<UploadResponse>(r#"{"size": 42}"#).is_err());
    }

    #[test]
    fn share_response_finds_share_url() {
        let response: ShareResponse = serde_json::from_str(
            r#"{"id": 17, "secret_url": "https://ghost.example/s/abc", "max_views": 5}"#,
        )
        .unwrap();
        assert_eq!(response.id_string(), "17");
        assert_eq!(response.share_url(), Some("https://ghost.example/s/abc"));
    }

    #[test]
    fn share_response_without_link() {
        let response: ShareResponse = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(response.id_string(), "abc");
        assert_eq!(response.share_url(), None);
    }
}
