//! Confirmation view shown once a share link exists.

use serde::Serialize;

use crate::models::ShareResponse;
use crate::qr::{qr_code_url, QR_DOWNLOAD_SIZE, QR_PREVIEW_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedView {
    pub id: String,
    /// Public link; absent when the backend only returned an identifier
    pub share_url: Option<String>,
    pub qr_preview_url: Option<String>,
    pub qr_download_url: Option<String>,
    /// Raw backend response
    pub result: ShareResponse,
}

impl CreatedView {
    pub fn new(result: ShareResponse) -> Self {
        let share_url = result.share_url().map(str::to_string);
        Self {
            id: result.id_string(),
            qr_preview_url: share_url
                .as_deref()
                .map(|url| qr_code_url(url, QR_PREVIEW_SIZE)),
            qr_download_url: share_url
                .as_deref()
                .map(|url| qr_code_url(url, QR_DOWNLOAD_SIZE)),
            share_url,
            result,
        }
    }

    /// Text to put on the clipboard: the link, or the id without one.
    pub fn copy_text(&self) -> &str {
        self.share_url.as_deref().unwrap_or(&self.id)
    }
}

impl From<ShareResponse> for CreatedView {
    fn from(result: ShareResponse) -> Self {
        Self::new(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn view_with_link_has_qr_urls() {
        let response: ShareResponse = serde_json::from_value(serde_json::json!({
            "id": 42,
            "secretUrl": "https://ghost.example/s/42",
        }))
        .unwrap();

        let view = CreatedView::new(response);

        assert_eq!(view.id, "42");
        assert_eq!(view.share_url.as_deref(), Some("https://ghost.example/s/42"));
        assert_eq!(
            view.qr_preview_url.as_deref(),
            Some("https://api.qrserver.com/v1/create-qr-code/?size=240x240&data=https%3A%2F%2Fghost.example%2Fs%2F42")
        );
        assert!(view.qr_download_url.unwrap().contains("size=480x480"));
    }

    #[test]
    fn view_without_link_falls_back_to_id() {
        let response: ShareResponse =
            serde_json::from_value(serde_json::json!({"id": "abc"})).unwrap();

        let view = CreatedView::from(response);

        assert_eq!(view.share_url, None);
        assert_eq!(view.qr_preview_url, None);
        assert_eq!(view.copy_text(), "abc");
    }
}
