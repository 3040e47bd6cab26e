//! QR code images for share links, rendered by api.qrserver.com.

use crate::api::ApiError;

pub const QR_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Edge length of the on-screen preview.
pub const QR_PREVIEW_SIZE: u32 = 240;

/// Edge length of the downloadable image.
pub const QR_DOWNLOAD_SIZE: u32 = 480;

/// File name offered when the QR image is saved.
pub const QR_DOWNLOAD_FILE_NAME: &str = "secret-link-qr.png";

/// Image URL encoding `data` as a square PNG of `size` pixels.
pub fn qr_code_url(data: &str, size: u32) -> String {
    format!(
        "{QR_SERVICE_URL}?size={size}x{size}&data={}",
        urlencoding::encode(data)
    )
}

/// Download the PNG behind a QR image URL.
pub async fn fetch_qr_png(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, ApiError> {
    tracing::debug!("Fetching QR image {url}");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_share_link() {
        let url = qr_code_url("https://ghost.example/s/a b?x=1&y=2", QR_PREVIEW_SIZE);
        assert_eq!(
            url,
            "https://api.qrserver.com/v1/create-qr-code/?size=240x240&data=https%3A%2F%2Fghost.example%2Fs%2Fa%20b%3Fx%3D1%26y%3D2"
        );
    }

    #[test]
    fn download_size_is_larger_than_preview() {
        let url = qr_code_url("abc", QR_DOWNLOAD_SIZE);
        assert!(url.contains("size=480x480"));
        assert!(url.ends_with("data=abc"));
    }

    #[tokio::test]
    async fn fetch_returns_png_bytes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/qr")
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body([0x89, b'P', b'N', b'G'])
            .create_async()
            .await;

        let bytes = fetch_qr_png(&reqwest::Client::new(), &format!("{}/qr", server.url()))
            .await
            .unwrap();

        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G']);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn fetch_reports_service_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/qr")
            .with_status(503)
            .with_body("busy")
            .create_async()
            .await;

        let error = fetch_qr_png(&reqwest::Client::new(), &format!("{}/qr", server.url()))
            .await
            .unwrap_err();

        assert!(matches!(error, ApiError::Status { status: 503, .. }));
    }
}
