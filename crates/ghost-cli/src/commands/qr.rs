use std::path::{Path, PathBuf};

use ghost_core::qr::{fetch_qr_png, qr_code_url, QR_DOWNLOAD_FILE_NAME};

use crate::commands::common::normalize_content;
use crate::error::CliError;

pub async fn run_qr(
    http: &reqwest::Client,
    data: &str,
    size: u32,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let data = normalize_content(data)
        .ok_or_else(|| CliError::InvalidField("Link to encode cannot be empty".to_string()))?;
    let image_url = qr_code_url(&data, size);

    if let Some(path) = output {
        let path = resolve_qr_path(path);
        let png = fetch_qr_png(http, &image_url).await?;
        std::fs::write(&path, png)?;
        println!("{}", path.display());
    } else {
        println!("{image_url}");
    }
    Ok(())
}

/// Directories get the default QR file name appended.
pub fn resolve_qr_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join(QR_DOWNLOAD_FILE_NAME)
    } else {
        path.to_path_buf()
    }
}
