use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use ghost_core::models::{UploadEntry, UploadStatus};
use ghost_core::session::LocalFile;
use ghost_core::util::format_bytes;
use ghost_core::validation::FieldErrors;

use crate::error::CliError;

/// Message from the positional arguments, else piped stdin.
pub fn resolve_message(parts: &[String]) -> Result<Option<String>, CliError> {
    if let Some(message) = normalize_content(&parts.join(" ")) {
        return Ok(Some(message));
    }
    read_piped_stdin()
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn read_local_files(paths: &[PathBuf]) -> Result<Vec<LocalFile>, CliError> {
    paths.iter().map(|path| read_local_file(path)).collect()
}

fn read_local_file(path: &Path) -> Result<LocalFile, CliError> {
    let bytes = std::fs::read(path).map_err(|source| CliError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned());
    Ok(LocalFile::new(name, bytes))
}

pub fn format_upload_line(entry: &UploadEntry) -> String {
    let size = format_bytes(entry.size_bytes);
    match entry.status {
        UploadStatus::Ready => format!("  {} ({size}) waiting", entry.name),
        UploadStatus::Uploading => {
            let progress = entry.progress.unwrap_or(0.0);
            format!("  {} ({size}) {progress:.0}%", entry.name)
        }
        UploadStatus::Success => format!("✓ {} ({size})", entry.name),
        UploadStatus::Error => format!(
            "✗ {} ({size}): {}",
            entry.name,
            entry.error_message.as_deref().unwrap_or("Upload failed")
        ),
    }
}

pub fn summarize_field_errors(errors: &FieldErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}
