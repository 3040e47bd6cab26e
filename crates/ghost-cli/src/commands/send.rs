use std::path::Path;

use ghost_core::api::{ShareApiClient, ShareBackend};
use ghost_core::config::ClientConfig;
use ghost_core::created::CreatedView;
use ghost_core::form::SubmitBlocker;
use ghost_core::models::{UploadId, UploadStatus};
use ghost_core::qr::fetch_qr_png;
use ghost_core::session::{SessionUpdate, ShareSession, SubmitOutcome};
use ghost_core::validation::{accept_ip_input, FieldKey, MaxViews, ALLOWED_IP_INVALID};
use ghost_core::FormEvent;

use crate::cli::SendArgs;
use crate::commands::common::{
    format_upload_line, read_local_files, resolve_message, summarize_field_errors,
};
use crate::commands::qr::resolve_qr_path;
use crate::error::CliError;

const MAX_VIEWS_INPUT_INVALID: &str = "--max-views must be a whole number between 1 and 999";

pub async fn run_send(args: SendArgs, config: &ClientConfig) -> Result<(), CliError> {
    let message = resolve_message(&args.message)?;
    let files = read_local_files(&args.files)?;
    if message.is_none() && files.is_empty() {
        return Err(CliError::EmptyShare);
    }

    let client = ShareApiClient::new(config)?;
    let http = client.http().clone();
    let mut session = ShareSession::new(client);
    apply_form_options(&mut session, message, &args)?;

    if !files.is_empty() {
        session.add_files(files);
        upload_with_retries(&mut session, args.retries).await?;
    }

    let view = match session.submit().await {
        SubmitOutcome::Created(view) => view,
        SubmitOutcome::Rejected(errors) => {
            return Err(CliError::ShareRejected(summarize_field_errors(&errors)));
        }
        SubmitOutcome::Blocked(blocker) => {
            return Err(CliError::ShareRejected(describe_blocker(blocker).to_string()));
        }
    };

    if let Some(path) = args.qr_output.as_deref() {
        save_qr(&http, &view, path).await?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_created(&view);
    }
    Ok(())
}

/// Feed the command-line options through the form and reject invalid ones
/// before any file is uploaded.
pub fn apply_form_options<B: ShareBackend>(
    session: &mut ShareSession<B>,
    message: Option<String>,
    args: &SendArgs,
) -> Result<(), CliError> {
    if let Some(message) = message {
        session.dispatch(FormEvent::SetMessage(message));
    }
    session.dispatch(FormEvent::SetLifetime(args.lifetime));

    if let Some(raw) = args.max_views.as_deref() {
        let max_views = MaxViews::accept_input(raw.trim())
            .ok_or_else(|| CliError::InvalidField(MAX_VIEWS_INPUT_INVALID.to_string()))?;
        session.dispatch(FormEvent::SetMaxViews(max_views));
    }

    if let Some(password) = args.password.clone() {
        let confirm = args
            .confirm_password
            .clone()
            .unwrap_or_else(|| password.clone());
        session.dispatch(FormEvent::SetPassword(password));
        session.dispatch(FormEvent::SetConfirmPassword(confirm));
    } else if let Some(confirm) = args.confirm_password.clone() {
        session.dispatch(FormEvent::SetConfirmPassword(confirm));
    }

    if let Some(ip) = args.allow_ip.as_deref() {
        let ip = ip.trim();
        if !accept_ip_input(ip) {
            return Err(CliError::InvalidField(ALLOWED_IP_INVALID.to_string()));
        }
        session.dispatch(FormEvent::SetAllowedIp(ip.to_string()));
    }

    let mut errors = session.state().validate();
    errors.remove(&FieldKey::Files);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CliError::InvalidField(summarize_field_errors(&errors)))
    }
}

/// Drive uploads to completion, retrying failed ones up to `retries` times.
pub async fn upload_with_retries<B: ShareBackend>(
    session: &mut ShareSession<B>,
    retries: u32,
) -> Result<(), CliError> {
    let mut retries_left = retries;
    loop {
        while session.state().uploads.any_uploading() {
            match session.process_next().await {
                Some(update) => report_update(session, &update),
                None => break,
            }
        }

        let failed: Vec<UploadId> = session
            .state()
            .uploads
            .entries()
            .iter()
            .filter(|entry| entry.status == UploadStatus::Error)
            .map(|entry| entry.id)
            .collect();
        if failed.is_empty() {
            return Ok(());
        }
        if retries_left == 0 {
            let details = session
                .state()
                .uploads
                .entries()
                .iter()
                .filter(|entry| entry.status == UploadStatus::Error)
                .map(|entry| {
                    format!(
                        "{} ({})",
                        entry.name,
                        entry.error_message.as_deref().unwrap_or("unknown error")
                    )
                })
                .collect::<Vec<_>>()
                .join(", ");
            return Err(CliError::UploadsFailed {
                count: failed.len(),
                details,
            });
        }

        retries_left -= 1;
        tracing::info!("Retrying {} failed upload(s)", failed.len());
        for id in failed {
            session.retry(id);
        }
    }
}

fn report_update<B: ShareBackend>(session: &ShareSession<B>, update: &SessionUpdate) {
    match update {
        SessionUpdate::Progress { id, progress } => {
            tracing::debug!("Upload {id} at {progress:.0}%");
        }
        SessionUpdate::Finished { id, .. } => {
            if let Some(entry) = session.state().uploads.get(*id) {
                eprintln!("{}", format_upload_line(entry));
            }
        }
        SessionUpdate::Settled { .. } => {}
    }
}

pub const fn describe_blocker(blocker: SubmitBlocker) -> &'static str {
    match blocker {
        SubmitBlocker::NothingToShare => "nothing to share",
        SubmitBlocker::UploadsInFlight => "uploads are still in progress",
        SubmitBlocker::FailedUploads => "some uploads failed",
        SubmitBlocker::AlreadySubmitting => "a share request is already in flight",
    }
}

async fn save_qr(http: &reqwest::Client, view: &CreatedView, path: &Path) -> Result<(), CliError> {
    let Some(url) = view.qr_download_url.as_deref() else {
        tracing::warn!("Share {} has no link to encode; skipping QR download", view.id);
        return Ok(());
    };
    let path = resolve_qr_path(path);
    let png = fetch_qr_png(http, url).await?;
    std::fs::write(&path, png)?;
    eprintln!("QR code saved to {}", path.display());
    Ok(())
}

fn print_created(view: &CreatedView) {
    println!("{}", view.copy_text());
    if let Some(qr) = view.qr_preview_url.as_deref() {
        println!("QR: {qr}");
    }
}
