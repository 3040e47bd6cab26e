//! Async driver for the share form.
//!
//! [`ShareSession`] owns a [`FormState`] and performs the effects it asks for:
//! uploads run as spawned tasks, progress ticks and completions come back over
//! a channel, and every result re-enters the state machine as a [`FormEvent`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::api::{ApiError, ShareBackend};
use crate::created::CreatedView;
use crate::form::{Effect, FormEvent, FormState, SubmitBlocker, SubmitContext};
use crate::models::{SelectedFile, UploadEntry, UploadId, UploadResponse, UploadStatus};
use crate::progress::{ProgressSource, RandomProgress, PROGRESS_TICK};
use crate::util::format_bytes;
use crate::validation::FieldErrors;

/// File picked by the user, with its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Visible change produced by [`ShareSession::process_next`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    Progress { id: UploadId, progress: f64 },
    Finished { id: UploadId, status: UploadStatus },
    Settled { id: UploadId },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(CreatedView),
    /// Local validation or the backend refused the share
    Rejected(FieldErrors),
    /// Submit is disabled in the current state
    Blocked(SubmitBlocker),
}

enum Completion {
    Tick {
        id: UploadId,
    },
    Uploaded {
        id: UploadId,
        result: Result<UploadResponse, ApiError>,
    },
    SettleDue {
        id: UploadId,
    },
}

pub struct ShareSession<B: ShareBackend> {
    backend: Arc<B>,
    state: FormState,
    files: HashMap<UploadId, Arc<Vec<u8>>>,
    progress: Box<dyn ProgressSource>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
    tick: Duration,
    success_display: Option<Duration>,
}

impl<B: ShareBackend> ShareSession<B> {
    pub fn new(backend: B) -> Self {
        Self::with_shared_backend(Arc::new(backend))
    }

    pub fn with_shared_backend(backend: Arc<B>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            state: FormState::new(),
            files: HashMap::new(),
            progress: Box::new(RandomProgress::new()),
            tx,
            rx,
            in_flight: 0,
            tick: PROGRESS_TICK,
            success_display: None,
        }
    }

    #[must_use]
    pub fn with_progress_source(mut self, source: impl ProgressSource + 'static) -> Self {
        self.progress = Box::new(source);
        self
    }

    /// Override the progress tick and success display durations.
    #[must_use]
    pub fn with_timing(mut self, tick: Duration, success_display: Duration) -> Self {
        self.tick = tick;
        self.success_display = Some(success_display);
        self
    }

    pub const fn state(&self) -> &FormState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Apply an event and start any uploads or timers it requests.
    ///
    /// All effects are returned; `StartUpload` and `ScheduleSettle` are
    /// already under way when this returns.
    pub fn dispatch(&mut self, event: FormEvent) -> Vec<Effect> {
        let effects = self.state.apply(event);
        for effect in &effects {
            match effect {
                Effect::StartUpload { id } => self.start_upload(*id),
                Effect::ScheduleSettle { id, after } => {
                    self.schedule_settle(*id, self.success_display.unwrap_or(*after));
                }
                Effect::CreateShare(_) | Effect::ShowCreated(_) => {}
            }
        }
        self.files.retain(|id, _| self.state.uploads.get(*id).is_some());
        effects
    }

    /// Add files to the form; each one starts uploading right away.
    pub fn add_files(&mut self, files: Vec<LocalFile>) -> Vec<UploadId> {
        let selected: Vec<SelectedFile> = files
            .into_iter()
            .map(|file| {
                let selected = SelectedFile::new(file.name, file.bytes.len() as u64);
                self.files.insert(selected.id, Arc::new(file.bytes));
                selected
            })
            .collect();
        let ids = selected.iter().map(|file| file.id).collect();
        self.dispatch(FormEvent::AddFiles(selected));
        ids
    }

    /// Retry a failed upload. Returns whether it restarted.
    pub fn retry(&mut self, id: UploadId) -> bool {
        self.dispatch(FormEvent::RetryUpload { id })
            .contains(&Effect::StartUpload { id })
    }

    pub fn remove(&mut self, id: UploadId) -> Option<UploadEntry> {
        let entry = self.state.uploads.get(id).cloned();
        self.dispatch(FormEvent::RemoveFile { id });
        entry
    }

    /// Wait for the next visible change.
    ///
    /// Returns `None` once no upload or timer is outstanding. Results for
    /// entries removed in the meantime are consumed silently.
    pub async fn process_next(&mut self) -> Option<SessionUpdate> {
        while self.in_flight > 0 {
            let completion = self.rx.recv().await?;
            if let Some(update) = self.handle(completion) {
                return Some(update);
            }
        }
        None
    }

    /// Process events until no upload is in flight.
    pub async fn wait_for_uploads(&mut self) {
        while self.state.uploads.any_uploading() {
            if self.process_next().await.is_none() {
                break;
            }
        }
    }

    /// Process events until nothing is outstanding, timers included.
    pub async fn drain(&mut self) {
        while self.process_next().await.is_some() {}
    }

    /// Submit with the current clock and detected time zone.
    pub async fn submit(&mut self) -> SubmitOutcome {
        self.submit_with(SubmitContext::current()).await
    }

    pub async fn submit_with(&mut self, context: SubmitContext) -> SubmitOutcome {
        if let Some(blocker) = self
            .state
            .submit_blocker()
            .filter(|blocker| *blocker != SubmitBlocker::NothingToShare)
        {
            return SubmitOutcome::Blocked(blocker);
        }

        let request = self
            .dispatch(FormEvent::Submit(context))
            .into_iter()
            .find_map(|effect| match effect {
                Effect::CreateShare(request) => Some(request),
                _ => None,
            });
        let Some(request) = request else {
            return SubmitOutcome::Rejected(self.state.errors.clone());
        };

        match self.backend.generate_share_url(&request).await {
            Ok(response) => {
                tracing::info!("Share link created: {}", response.id_string());
                let view = CreatedView::new(response.clone());
                self.dispatch(FormEvent::ShareCreated(response));
                SubmitOutcome::Created(view)
            }
            Err(error) => {
                self.dispatch(FormEvent::ShareFailed(error.into_share_failure()));
                SubmitOutcome::Rejected(self.state.errors.clone())
            }
        }
    }

    fn handle(&mut self, completion: Completion) -> Option<SessionUpdate> {
        match completion {
            Completion::Tick { id } => {
                let increment = self.progress.next_increment();
                self.dispatch(FormEvent::ProgressTick { id, increment });
                let entry = self.state.uploads.get(id)?;
                if entry.status != UploadStatus::Uploading {
                    return None;
                }
                entry
                    .progress
                    .map(|progress| SessionUpdate::Progress { id, progress })
            }
            Completion::Uploaded { id, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                let event = match result {
                    Ok(response) => FormEvent::UploadSucceeded {
                        id,
                        url: response.url,
                    },
                    Err(error) => FormEvent::UploadFailed {
                        id,
                        message: error.to_string(),
                    },
                };
                self.dispatch(event);
                let status = self.state.uploads.get(id)?.status;
                if status == UploadStatus::Success {
                    self.files.remove(&id);
                }
                Some(SessionUpdate::Finished { id, status })
            }
            Completion::SettleDue { id } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.dispatch(FormEvent::SuccessDisplayElapsed { id });
                self.state.uploads.get(id)?;
                Some(SessionUpdate::Settled { id })
            }
        }
    }

    fn start_upload(&mut self, id: UploadId) {
        let Some((name, size_bytes)) = self
            .state
            .uploads
            .get(id)
            .map(|entry| (entry.name.clone(), entry.size_bytes))
        else {
            return;
        };
        let Some(bytes) = self.files.get(&id).cloned() else {
            tracing::warn!("No file contents for upload {id}");
            self.state.apply(FormEvent::UploadFailed {
                id,
                message: "File contents are no longer available".to_string(),
            });
            return;
        };
        tracing::info!("Uploading {name} ({})", format_bytes(size_bytes));

        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        let tick = self.tick;
        self.in_flight += 1;
        tokio::spawn(async move {
            let upload = tokio::spawn(async move {
                backend.upload_file(&name, bytes.as_ref().clone()).await
            });
            tokio::pin!(upload);
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;
            let result = loop {
                tokio::select! {
                    joined = &mut upload => {
                        break joined
                            .unwrap_or_else(|error| Err(ApiError::Task(error.to_string())));
                    }
                    _ = interval.tick() => {
                        if tx.send(Completion::Tick { id }).is_err() {
                            return;
                        }
                    }
                }
            };
            let _ = tx.send(Completion::Uploaded { id, result });
        });
    }

    fn schedule_settle(&mut self, id: UploadId, after: Duration) {
        let tx = self.tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(Completion::SettleDue { id });
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error_from_body;
    use crate::models::{ShareRequest, ShareResponse};
    use crate::progress::{FixedProgress, PROGRESS_CAP, PROGRESS_COMPLETE};
    use crate::validation::{FieldKey, MaxViews};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        delay: Duration,
        panic_on_upload: bool,
        failures_left: Mutex<HashMap<String, usize>>,
        share_error: Option<String>,
        requests: Mutex<Vec<ShareRequest>>,
    }

    impl FakeBackend {
        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::default()
            }
        }

        fn failing_once(mut self, name: &str) -> Self {
            self.failures_left
                .get_mut()
                .unwrap()
                .insert(name.to_string(), 1);
            self
        }
    }

    #[async_trait]
    impl ShareBackend for FakeBackend {
        async fn upload_file(
            &self,
            file_name: &str,
            _bytes: Vec<u8>,
        ) -> Result<UploadResponse, ApiError> {
            tokio::time::sleep(self.delay).await;
            assert!(!self.panic_on_upload, "upload backend crashed");
            let should_fail = {
                let mut failures = self.failures_left.lock().unwrap();
                match failures.get_mut(file_name) {
                    Some(left) if *left > 0 => {
                        *left -= 1;
                        true
                    }
                    _ => false,
                }
            };
            if should_fail {
                return Err(ApiError::Status {
                    status: 500,
                    body: "Network Error".to_string(),
                });
            }
            Ok(UploadResponse {
                url: format!("https://cdn.test/{file_name}"),
                extra: serde_json::Map::new(),
            })
        }

        async fn generate_share_url(
            &self,
            request: &ShareRequest,
        ) -> Result<ShareResponse, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(body) = &self.share_error {
                return Err(error_from_body(400, body));
            }
            Ok(serde_json::from_value(serde_json::json!({
                "id": "s1",
                "secret_url": "https://ghost.test/s/s1",
            }))?)
        }
    }

    fn context() -> SubmitContext {
        SubmitContext {
            now: NaiveDate::from_ymd_opt(2025, 9, 27)
                .unwrap()
                .and_hms_opt(15, 40, 59)
                .unwrap(),
            timezone: "Asia/Karachi".to_string(),
        }
    }

    fn session(backend: FakeBackend) -> ShareSession<FakeBackend> {
        ShareSession::new(backend)
            .with_progress_source(FixedProgress(40.0))
            .with_timing(Duration::from_millis(200), Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn failed_upload_retry_then_submit() {
        let backend = FakeBackend::with_delay(Duration::from_millis(500)).failing_once("b.png");
        let mut session = session(backend);

        let ids = session.add_files(vec![
            LocalFile::new("a.png", b"aaa".to_vec()),
            LocalFile::new("b.png", b"bbb".to_vec()),
        ]);
        session.wait_for_uploads().await;

        assert_eq!(session.state().uploads.uploaded_urls(), ["https://cdn.test/a.png"]);
        let failed = session.state().uploads.get(ids[1]).unwrap();
        assert_eq!(failed.status, UploadStatus::Error);
        assert_eq!(
            session.submit_with(context()).await,
            SubmitOutcome::Blocked(SubmitBlocker::FailedUploads)
        );

        assert!(session.retry(ids[1]));
        session.wait_for_uploads().await;

        assert_eq!(
            session.state().uploads.uploaded_urls(),
            ["https://cdn.test/a.png", "https://cdn.test/b.png"]
        );
        assert!(session.state().can_submit());

        let outcome = session.submit_with(context()).await;
        match outcome {
            SubmitOutcome::Created(view) => {
                assert_eq!(view.id, "s1");
                assert_eq!(view.share_url.as_deref(), Some("https://ghost.test/s/s1"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        let requests = session.backend().requests.lock().unwrap().clone();
        assert_eq!(
            requests[0].files,
            ["https://cdn.test/a.png", "https://cdn.test/b.png"]
        );
        assert_eq!(requests[0].timezone.as_deref(), Some("Asia/Karachi"));
    }

    #[tokio::test(start_paused = true)]
    async fn progress_stays_below_cap_until_success() {
        let mut session = session(FakeBackend::with_delay(Duration::from_secs(2)));
        let ids = session.add_files(vec![LocalFile::new("big.bin", vec![0; 32])]);

        let mut progress = Vec::new();
        let status = loop {
            match session.process_next().await {
                Some(SessionUpdate::Progress { progress: value, .. }) => progress.push(value),
                Some(SessionUpdate::Finished { status, .. }) => break status,
                other => panic!("unexpected update: {other:?}"),
            }
        };

        assert_eq!(status, UploadStatus::Success);
        assert!(!progress.is_empty());
        assert!(progress.iter().all(|value| *value <= PROGRESS_CAP));
        assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
        let entry = session.state().uploads.get(ids[0]).unwrap();
        assert_eq!(entry.progress, Some(PROGRESS_COMPLETE));
        assert!(entry.success_visible);
    }

    #[tokio::test(start_paused = true)]
    async fn success_display_settles_after_delay() {
        let mut session = session(FakeBackend::default());
        let ids = session.add_files(vec![LocalFile::new("a.txt", b"a".to_vec())]);

        session.drain().await;

        let entry = session.state().uploads.get(ids[0]).unwrap();
        assert_eq!(entry.status, UploadStatus::Success);
        assert!(!entry.success_visible);
        assert_eq!(entry.remote_url.as_deref(), Some("https://cdn.test/a.txt"));
    }

    #[tokio::test(start_paused = true)]
    async fn removed_upload_result_is_dropped() {
        let mut session = session(FakeBackend::with_delay(Duration::from_millis(500)));
        let ids = session.add_files(vec![LocalFile::new("a.txt", b"a".to_vec())]);

        let removed = session.remove(ids[0]).unwrap();
        assert_eq!(removed.name, "a.txt");
        session.drain().await;

        assert!(session.state().uploads.is_empty());
        assert!(session.state().uploads.uploaded_urls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_releases_file_contents() {
        let backend = FakeBackend::with_delay(Duration::from_millis(500)).failing_once("a.bin");
        let mut session = session(backend);
        session.add_files(vec![LocalFile::new("a.bin", vec![7; 1024])]);
        assert_eq!(session.files.len(), 1);

        session.dispatch(FormEvent::Reset);
        session.drain().await;

        assert!(session.state().uploads.is_empty());
        assert!(session.files.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_upload_keeps_contents_for_retry() {
        let backend = FakeBackend::with_delay(Duration::from_millis(500)).failing_once("a.bin");
        let mut session = session(backend);
        let ids = session.add_files(vec![LocalFile::new("a.bin", vec![7; 16])]);

        session.wait_for_uploads().await;
        assert!(session.files.contains_key(&ids[0]));

        assert!(session.retry(ids[0]));
        session.wait_for_uploads().await;
        assert!(session.files.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn crashed_upload_task_marks_entry_failed() {
        let backend = FakeBackend {
            delay: Duration::from_millis(300),
            panic_on_upload: true,
            ..FakeBackend::default()
        };
        let mut session = session(backend);
        let ids = session.add_files(vec![LocalFile::new("a.txt", b"a".to_vec())]);

        session.wait_for_uploads().await;

        let entry = session.state().uploads.get(ids[0]).unwrap();
        assert_eq!(entry.status, UploadStatus::Error);
        assert!(entry
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("Upload task failed"));
        assert_eq!(session.process_next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn submit_is_blocked_while_uploading() {
        let mut session = session(FakeBackend::with_delay(Duration::from_secs(5)));
        session.dispatch(FormEvent::SetMessage("hello".to_string()));
        session.add_files(vec![LocalFile::new("a.txt", b"a".to_vec())]);

        assert_eq!(
            session.submit_with(context()).await,
            SubmitOutcome::Blocked(SubmitBlocker::UploadsInFlight)
        );
    }

    #[tokio::test]
    async fn local_validation_failure_skips_network() {
        let mut session = session(FakeBackend::default());
        session.dispatch(FormEvent::SetMessage("hello".to_string()));
        session.dispatch(FormEvent::SetMaxViews(MaxViews::Limited("0".to_string())));

        let outcome = session.submit_with(context()).await;

        match outcome {
            SubmitOutcome::Rejected(errors) => assert!(errors.contains(&FieldKey::MaxViews)),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(session.backend().requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn backend_field_errors_are_shown() {
        let backend = FakeBackend {
            share_error: Some(r#"{"allowed_ip": ["Enter a valid IPv4 address."]}"#.to_string()),
            ..FakeBackend::default()
        };
        let mut session = session(backend);
        session.dispatch(FormEvent::SetMessage("hello".to_string()));

        let outcome = session.submit_with(context()).await;

        match outcome {
            SubmitOutcome::Rejected(errors) => assert_eq!(
                errors.get(&FieldKey::AllowedIp),
                Some("Enter a valid IPv4 address.")
            ),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!session.state().submitting);
    }
}
