//! Upload form state machine

use std::path::PathBuf;

use crate::api::{FeedbackState, UploadSource, VideoApi, VideoRecord};
use crate::flows::FeedbackRoute;
use crate::Result;

pub const UPLOAD_FAILURE_MESSAGE: &str =
    "Failed to upload video. Ensure it meets requirements (360p-4K, 4s-60min, <2GB, audio track).";

#[derive(Debug, Clone, PartialEq)]
pub enum UploadState {
    Idle,
    Submitting,
    /// Upload analysed; the route carries the record to the feedback view
    Success(FeedbackRoute),
    Error(String),
}

/// Upload page: a file or a URL, and where the last submit got to
#[derive(Debug, Clone)]
pub struct UploadFlow {
    file: Option<PathBuf>,
    url: String,
    state: UploadState,
    inline_error: Option<String>,
}

impl Default for UploadFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadFlow {
    pub fn new() -> Self {
        Self {
            file: None,
            url: String::new(),
            state: UploadState::Idle,
            inline_error: None,
        }
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Validation message or the failure message of the last submit
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            UploadState::Error(message) => Some(message),
            _ => self.inline_error.as_deref(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.state == UploadState::Submitting
    }

    pub fn set_file(&mut self, file: Option<PathBuf>) {
        self.file = file;
        self.clear_error();
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.clear_error();
    }

    pub fn push_url_char(&mut self, c: char) {
        self.url.push(c);
        self.clear_error();
    }

    pub fn pop_url_char(&mut self) {
        self.url.pop();
        self.clear_error();
    }

    fn clear_error(&mut self) {
        self.inline_error = None;
        if matches!(self.state, UploadState::Error(_)) {
            self.state = UploadState::Idle;
        }
    }

    /// Check the inputs. On failure the message is shown inline and the
    /// flow stays idle.
    pub fn validate(&mut self) -> Result<UploadSource> {
        let file = self.file.clone().filter(|p| !p.as_os_str().is_empty());
        UploadSource::from_inputs(file, Some(&self.url)).inspect_err(|e| {
            self.inline_error = Some(e.to_string());
        })
    }

    /// Validate and move to `Submitting`. Returns `None` when validation
    /// failed or a submit is already running; nothing must be sent then.
    pub fn begin_submit(&mut self) -> Option<UploadSource> {
        if self.is_submitting() {
            return None;
        }

        self.inline_error = None;
        let source = self.validate().ok()?;
        self.state = UploadState::Submitting;
        Some(source)
    }

    pub fn finish_submit(&mut self, result: Result<VideoRecord>) {
        self.state = match result {
            Ok(record) => {
                tracing::info!(video_id = %record.video_id, "Upload complete");
                UploadState::Success(FeedbackRoute {
                    video_id: record.video_id.clone(),
                    state: FeedbackState::from_record(&record),
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "Upload failed");
                UploadState::Error(UPLOAD_FAILURE_MESSAGE.to_string())
            }
        };
    }

    /// Run the whole submit against `api`
    pub async fn submit(&mut self, api: &dyn VideoApi) -> &UploadState {
        if let Some(source) = self.begin_submit() {
            let result = api.upload_video(&source).await;
            self.finish_submit(result);
        }
        &self.state
    }

    /// Take the route out of a successful submit, resetting the form
    pub fn take_route(&mut self) -> Option<FeedbackRoute> {
        if !matches!(self.state, UploadState::Success(_)) {
            return None;
        }

        match std::mem::replace(self, Self::new()).state {
            UploadState::Success(route) => Some(route),
            _ => None,
        }
    }
}
