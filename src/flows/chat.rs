//! Follow-up chat about one video
//!
//! The service owns the transcript. After every successful message the
//! local copy is replaced by the history the service returns.

use crate::api::{ChatRequest, ChatTurn, VideoApi};
use crate::Result;

pub const CHAT_FAILURE_MESSAGE: &str = "Failed to get AI response. Try again later.";

#[derive(Debug, Clone)]
pub struct ChatSession {
    video_id: String,
    summary: String,
    transcript: Vec<ChatTurn>,
    input: String,
    error: Option<String>,
    pending: bool,
}

impl ChatSession {
    pub fn new(video_id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            summary: summary.into(),
            transcript: Vec::new(),
            input: String::new(),
            error: None,
            pending: false,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
        self.error = None;
    }

    /// Input is frozen while a message is in flight.
    pub fn push_char(&mut self, c: char) {
        if self.pending {
            return;
        }
        self.input.push(c);
        self.error = None;
    }

    pub fn pop_char(&mut self) {
        if self.pending {
            return;
        }
        self.input.pop();
        self.error = None;
    }

    /// Build the request for the current input. Blank input yields `None`
    /// and leaves everything untouched.
    pub fn begin_submit(&mut self) -> Option<ChatRequest> {
        if self.pending || self.input.trim().is_empty() {
            return None;
        }

        self.pending = true;
        Some(ChatRequest {
            video_id: self.video_id.clone(),
            message: self.input.clone(),
            summary: self.summary.clone(),
        })
    }

    pub fn finish_submit(&mut self, result: Result<Vec<ChatTurn>>) {
        self.pending = false;
        match result {
            Ok(history) => {
                tracing::debug!(video_id = %self.video_id, turns = history.len(), "Chat transcript replaced");
                self.transcript = history;
                self.input.clear();
                self.error = None;
            }
            Err(e) => {
                tracing::error!(video_id = %self.video_id, error = %e, "Chat request failed");
                self.error = Some(CHAT_FAILURE_MESSAGE.to_string());
            }
        }
    }

    /// Send the current input through `api`. Returns whether a request was
    /// issued.
    pub async fn submit(&mut self, api: &dyn VideoApi) -> bool {
        let Some(request) = self.begin_submit() else {
            return false;
        };

        let result = api
            .send_chat_message(&request.video_id, &request.message, &request.summary)
            .await;
        self.finish_submit(result);
        true
    }
}
