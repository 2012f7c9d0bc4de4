//! Wire models for the feedback service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{ClipcoachError, Result};

/// Structured advice returned for an analysed clip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    #[serde(default)]
    pub good: Vec<String>,
    #[serde(default)]
    pub bad: Vec<String>,
    #[serde(default)]
    pub improve: Vec<String>,
}

impl Advice {
    pub fn is_empty(&self) -> bool {
        self.good.is_empty() && self.bad.is_empty() && self.improve.is_empty()
    }
}

/// A titled section of a clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<u32>,
    #[serde(default)]
    pub chapter_title: String,
    #[serde(default)]
    pub chapter_summary: String,
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl Chapter {
    pub fn is_well_formed(&self) -> bool {
        self.start <= self.end
    }
}

/// A video as stored by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    #[serde(default)]
    pub video_path: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub advice: Advice,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// One user message and the reply to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user: String,
    pub ai: String,
}

/// State handed from the upload or gallery view to the feedback view.
///
/// Serializes to exactly `{video_path, advice, chapters, summary}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackState {
    pub video_path: String,
    pub advice: Advice,
    pub chapters: Vec<Chapter>,
    pub summary: String,
}

impl FeedbackState {
    pub fn from_record(record: &VideoRecord) -> Self {
        Self {
            video_path: record.video_path.clone(),
            advice: record.advice.clone(),
            chapters: record.chapters.clone(),
            summary: record.summary.clone(),
        }
    }
}

/// Reply of `POST /api/generate-image`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ThumbnailResponse {
    #[serde(default, alias = "image_url")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ThumbnailResponse {
    /// Error message, if the service reported one
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ThumbnailRequest<'a> {
    pub video_id: &'a str,
    pub summary: &'a str,
}

/// Body of `POST /api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub video_id: String,
    pub message: String,
    pub summary: String,
}

/// Reply of `POST /api/chat`
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// Error body the service sends alongside non-2xx statuses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: Option<String>,
}

/// What the user picked to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadSource {
    File(PathBuf),
    Url(String),
}

pub const MISSING_UPLOAD_INPUT: &str = "Please select a file or enter a URL";
pub const AMBIGUOUS_UPLOAD_INPUT: &str = "Choose either a file or a URL, not both";

impl UploadSource {
    /// Build a source from raw form inputs. Exactly one must be present;
    /// a blank URL counts as absent.
    pub fn from_inputs(file: Option<PathBuf>, url: Option<&str>) -> Result<Self> {
        let url = url.map(str::trim).filter(|u| !u.is_empty());

        match (file, url) {
            (Some(path), None) => Ok(Self::File(path)),
            (None, Some(url)) => Ok(Self::Url(url.to_string())),
            (Some(_), Some(_)) => Err(ClipcoachError::Validation(
                AMBIGUOUS_UPLOAD_INPUT.to_string(),
            )),
            (None, None) => Err(ClipcoachError::Validation(MISSING_UPLOAD_INPUT.to_string())),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
        }
    }
}
