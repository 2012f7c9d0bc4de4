use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, Url};
use std::path::Path;
use std::time::Duration;
use tokio_util::io::ReaderStream;

use crate::api::client::VideoApi;
use crate::api::models::{
    ChatRequest, ChatResponse, ChatTurn, ErrorBody, ThumbnailRequest, ThumbnailResponse,
    UploadSource, VideoRecord,
};
use crate::config::Settings;
use crate::{ClipcoachError, Result};

/// `reqwest` implementation of [`VideoApi`]
pub struct HttpVideoApi {
    http: Client,
    base_url: String,
    upload_timeout: Duration,
}

impl HttpVideoApi {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings.base_url().to_string();
        Url::parse(&base_url).map_err(|e| {
            ClipcoachError::Config(format!("Invalid server.base_url '{}': {}", base_url, e))
        })?;

        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| ClipcoachError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            upload_timeout: settings.upload_timeout(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Multipart form that streams the clip from disk in chunks.
    async fn file_form(path: &Path) -> Result<Form> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.mp4".to_string());

        tracing::debug!(path = %path.display(), bytes = length, "Streaming clip");
        let body = Body::wrap_stream(ReaderStream::new(file));
        Ok(Form::new().part(
            "file",
            Part::stream_with_length(body, length).file_name(file_name),
        ))
    }
}

#[async_trait]
impl VideoApi for HttpVideoApi {
    async fn list_videos(&self) -> Result<Vec<VideoRecord>> {
        tracing::debug!("Fetching videos");
        let response = self.http.get(self.endpoint("/api/videos")).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn upload_video(&self, source: &UploadSource) -> Result<VideoRecord> {
        let request = self
            .http
            .post(self.endpoint("/api/upload"))
            .timeout(self.upload_timeout);

        let request = match source {
            UploadSource::File(path) => request.multipart(Self::file_form(path).await?),
            UploadSource::Url(url) => request.form(&[("url", url.as_str())]),
        };

        tracing::info!(source = %source.describe(), "Uploading video");
        let response = check_status(request.send().await?).await?;
        let record: VideoRecord = response.json().await?;
        tracing::info!(video_id = %record.video_id, "Upload analysed");

        Ok(record)
    }

    async fn generate_thumbnail(
        &self,
        video_id: &str,
        summary: &str,
    ) -> Result<ThumbnailResponse> {
        tracing::debug!(video_id, "Requesting thumbnail generation");
        let response = self
            .http
            .post(self.endpoint("/api/generate-image"))
            .json(&ThumbnailRequest { video_id, summary })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        // The service reports generation failures as {error} bodies; keep
        // those soft so the gallery can offer a retry for this video only.
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { error: Some(error) }) => Ok(ThumbnailResponse {
                thumbnail_url: None,
                error: Some(error),
            }),
            _ => Err(ClipcoachError::Api {
                status: status.as_u16(),
                message: body,
            }),
        }
    }

    async fn send_chat_message(
        &self,
        video_id: &str,
        message: &str,
        summary: &str,
    ) -> Result<Vec<ChatTurn>> {
        let body = ChatRequest {
            video_id: video_id.to_string(),
            message: message.to_string(),
            summary: summary.to_string(),
        };

        tracing::debug!(video_id, "Sending chat message");
        let response = self
            .http
            .post(self.endpoint("/api/chat"))
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        let payload: ChatResponse = response.json().await?;

        Ok(payload.history)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or(body);

    tracing::warn!(status = status.as_u16(), %message, "Service returned an error status");
    Err(ClipcoachError::Api {
        status: status.as_u16(),
        message,
    })
}

/// Playable URL for a record's `video_path`.
///
/// Absolute URLs pass through; anything else is served from `/uploads/`
/// under its percent-encoded file name.
pub fn media_url(base_url: &str, video_path: &str) -> Result<String> {
    if video_path.starts_with("http://") || video_path.starts_with("https://") {
        return Ok(video_path.to_string());
    }

    let file_name = video_path.rsplit('/').next().unwrap_or(video_path);
    let mut url = Url::parse(base_url.trim_end_matches('/'))
        .map_err(|e| ClipcoachError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

    url.path_segments_mut()
        .map_err(|_| ClipcoachError::Config(format!("Base URL cannot hold a path: {}", base_url)))?
        .pop_if_empty()
        .push("uploads")
        .push(file_name);

    Ok(url.to_string())
}
