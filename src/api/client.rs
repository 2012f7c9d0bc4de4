use async_trait::async_trait;
use std::sync::Arc;

use crate::api::http::HttpVideoApi;
use crate::api::models::{ChatTurn, ThumbnailResponse, UploadSource, VideoRecord};
use crate::config::Settings;
use crate::Result;

/// Operations offered by the feedback service.
///
/// Every call is a single request: no retries, no caching.
#[async_trait]
pub trait VideoApi: Send + Sync {
    async fn list_videos(&self) -> Result<Vec<VideoRecord>>;

    async fn upload_video(&self, source: &UploadSource) -> Result<VideoRecord>;

    /// A reply carrying an `error` field is still `Ok`; callers decide how
    /// to treat it.
    async fn generate_thumbnail(&self, video_id: &str, summary: &str)
        -> Result<ThumbnailResponse>;

    /// Returns the full transcript for the video after this message.
    async fn send_chat_message(
        &self,
        video_id: &str,
        message: &str,
        summary: &str,
    ) -> Result<Vec<ChatTurn>>;
}

/// Build the service client from runtime settings.
pub fn build_api(settings: &Settings) -> Result<Arc<dyn VideoApi>> {
    Ok(Arc::new(HttpVideoApi::from_settings(settings)?))
}
