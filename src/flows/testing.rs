//! In-memory [`VideoApi`] used by the flow tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::api::{Advice, ChatTurn, ThumbnailResponse, UploadSource, VideoApi, VideoRecord};
use crate::{ClipcoachError, Result};

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    lists: Mutex<VecDeque<Result<Vec<VideoRecord>>>>,
    upload: Mutex<Option<Result<VideoRecord>>>,
    thumbnails: Mutex<VecDeque<Result<ThumbnailResponse>>>,
    chats: Mutex<VecDeque<Result<Vec<ChatTurn>>>>,
}

impl FakeApi {
    pub fn record(id: &str, thumbnail: Option<&str>) -> VideoRecord {
        VideoRecord {
            video_id: id.to_string(),
            video_path: format!("uploads/{}.mp4", id),
            filename: format!("{}.mp4", id),
            summary: format!("summary of {}", id),
            advice: Advice::default(),
            chapters: Vec::new(),
            thumbnail_url: thumbnail.map(str::to_string),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn push_list(&self, result: Result<Vec<VideoRecord>>) {
        self.lists.lock().unwrap().push_back(result);
    }

    pub fn set_upload(&self, result: Result<VideoRecord>) {
        *self.upload.lock().unwrap() = Some(result);
    }

    pub fn push_thumbnail(&self, result: Result<ThumbnailResponse>) {
        self.thumbnails.lock().unwrap().push_back(result);
    }

    pub fn push_chat(&self, result: Result<Vec<ChatTurn>>) {
        self.chats.lock().unwrap().push_back(result);
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn unscripted(what: &str) -> ClipcoachError {
    ClipcoachError::Network(format!("no scripted {} response", what))
}

#[async_trait]
impl VideoApi for FakeApi {
    async fn list_videos(&self) -> Result<Vec<VideoRecord>> {
        self.log("list".to_string());
        self.lists
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("list")))
    }

    async fn upload_video(&self, source: &UploadSource) -> Result<VideoRecord> {
        self.log(format!("upload {}", source.describe()));
        self.upload
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(unscripted("upload")))
    }

    async fn generate_thumbnail(&self, video_id: &str, summary: &str) -> Result<ThumbnailResponse> {
        self.log(format!("thumbnail {} {}", video_id, summary));
        self.thumbnails
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("thumbnail")))
    }

    async fn send_chat_message(
        &self,
        video_id: &str,
        message: &str,
        summary: &str,
    ) -> Result<Vec<ChatTurn>> {
        self.log(format!("chat {} {} {}", video_id, message, summary));
        self.chats
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(unscripted("chat")))
    }
}
