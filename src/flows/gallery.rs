//! Gallery of analysed videos and the thumbnail retry protocol
//!
//! On load every record without a usable thumbnail is marked loading and a
//! generation job is debounced for it. When a job completes the whole list
//! is re-fetched, then the video's loading flag is cleared. Thumbnail state
//! is keyed by video id; nothing that happens to one id touches another.
//!
//! Each load starts a new generation. Jobs and their events carry the
//! generation they were issued under, and events from an older load are
//! dropped so a slow job can never settle a request made after it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{VideoApi, VideoRecord};
use crate::config::Settings;
use crate::flows::debounce::{Debounced, Debouncer, Keyed};
use crate::ClipcoachError;

pub const GALLERY_FAILURE_MESSAGE: &str = "Failed to load videos. Please try again later.";
pub const THUMBNAIL_FAILURE_MESSAGE: &str = "Failed to generate thumbnail";
pub const THUMBNAIL_MISSING_MESSAGE: &str = "Thumbnail was not generated";
pub const THUMBNAIL_SUPERSEDED_MESSAGE: &str = "Thumbnail request was superseded; retry";

/// Client-side thumbnail state for one video
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ThumbnailState {
    #[default]
    NotRequested,
    Loading,
    Ready(String),
    Failed(String),
}

impl ThumbnailState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::NotRequested => "-",
            Self::Loading => "Generating thumbnail...",
            Self::Ready(url) => url,
            Self::Failed(message) => message,
        }
    }
}

/// A thumbnail generation request for one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailJob {
    pub video_id: String,
    pub summary: String,
    pub generation: u64,
}

impl Keyed for ThumbnailJob {
    fn key(&self) -> &str {
        &self.video_id
    }
}

/// Results produced by [`ThumbnailWorker`], applied in order by the owner
#[derive(Debug, Clone, PartialEq)]
pub enum GalleryEvent {
    /// Generation for this video failed, softly or otherwise
    Failed {
        video_id: String,
        generation: u64,
        message: String,
    },
    /// Fresh copy of the full list
    Refreshed(Vec<VideoRecord>),
    /// The request for this video is finished
    Settled { video_id: String, generation: u64 },
}

/// Gallery page state
#[derive(Debug, Clone)]
pub struct Gallery {
    videos: Vec<VideoRecord>,
    thumbnails: HashMap<String, ThumbnailState>,
    failures: HashMap<String, String>,
    error: Option<String>,
    placeholder: String,
    generation: u64,
}

impl Gallery {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            videos: Vec::new(),
            thumbnails: HashMap::new(),
            failures: HashMap::new(),
            error: None,
            placeholder: placeholder.into(),
            generation: 0,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.gallery.placeholder_thumbnail.clone())
    }

    pub fn videos(&self) -> &[VideoRecord] {
        &self.videos
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Generation of the current load; bumped by every [`Gallery::load`]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn find(&self, video_id: &str) -> Option<&VideoRecord> {
        self.videos.iter().find(|v| v.video_id == video_id)
    }

    pub fn thumbnail(&self, video_id: &str) -> ThumbnailState {
        self.thumbnails.get(video_id).cloned().unwrap_or_default()
    }

    /// True while any video is still waiting on a generation request
    pub fn has_loading(&self) -> bool {
        self.thumbnails.values().any(ThumbnailState::is_loading)
    }

    /// A thumbnail is usable when present and not the service's stand-in.
    pub fn usable_thumbnail<'a>(&self, record: &'a VideoRecord) -> Option<&'a str> {
        let url = record.thumbnail_url.as_deref()?.trim();
        if url.is_empty() {
            return None;
        }
        let last_segment = url.rsplit('/').next().unwrap_or(url);
        if !self.placeholder.is_empty() && last_segment == self.placeholder {
            return None;
        }
        Some(url)
    }

    /// Install the initial list and return one job per missing thumbnail.
    pub fn load(&mut self, videos: Vec<VideoRecord>) -> Vec<ThumbnailJob> {
        self.error = None;
        self.thumbnails.clear();
        self.failures.clear();
        self.generation += 1;

        let mut jobs = Vec::new();
        for record in &videos {
            let state = match self.usable_thumbnail(record) {
                Some(url) => ThumbnailState::Ready(url.to_string()),
                None => {
                    jobs.push(ThumbnailJob {
                        video_id: record.video_id.clone(),
                        summary: record.summary.clone(),
                        generation: self.generation,
                    });
                    ThumbnailState::Loading
                }
            };
            self.thumbnails.insert(record.video_id.clone(), state);
        }
        self.videos = videos;

        tracing::info!(
            videos = self.videos.len(),
            missing_thumbnails = jobs.len(),
            generation = self.generation,
            "Gallery loaded"
        );
        jobs
    }

    pub fn load_failed(&mut self) {
        self.error = Some(GALLERY_FAILURE_MESSAGE.to_string());
    }

    /// Re-arm a failed video. Clears the previous failure before the job is
    /// handed back for re-issue.
    pub fn retry(&mut self, video_id: &str) -> Option<ThumbnailJob> {
        if !matches!(self.thumbnails.get(video_id), Some(ThumbnailState::Failed(_))) {
            return None;
        }

        self.failures.remove(video_id);
        self.thumbnails
            .insert(video_id.to_string(), ThumbnailState::Loading);

        let summary = self.find(video_id).map(|v| v.summary.clone()).unwrap_or_default();
        tracing::info!(video_id, "Retrying thumbnail generation");
        Some(ThumbnailJob {
            video_id: video_id.to_string(),
            summary,
            generation: self.generation,
        })
    }

    /// Remember a failure for a video still loading; applied on settle.
    /// Ignored for videos that are not loading.
    pub fn record_failure(&mut self, video_id: &str, message: impl Into<String>) {
        if !self.thumbnail(video_id).is_loading() {
            return;
        }
        self.failures.insert(video_id.to_string(), message.into());
    }

    /// Replace the list with a fresh copy from the service.
    pub fn refresh(&mut self, videos: Vec<VideoRecord>) {
        self.videos = videos;
    }

    /// Clear a video's loading flag.
    pub fn settle(&mut self, video_id: &str) {
        if !self.thumbnail(video_id).is_loading() {
            return;
        }

        let state = if let Some(message) = self.failures.remove(video_id) {
            ThumbnailState::Failed(message)
        } else {
            match self.find(video_id).and_then(|v| self.usable_thumbnail(v)) {
                Some(url) => ThumbnailState::Ready(url.to_string()),
                None => ThumbnailState::Failed(THUMBNAIL_MISSING_MESSAGE.to_string()),
            }
        };

        tracing::debug!(video_id, state = ?state, "Thumbnail settled");
        self.thumbnails.insert(video_id.to_string(), state);
    }

    pub fn apply(&mut self, event: GalleryEvent) {
        match event {
            GalleryEvent::Failed {
                video_id,
                generation,
                message,
            } => {
                if self.is_current(&video_id, generation) {
                    self.record_failure(&video_id, message);
                }
            }
            GalleryEvent::Refreshed(videos) => self.refresh(videos),
            GalleryEvent::Settled {
                video_id,
                generation,
            } => {
                if self.is_current(&video_id, generation) {
                    self.settle(&video_id);
                }
            }
        }
    }

    fn is_current(&self, video_id: &str, generation: u64) -> bool {
        if generation == self.generation {
            return true;
        }
        tracing::debug!(
            video_id,
            generation,
            current = self.generation,
            "Dropping thumbnail event from an earlier load"
        );
        false
    }

    /// Apply events until no video is loading or the worker goes away.
    pub async fn drain_until_settled(&mut self, events: &mut mpsc::UnboundedReceiver<GalleryEvent>) {
        while self.has_loading() {
            match events.recv().await {
                Some(event) => self.apply(event),
                None => break,
            }
        }
    }
}

/// Runs debounced thumbnail jobs against the service and reports back
/// through a channel.
pub struct ThumbnailWorker {
    debouncer: Debouncer<ThumbnailJob>,
}

impl ThumbnailWorker {
    pub fn spawn(
        api: Arc<dyn VideoApi>,
        settings: &Settings,
        cancel: &CancellationToken,
        events: mpsc::UnboundedSender<GalleryEvent>,
    ) -> Self {
        let debouncer = Debouncer::spawn(
            settings.debounce_window(),
            settings.gallery.debounce_scope,
            cancel,
            move |debounced| run_job(api.clone(), events.clone(), debounced),
        );

        Self { debouncer }
    }

    pub fn request(&self, job: ThumbnailJob) {
        if !self.debouncer.call(job) {
            tracing::debug!("Thumbnail worker stopped; dropping request");
        }
    }

    pub fn request_all(&self, jobs: impl IntoIterator<Item = ThumbnailJob>) {
        for job in jobs {
            self.request(job);
        }
    }
}

async fn run_job(
    api: Arc<dyn VideoApi>,
    events: mpsc::UnboundedSender<GalleryEvent>,
    debounced: Debounced<ThumbnailJob>,
) {
    // Send errors only mean the gallery is gone.
    let send = |event| {
        let _ = events.send(event);
    };

    let job = match debounced {
        Debounced::Fire(job) => job,
        Debounced::Superseded(job) => {
            send(GalleryEvent::Failed {
                video_id: job.video_id.clone(),
                generation: job.generation,
                message: THUMBNAIL_SUPERSEDED_MESSAGE.to_string(),
            });
            send(GalleryEvent::Settled {
                video_id: job.video_id,
                generation: job.generation,
            });
            return;
        }
    };

    tracing::info!(video_id = %job.video_id, "Generating thumbnail");
    match api.generate_thumbnail(&job.video_id, &job.summary).await {
        Ok(response) => {
            if let Some(error) = response.error_message() {
                tracing::warn!(video_id = %job.video_id, %error, "Thumbnail generation reported an error");
                send(GalleryEvent::Failed {
                    video_id: job.video_id.clone(),
                    generation: job.generation,
                    message: error.to_string(),
                });
            }

            match api.list_videos().await {
                Ok(videos) => send(GalleryEvent::Refreshed(videos)),
                Err(e) => {
                    tracing::warn!(video_id = %job.video_id, error = %e, "Failed to refresh videos");
                    send(GalleryEvent::Failed {
                        video_id: job.video_id.clone(),
                        generation: job.generation,
                        message: THUMBNAIL_FAILURE_MESSAGE.to_string(),
                    });
                }
            }
        }
        Err(e) => {
            tracing::warn!(video_id = %job.video_id, error = %e, "Thumbnail request failed");
            send(GalleryEvent::Failed {
                video_id: job.video_id.clone(),
                generation: job.generation,
                message: failure_message(&e),
            });
        }
    }

    send(GalleryEvent::Settled {
        video_id: job.video_id,
        generation: job.generation,
    });
}

fn failure_message(err: &ClipcoachError) -> String {
    match err {
        ClipcoachError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
        _ => THUMBNAIL_FAILURE_MESSAGE.to_string(),
    }
}

/// First `words` words of a summary, with an ellipsis when cut.
pub fn truncate_summary(summary: &str, words: usize) -> String {
    let summary = summary.trim();
    if summary.is_empty() {
        return "No summary available".to_string();
    }

    let parts: Vec<&str> = summary.split_whitespace().collect();
    if parts.len() > words {
        format!("{}...", parts[..words].join(" "))
    } else {
        summary.to_string()
    }
}

/// File names arrive URL-quoted from the service.
pub fn display_filename(filename: &str) -> String {
    filename.replace("%20", " ")
}
