//! Client for the clip feedback service
//!
//! Wraps the four REST endpoints the app consumes: list, upload,
//! thumbnail generation and chat.

mod client;
mod http;
mod models;

pub use client::{build_api, VideoApi};
pub use http::{media_url, HttpVideoApi};
pub use models::{
    Advice, Chapter, ChatRequest, ChatTurn, FeedbackState, ThumbnailResponse, UploadSource,
    VideoRecord, AMBIGUOUS_UPLOAD_INPUT, MISSING_UPLOAD_INPUT,
};
