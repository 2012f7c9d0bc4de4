//! Client-side flows: upload, gallery, feedback and chat
//!
//! These hold page state and talk to the service through [`VideoApi`];
//! the CLI and TUI only render them.
//!
//! [`VideoApi`]: crate::api::VideoApi

pub mod chat;
pub mod debounce;
pub mod feedback;
pub mod gallery;
pub mod upload;

#[cfg(test)]
pub(crate) mod testing;

use crate::api::FeedbackState;

pub use chat::{ChatSession, CHAT_FAILURE_MESSAGE};
pub use feedback::{find_feedback, FeedbackView, Tab, EMPTY_FEEDBACK_MESSAGE};
pub use gallery::{Gallery, GalleryEvent, ThumbnailJob, ThumbnailState, ThumbnailWorker};
pub use upload::{UploadFlow, UploadState, UPLOAD_FAILURE_MESSAGE};

/// Navigation to the feedback view of one video
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackRoute {
    pub video_id: String,
    pub state: FeedbackState,
}
