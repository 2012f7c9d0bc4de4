//! Feedback view: static analysis plus the follow-up chat tab

use crate::api::{media_url, Chapter, FeedbackState, VideoApi};
use crate::flows::chat::ChatSession;
use crate::flows::FeedbackRoute;
use crate::{ClipcoachError, Result};

pub const EMPTY_FEEDBACK_MESSAGE: &str =
    "No video or feedback data available. Please upload a video first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Feedback,
    FollowUp,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Feedback => "Feedback",
            Self::FollowUp => "Follow Up",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Feedback => Self::FollowUp,
            Self::FollowUp => Self::Feedback,
        }
    }
}

/// A titled list shown on the feedback tab
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: &'static str,
    pub items: Vec<String>,
    pub empty: &'static str,
}

pub struct FeedbackView {
    video_id: String,
    state: Option<FeedbackState>,
    tab: Tab,
    chat: ChatSession,
}

impl FeedbackView {
    /// `state` is whatever the previous view handed over, if anything.
    pub fn new(video_id: impl Into<String>, state: Option<FeedbackState>) -> Self {
        let video_id = video_id.into();
        let summary = state.as_ref().map(|s| s.summary.clone()).unwrap_or_default();

        Self {
            chat: ChatSession::new(video_id.clone(), summary),
            video_id,
            state,
            tab: Tab::default(),
        }
    }

    pub fn from_route(route: FeedbackRoute) -> Self {
        Self::new(route.video_id, Some(route.state))
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// The navigation state, unless it is missing or has no video
    pub fn state(&self) -> Option<&FeedbackState> {
        self.state.as_ref().filter(|s| !s.video_path.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.state().is_none()
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatSession {
        &mut self.chat
    }

    pub fn video_url(&self, base_url: &str) -> Option<String> {
        let state = self.state()?;
        media_url(base_url, &state.video_path).ok()
    }

    /// Sections of the feedback tab, in display order
    pub fn sections(&self, show_chapter_times: bool) -> Vec<Section> {
        let Some(state) = self.state() else {
            return Vec::new();
        };

        vec![
            Section {
                title: "What You Did Well",
                items: state.advice.good.clone(),
                empty: "No positive feedback available",
            },
            Section {
                title: "What You Did Poorly",
                items: state.advice.bad.clone(),
                empty: "No negative feedback available",
            },
            Section {
                title: "How to Improve",
                items: state.advice.improve.clone(),
                empty: "No improvement suggestions available",
            },
            Section {
                title: "Chapters",
                items: state
                    .chapters
                    .iter()
                    .map(|c| format_chapter(c, show_chapter_times))
                    .collect(),
                empty: "No chapters available",
            },
        ]
    }
}

/// One chapter line. Times are left out when the chapter ends before it
/// starts.
pub fn format_chapter(chapter: &Chapter, show_times: bool) -> String {
    if show_times && chapter.is_well_formed() {
        format!(
            "{} ({}s - {}s): {}",
            chapter.chapter_title, chapter.start, chapter.end, chapter.chapter_summary
        )
    } else {
        format!("{}: {}", chapter.chapter_title, chapter.chapter_summary)
    }
}

/// Recover a feedback route from the gallery listing.
///
/// The service has no fetch-by-id endpoint, so this is how a feedback view
/// opened without navigation state gets its data back.
pub async fn find_feedback(api: &dyn VideoApi, video_id: &str) -> Result<FeedbackRoute> {
    let videos = api.list_videos().await?;
    let record = videos
        .iter()
        .find(|v| v.video_id == video_id)
        .ok_or_else(|| ClipcoachError::NotFound(format!("video {}", video_id)))?;

    Ok(FeedbackRoute {
        video_id: record.video_id.clone(),
        state: FeedbackState::from_record(record),
    })
}
