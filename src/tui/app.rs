//! Main TUI application state and logic

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::api::{build_api, VideoApi};
use crate::config::Settings;
use crate::flows::FeedbackRoute;
use crate::tui::screens::{FeedbackScreen, GalleryScreen, UploadScreen};
use crate::tui::widgets::HelpPopup;

/// Current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    Upload,
    Gallery,
    Feedback,
}

/// Main application state
///
/// Every screen owns a child of `cancel`. Leaving a screen drops it, which
/// cancels its token, so replies for a screen that is gone are discarded.
pub struct App {
    settings: Settings,
    api: Arc<dyn VideoApi>,
    current_screen: AppScreen,
    previous_screen: Option<AppScreen>,
    show_help: bool,
    quit: bool,
    cancel: CancellationToken,

    // Screen states
    upload: UploadScreen,
    gallery: Option<GalleryScreen>,
    feedback: Option<FeedbackScreen>,
}

impl App {
    /// Create a new app instance
    pub fn new(settings: Settings) -> Result<Self> {
        let api = build_api(&settings)?;
        Ok(Self::with_api(settings, api))
    }

    pub fn with_api(settings: Settings, api: Arc<dyn VideoApi>) -> Self {
        let cancel = CancellationToken::new();

        Self {
            upload: UploadScreen::new(cancel.child_token()),
            settings,
            api,
            current_screen: AppScreen::Upload,
            previous_screen: None,
            show_help: false,
            quit: false,
            cancel,
            gallery: None,
            feedback: None,
        }
    }

    pub fn current_screen(&self) -> AppScreen {
        self.current_screen
    }

    /// Draw the current screen
    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();

        match self.current_screen {
            AppScreen::Upload => self.upload.draw(frame, area),
            AppScreen::Gallery => {
                if let Some(gallery) = self.gallery.as_mut() {
                    gallery.draw(frame, area);
                }
            }
            AppScreen::Feedback => {
                if let Some(feedback) = self.feedback.as_mut() {
                    feedback.draw(frame, area);
                }
            }
        }

        // Draw help popup if active
        if self.show_help {
            HelpPopup::draw(frame, area, self.current_screen);
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }

        if self.show_help {
            self.show_help = false;
            return;
        }

        match key.code {
            KeyCode::F(1) => {
                self.toggle_help();
                return;
            }
            KeyCode::Char('?') if !self.is_typing() => {
                self.toggle_help();
                return;
            }
            KeyCode::Esc => {
                self.handle_back();
                return;
            }
            KeyCode::Char('g') if ctrl => {
                self.switch_screen(AppScreen::Gallery);
                return;
            }
            KeyCode::Char('u') if ctrl => {
                self.switch_screen(AppScreen::Upload);
                return;
            }
            _ => {}
        }

        match self.current_screen {
            AppScreen::Upload => self.upload.handle_key(key.code, &self.api),
            AppScreen::Gallery => self.handle_gallery_key(key.code),
            AppScreen::Feedback => {
                if let Some(feedback) = self.feedback.as_mut() {
                    feedback.handle_key(key.code, &self.api);
                }
            }
        }
    }

    /// Handle gallery key input
    fn handle_gallery_key(&mut self, key: KeyCode) {
        let Some(gallery) = self.gallery.as_mut() else {
            return;
        };

        match key {
            KeyCode::Up | KeyCode::Char('k') => gallery.previous(),
            KeyCode::Down | KeyCode::Char('j') => gallery.next(),
            KeyCode::Char('r') => gallery.retry_selected(),
            KeyCode::Char('R') => gallery.reload(),
            KeyCode::Char('u') => self.switch_screen(AppScreen::Upload),
            KeyCode::Enter => {
                if let Some(route) = gallery.selected_route() {
                    self.open_feedback(route);
                }
            }
            _ => {}
        }
    }

    /// Screens that take free text swallow plain characters.
    fn is_typing(&self) -> bool {
        match self.current_screen {
            AppScreen::Upload => true,
            AppScreen::Gallery => false,
            AppScreen::Feedback => self.feedback.as_ref().is_some_and(|f| f.is_typing()),
        }
    }

    fn open_feedback(&mut self, route: FeedbackRoute) {
        tracing::info!(video_id = %route.video_id, "Opening feedback");
        self.switch_screen(AppScreen::Feedback);
        self.feedback = Some(FeedbackScreen::new(
            route,
            &self.settings,
            self.cancel.child_token(),
        ));
    }

    /// Switch to a different screen
    fn switch_screen(&mut self, screen: AppScreen) {
        if screen == self.current_screen {
            return;
        }

        // A feedback screen cannot be re-entered once left; its route is gone.
        let from = self.current_screen;
        self.leave(from);
        self.previous_screen = (from != AppScreen::Feedback).then_some(from);
        self.enter(screen);
    }

    fn enter(&mut self, screen: AppScreen) {
        if screen == AppScreen::Gallery && self.gallery.is_none() {
            self.gallery = Some(GalleryScreen::open(
                self.api.clone(),
                &self.settings,
                self.cancel.child_token(),
            ));
        }
        self.current_screen = screen;
    }

    /// Drop the state of the screen being left, abandoning its requests.
    fn leave(&mut self, screen: AppScreen) {
        match screen {
            AppScreen::Upload => {
                if self.upload.is_submitting() {
                    tracing::info!("Upload abandoned");
                    self.upload = UploadScreen::new(self.cancel.child_token());
                }
            }
            AppScreen::Gallery => self.gallery = None,
            AppScreen::Feedback => self.feedback = None,
        }
    }

    /// Handle back navigation
    pub fn handle_back(&mut self) {
        match self.previous_screen.take() {
            Some(prev) if prev != self.current_screen => {
                self.leave(self.current_screen);
                self.previous_screen = match prev {
                    AppScreen::Upload => None,
                    _ => Some(AppScreen::Upload),
                };
                self.enter(prev);
            }
            _ if self.current_screen != AppScreen::Upload => {
                self.leave(self.current_screen);
                self.enter(AppScreen::Upload);
            }
            _ => self.quit = true,
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Toggle help popup
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Apply results of background requests
    pub fn update(&mut self) {
        if let Some(route) = self.upload.poll() {
            tracing::info!(video_id = %route.video_id, "Upload analysed");
            if self.current_screen == AppScreen::Upload {
                self.open_feedback(route);
            }
        }

        if let Some(gallery) = self.gallery.as_mut() {
            gallery.poll();
        }
        if let Some(feedback) = self.feedback.as_mut() {
            feedback.poll();
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
