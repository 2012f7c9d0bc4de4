//! Gallery screen - browse analysed clips and their thumbnails

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::api::{FeedbackState, VideoApi, VideoRecord};
use crate::config::Settings;
use crate::flows::gallery::{display_filename, truncate_summary};
use crate::flows::{FeedbackRoute, Gallery, GalleryEvent, ThumbnailState, ThumbnailWorker};
use crate::tui::spawn_bound;
use crate::ClipcoachError;

/// Gallery screen state
pub struct GalleryScreen {
    api: Arc<dyn VideoApi>,
    settings: Settings,
    gallery: Gallery,
    state: ListState,
    loading: bool,
    pending: Option<oneshot::Receiver<crate::Result<Vec<VideoRecord>>>>,
    events: mpsc::UnboundedReceiver<GalleryEvent>,
    worker: ThumbnailWorker,
    cancel: CancellationToken,
}

impl GalleryScreen {
    /// Create the screen and start fetching the list.
    pub fn open(api: Arc<dyn VideoApi>, settings: &Settings, cancel: CancellationToken) -> Self {
        let (events_tx, events) = mpsc::unbounded_channel();
        let worker = ThumbnailWorker::spawn(api.clone(), settings, &cancel, events_tx);

        let mut screen = Self {
            api,
            settings: settings.clone(),
            gallery: Gallery::from_settings(settings),
            state: ListState::default(),
            loading: false,
            pending: None,
            events,
            worker,
            cancel,
        };
        screen.reload();
        screen
    }

    /// Fetch the list again. Jobs already queued keep running, but the
    /// gallery ignores what they report once the new list is loaded.
    pub fn reload(&mut self) {
        if self.loading {
            return;
        }

        let (tx, rx) = oneshot::channel();
        let api = self.api.clone();
        spawn_bound(&self.cancel, async move {
            let _ = tx.send(api.list_videos().await);
        });
        self.pending = Some(rx);
        self.loading = true;
    }

    /// Apply whatever finished since the last frame.
    pub fn poll(&mut self) {
        if let Some(rx) = self.pending.as_mut() {
            let result = match rx.try_recv() {
                Ok(result) => Some(result),
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => Some(Err(ClipcoachError::Network(
                    "list task ended without a result".to_string(),
                ))),
            };

            if let Some(result) = result {
                self.pending = None;
                self.loading = false;
                self.apply_list(result);
            }
        }

        while let Ok(event) = self.events.try_recv() {
            self.gallery.apply(event);
        }
    }

    fn apply_list(&mut self, result: crate::Result<Vec<VideoRecord>>) {
        match result {
            Ok(videos) => {
                let jobs = self.gallery.load(videos);
                self.worker.request_all(jobs);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load videos");
                self.gallery.load_failed();
            }
        }

        let len = self.gallery.videos().len();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            Some(_) => {}
        }
    }

    pub fn next(&mut self) {
        let len = self.gallery.videos().len();
        if len == 0 {
            return;
        }

        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.gallery.videos().len();
        if len == 0 {
            return;
        }

        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn selected(&self) -> Option<&VideoRecord> {
        self.state
            .selected()
            .and_then(|i| self.gallery.videos().get(i))
    }

    /// Route to the feedback view for the selected clip
    pub fn selected_route(&self) -> Option<FeedbackRoute> {
        self.selected().map(|record| FeedbackRoute {
            video_id: record.video_id.clone(),
            state: FeedbackState::from_record(record),
        })
    }

    /// Queue another generation attempt for the selected clip.
    pub fn retry_selected(&mut self) {
        let Some(video_id) = self.selected().map(|r| r.video_id.clone()) else {
            return;
        };
        if let Some(job) = self.gallery.retry(&video_id) {
            self.worker.request(job);
        }
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),    // List
                Constraint::Length(3), // Help
            ])
            .split(area);

        let block = Block::default()
            .title(format!(" Your Clips ({}) ", self.gallery.videos().len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Blue));

        if let Some(error) = self.gallery.error() {
            let error = Paragraph::new(Span::styled(error, Style::default().fg(Color::Red)))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(error, chunks[0]);
        } else if self.gallery.videos().is_empty() {
            let text = if self.loading {
                "Loading videos..."
            } else {
                "No videos available. Upload a clip to get started!"
            };
            let empty = Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)))
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, chunks[0]);
        } else {
            let words = self.settings.gallery.summary_words;
            let items: Vec<ListItem> = self
                .gallery
                .videos()
                .iter()
                .map(|record| {
                    let thumbnail = self.gallery.thumbnail(&record.video_id);
                    let (indicator, color) = thumbnail_indicator(&thumbnail);

                    ListItem::new(vec![
                        Line::from(vec![
                            Span::styled(indicator, Style::default().fg(color)),
                            Span::raw(" "),
                            Span::styled(
                                display_filename(&record.filename),
                                Style::default().fg(Color::White).bold(),
                            ),
                            Span::raw("  "),
                            Span::styled(thumbnail.label().to_string(), Style::default().fg(color)),
                        ]),
                        Line::from(Span::styled(
                            format!("  {}", truncate_summary(&record.summary, words)),
                            Style::default().fg(Color::DarkGray),
                        )),
                    ])
                })
                .collect();

            let list = List::new(items)
                .block(block)
                .highlight_style(
                    Style::default()
                        .bg(Color::DarkGray)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("▶ ");

            frame.render_stateful_widget(list, chunks[0], &mut self.state);
        }

        let help = Paragraph::new(Line::from(vec![
            Span::styled(" ↑/↓ ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw(" Navigate  "),
            Span::styled(" Enter ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw(" Feedback  "),
            Span::styled(" r ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw(" Retry thumbnail  "),
            Span::styled(" R ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw(" Reload  "),
            Span::styled(" Esc ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw(" Back"),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(help, chunks[1]);
    }
}

impl Drop for GalleryScreen {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn thumbnail_indicator(state: &ThumbnailState) -> (&'static str, Color) {
    match state {
        ThumbnailState::NotRequested => ("○", Color::DarkGray),
        ThumbnailState::Loading => ("◐", Color::Yellow),
        ThumbnailState::Ready(_) => ("✓", Color::Green),
        ThumbnailState::Failed(_) => ("✗", Color::Red),
    }
}
