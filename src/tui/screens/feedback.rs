//! Feedback screen - analysis of one clip and the follow-up chat

use crossterm::event::KeyCode;
use ratatui::{
    prelude::*,
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState, Tabs, Wrap,
    },
};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::api::{ChatTurn, VideoApi};
use crate::config::Settings;
use crate::flows::{FeedbackRoute, FeedbackView, Tab, EMPTY_FEEDBACK_MESSAGE};
use crate::tui::spawn_bound;
use crate::ClipcoachError;

/// Feedback screen state
pub struct FeedbackScreen {
    view: FeedbackView,
    video_url: Option<String>,
    show_times: bool,
    scroll_offset: usize,
    content_height: usize,
    pending: Option<oneshot::Receiver<crate::Result<Vec<ChatTurn>>>>,
    cancel: CancellationToken,
}

impl FeedbackScreen {
    pub fn new(route: FeedbackRoute, settings: &Settings, cancel: CancellationToken) -> Self {
        let view = FeedbackView::from_route(route);
        let video_url = view.video_url(settings.base_url());

        Self {
            view,
            video_url,
            show_times: settings.tui.show_chapter_times,
            scroll_offset: 0,
            content_height: 0,
            pending: None,
            cancel,
        }
    }

    /// True while the chat input should receive plain characters
    pub fn is_typing(&self) -> bool {
        self.view.tab() == Tab::FollowUp && !self.view.is_empty()
    }

    pub fn handle_key(&mut self, key: KeyCode, api: &Arc<dyn VideoApi>) {
        if key == KeyCode::Tab || key == KeyCode::BackTab {
            let tab = self.view.tab().toggled();
            self.view.select_tab(tab);
            return;
        }

        match self.view.tab() {
            Tab::Feedback => match key {
                KeyCode::Up | KeyCode::Char('k') => self.scroll_up(),
                KeyCode::Down | KeyCode::Char('j') => self.scroll_down(),
                KeyCode::PageUp => {
                    self.scroll_offset = self.scroll_offset.saturating_sub(10);
                }
                KeyCode::PageDown => {
                    self.scroll_offset =
                        (self.scroll_offset + 10).min(self.content_height.saturating_sub(1));
                }
                KeyCode::Home | KeyCode::Char('g') => self.scroll_offset = 0,
                _ => {}
            },
            Tab::FollowUp if !self.view.is_empty() => match key {
                KeyCode::Char(c) => self.view.chat_mut().push_char(c),
                KeyCode::Backspace => self.view.chat_mut().pop_char(),
                KeyCode::Enter => self.send(api),
                _ => {}
            },
            Tab::FollowUp => {}
        }
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    fn scroll_down(&mut self) {
        if self.scroll_offset < self.content_height.saturating_sub(1) {
            self.scroll_offset += 1;
        }
    }

    fn send(&mut self, api: &Arc<dyn VideoApi>) {
        let Some(request) = self.view.chat_mut().begin_submit() else {
            return;
        };

        let (tx, rx) = oneshot::channel();
        let api = api.clone();
        spawn_bound(&self.cancel, async move {
            let result = api
                .send_chat_message(&request.video_id, &request.message, &request.summary)
                .await;
            let _ = tx.send(result);
        });
        self.pending = Some(rx);
    }

    /// Apply a chat reply that arrived since the last frame.
    pub fn poll(&mut self) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => Err(ClipcoachError::Network(
                "chat task ended without a result".to_string(),
            )),
        };

        self.pending = None;
        self.view.chat_mut().finish_submit(result);
    }

    pub fn draw(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tabs
                Constraint::Length(3), // Video
                Constraint::Min(5),    // Body
                Constraint::Length(3), // Help
            ])
            .split(area);

        let titles = [Tab::Feedback, Tab::FollowUp].map(|t| t.title());
        let selected = match self.view.tab() {
            Tab::Feedback => 0,
            Tab::FollowUp => 1,
        };
        let tabs = Tabs::new(titles)
            .select(selected)
            .block(Block::default().borders(Borders::ALL).title(" Clip Feedback "))
            .style(Style::default().fg(Color::DarkGray))
            .highlight_style(Style::default().fg(Color::Cyan).bold());
        frame.render_widget(tabs, chunks[0]);

        let video = match &self.video_url {
            Some(url) => Span::styled(url.as_str(), Style::default().fg(Color::Blue)),
            None => Span::styled("No video", Style::default().fg(Color::DarkGray)),
        };
        let video = Paragraph::new(Line::from(video))
            .block(Block::default().borders(Borders::ALL).title(" Video "));
        frame.render_widget(video, chunks[1]);

        if self.view.is_empty() {
            let empty = Paragraph::new(Span::styled(
                EMPTY_FEEDBACK_MESSAGE,
                Style::default().fg(Color::DarkGray),
            ))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL));
            frame.render_widget(empty, chunks[2]);
        } else {
            match self.view.tab() {
                Tab::Feedback => self.draw_feedback(frame, chunks[2]),
                Tab::FollowUp => self.draw_follow_up(frame, chunks[2]),
            }
        }

        let help = match self.view.tab() {
            Tab::Feedback => Line::from(vec![
                Span::styled(" Tab ", Style::default().fg(Color::Black).bg(Color::Cyan)),
                Span::raw(" Follow Up  "),
                Span::styled(" ↑/↓ ", Style::default().fg(Color::Black).bg(Color::Cyan)),
                Span::raw(" Scroll  "),
                Span::styled(" Esc ", Style::default().fg(Color::Black).bg(Color::Cyan)),
                Span::raw(" Back"),
            ]),
            Tab::FollowUp => Line::from(vec![
                Span::styled(" Tab ", Style::default().fg(Color::Black).bg(Color::Cyan)),
                Span::raw(" Feedback  "),
                Span::styled(" Enter ", Style::default().fg(Color::Black).bg(Color::Cyan)),
                Span::raw(" Send  "),
                Span::styled(" Esc ", Style::default().fg(Color::Black).bg(Color::Cyan)),
                Span::raw(" Back"),
            ]),
        };
        frame.render_widget(Paragraph::new(help).alignment(Alignment::Center), chunks[3]);
    }

    fn draw_feedback(&mut self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();

        for section in self.view.sections(self.show_times) {
            lines.push(Line::from(Span::styled(
                section.title,
                Style::default().fg(Color::Cyan).bold(),
            )));
            if section.items.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("  {}", section.empty),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            for item in section.items {
                lines.push(Line::from(vec![
                    Span::styled("  • ", Style::default().fg(Color::Yellow)),
                    Span::raw(item),
                ]));
            }
            lines.push(Line::from(""));
        }

        self.content_height = lines.len();
        self.scroll_offset = self.scroll_offset.min(self.content_height.saturating_sub(1));

        let body = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll_offset as u16, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Blue)),
            );
        frame.render_widget(body, area);

        let visible_height = area.height.saturating_sub(2) as usize;
        if self.content_height > visible_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));
            let mut scrollbar_state = ScrollbarState::new(self.content_height)
                .position(self.scroll_offset)
                .viewport_content_length(visible_height);
            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn draw_follow_up(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Transcript
                Constraint::Length(3), // Input
            ])
            .split(area);

        let chat = self.view.chat();
        let mut lines: Vec<Line> = Vec::new();
        if chat.transcript().is_empty() {
            lines.push(Line::from(Span::styled(
                "AI responses will appear here...",
                Style::default().fg(Color::DarkGray),
            )));
        }
        for turn in chat.transcript() {
            lines.push(Line::from(vec![
                Span::styled("You: ", Style::default().fg(Color::Yellow).bold()),
                Span::raw(turn.user.as_str()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Coach: ", Style::default().fg(Color::Cyan).bold()),
                Span::raw(turn.ai.as_str()),
            ]));
            lines.push(Line::from(""));
        }
        if chat.is_pending() {
            lines.push(Line::from(Span::styled(
                "Waiting for a reply...",
                Style::default().fg(Color::Yellow),
            )));
        }
        if let Some(error) = chat.error() {
            lines.push(Line::from(Span::styled(error, Style::default().fg(Color::Red))));
        }

        // Keep the newest lines in view
        let visible = chunks[0].height.saturating_sub(2) as usize;
        let offset = lines.len().saturating_sub(visible);

        let transcript = Paragraph::new(lines)
            .scroll((offset as u16, 0))
            .block(
                Block::default()
                    .title(" Conversation ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Blue)),
            );
        frame.render_widget(transcript, chunks[0]);

        let input = Paragraph::new(format!("{}█", chat.input())).block(
            Block::default()
                .title(" Ask about your clip ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(input, chunks[1]);
    }
}

impl Drop for FeedbackScreen {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
