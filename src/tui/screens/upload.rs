//! Upload screen - pick a file or URL and submit it for analysis

use crossterm::event::KeyCode;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::api::{VideoApi, VideoRecord};
use crate::flows::{FeedbackRoute, UploadFlow, UploadState};
use crate::tui::spawn_bound;
use crate::ClipcoachError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    File,
    Url,
}

/// Upload screen state
pub struct UploadScreen {
    flow: UploadFlow,
    file_input: String,
    focus: Field,
    pending: Option<oneshot::Receiver<crate::Result<VideoRecord>>>,
    cancel: CancellationToken,
}

impl UploadScreen {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            flow: UploadFlow::new(),
            file_input: String::new(),
            focus: Field::File,
            pending: None,
            cancel,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.flow.is_submitting()
    }

    pub fn handle_key(&mut self, key: KeyCode, api: &Arc<dyn VideoApi>) {
        if self.is_submitting() {
            return;
        }

        match key {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focus = match self.focus {
                    Field::File => Field::Url,
                    Field::Url => Field::File,
                };
            }
            KeyCode::Char(c) => match self.focus {
                Field::File => {
                    self.file_input.push(c);
                    self.sync_file();
                }
                Field::Url => self.flow.push_url_char(c),
            },
            KeyCode::Backspace => match self.focus {
                Field::File => {
                    self.file_input.pop();
                    self.sync_file();
                }
                Field::Url => self.flow.pop_url_char(),
            },
            KeyCode::Enter => self.submit(api),
            _ => {}
        }
    }

    fn sync_file(&mut self) {
        let trimmed = self.file_input.trim();
        let file = (!trimmed.is_empty()).then(|| PathBuf::from(trimmed));
        self.flow.set_file(file);
    }

    fn submit(&mut self, api: &Arc<dyn VideoApi>) {
        let Some(source) = self.flow.begin_submit() else {
            return;
        };

        let (tx, rx) = oneshot::channel();
        let api = api.clone();
        spawn_bound(&self.cancel, async move {
            let result = api.upload_video(&source).await;
            let _ = tx.send(result);
        });
        self.pending = Some(rx);
    }

    /// Pick up a finished upload. Returns the route to follow on success.
    pub fn poll(&mut self) -> Option<FeedbackRoute> {
        let rx = self.pending.as_mut()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return None,
            Err(oneshot::error::TryRecvError::Closed) => Err(ClipcoachError::Network(
                "upload task ended without a result".to_string(),
            )),
        };

        self.pending = None;
        self.flow.finish_submit(result);
        let route = self.flow.take_route();
        if route.is_some() {
            self.file_input.clear();
        }
        route
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // File
                Constraint::Length(3), // URL
                Constraint::Min(3),    // Status
                Constraint::Length(3), // Help
            ])
            .split(area);

        let title = Paragraph::new("Upload Your Clip")
            .style(Style::default().fg(Color::Cyan).bold())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::BOTTOM));
        frame.render_widget(title, chunks[0]);

        frame.render_widget(
            input_box(" Video File ", &self.file_input, self.focus == Field::File),
            chunks[1],
        );
        frame.render_widget(
            input_box(" Or Video URL ", self.flow.url(), self.focus == Field::Url),
            chunks[2],
        );

        let status = match (self.flow.state(), self.flow.error()) {
            (UploadState::Submitting, _) => Line::from(Span::styled(
                "Uploading and analysing... this can take several minutes",
                Style::default().fg(Color::Yellow),
            )),
            (_, Some(error)) => Line::from(Span::styled(error, Style::default().fg(Color::Red))),
            _ => Line::from(Span::styled(
                "Enter a file path or a URL, then press Enter",
                Style::default().fg(Color::DarkGray),
            )),
        };

        let status = Paragraph::new(status).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(" Status ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(status, chunks[3]);

        let help = Paragraph::new(Line::from(vec![
            Span::styled(" Tab ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw(" Switch field  "),
            Span::styled(" Enter ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw(" Upload  "),
            Span::styled(" Ctrl+G ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw(" Gallery  "),
            Span::styled(" Esc ", Style::default().fg(Color::Black).bg(Color::Cyan)),
            Span::raw(" Quit"),
        ]))
        .alignment(Alignment::Center);
        frame.render_widget(help, chunks[4]);
    }
}

impl Drop for UploadScreen {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn input_box<'a>(title: &'a str, value: &'a str, focused: bool) -> Paragraph<'a> {
    let (text, border) = if focused {
        (format!("{}█", value), Color::Yellow)
    } else {
        (value.to_string(), Color::Blue)
    };

    Paragraph::new(text).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border)),
    )
}
