//! Help popup widget

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::tui::AppScreen;

/// Help popup that shows keyboard shortcuts
pub struct HelpPopup;

impl HelpPopup {
    pub fn draw(frame: &mut Frame, area: Rect, screen: AppScreen) {
        let popup_area = centered(area, 60, 70);

        // Clear the area behind the popup
        frame.render_widget(Clear, popup_area);

        let (title, bindings) = Self::bindings(screen);
        let mut text = vec![
            Line::from(Span::styled(title, Style::default().fg(Color::Cyan).bold())),
            Line::from(""),
        ];
        text.extend(bindings.iter().map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("{:<8}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ])
        }));
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(Color::DarkGray),
        )));

        let help = Paragraph::new(text).wrap(Wrap { trim: true }).block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .style(Style::default().bg(Color::Black)),
        );

        frame.render_widget(help, popup_area);
    }

    fn bindings(screen: AppScreen) -> (&'static str, &'static [(&'static str, &'static str)]) {
        match screen {
            AppScreen::Upload => (
                "Upload Shortcuts",
                &[
                    ("Tab", "Switch between file and URL"),
                    ("Enter", "Upload and analyse"),
                    ("Ctrl+G", "Open gallery"),
                    ("F1", "Show this help"),
                    ("Esc", "Quit"),
                ],
            ),
            AppScreen::Gallery => (
                "Gallery Shortcuts",
                &[
                    ("↑/k", "Move up"),
                    ("↓/j", "Move down"),
                    ("Enter", "View feedback"),
                    ("r", "Retry failed thumbnail"),
                    ("R", "Reload videos"),
                    ("u", "Upload a clip"),
                    ("?", "Show this help"),
                    ("Esc", "Go back"),
                ],
            ),
            AppScreen::Feedback => (
                "Feedback Shortcuts",
                &[
                    ("Tab", "Switch Feedback / Follow Up"),
                    ("↑/↓", "Scroll feedback"),
                    ("PgUp", "Page up"),
                    ("PgDn", "Page down"),
                    ("Enter", "Send follow-up question"),
                    ("Ctrl+G", "Open gallery"),
                    ("F1", "Show this help"),
                    ("Esc", "Go back"),
                ],
            ),
        }
    }
}

/// Rectangle centred in `area` covering the given percentages
fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = (u32::from(area.height) * u32::from(percent_y) / 100) as u16;

    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
