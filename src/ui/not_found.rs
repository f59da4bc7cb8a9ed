use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let slug = app.missing_slug.as_deref().unwrap_or("unknown");

    let lines = vec![
        Line::default(),
        Line::from(Span::styled(
            "This post does not exist.",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(vec![
            Span::raw("Nothing was published under "),
            Span::styled(format!("\"{}\"", slug), Style::default().fg(Color::Yellow)),
            Span::raw("."),
        ]),
        Line::default(),
        Line::from(Span::styled(
            "It may have been removed, or the link is stale.",
            Style::default().fg(Color::Gray),
        )),
    ];

    let body = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Not found "));
    frame.render_widget(body, area);
}
