mod index;
mod not_found;
mod post;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, Screen};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.screen {
        Screen::Index => index::render(frame, app, chunks[1]),
        Screen::Post => post::render(frame, app, chunks[1]),
        Screen::NotFound => not_found::render(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.screen {
        Screen::Index => "byline - Posts".to_string(),
        Screen::Post => match &app.current_post {
            Some(view) => format!("byline - {}", view.post.title),
            None => "byline - Post".to_string(),
        },
        Screen::NotFound => "byline - Not found".to_string(),
    };

    let mut spans = vec![Span::styled(
        title,
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if app.preview.is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            " PREVIEW ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(error) = &app.error {
        Line::from(vec![Span::styled(
            format!("Error: {}", error),
            Style::default().fg(Color::Red),
        )])
    } else if app.loading() {
        Line::from(vec![Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )])
    } else {
        let help = match app.screen {
            Screen::Index => {
                let mut help = String::from("j/k: nav | Enter: read");
                if app.listing.has_more() {
                    help.push_str(" | m: more");
                }
                help.push_str(" | r: refresh | o: open | y: yank");
                if app.preview.is_some() {
                    help.push_str(" | x: exit preview");
                }
                help.push_str(" | q: quit");
                help
            }
            Screen::Post => {
                "j/k: scroll | p/n: prev/next post | c: comments | o: open | y: yank | q: back"
                    .to_string()
            }
            Screen::NotFound => "q: back".to_string(),
        };
        Line::from(vec![Span::styled(help, Style::default().fg(Color::Gray))])
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}
