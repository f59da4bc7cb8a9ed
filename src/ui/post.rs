use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::app::App;
use crate::types::{format_date, format_datetime, PostView};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(view) = &app.current_post else {
        let block = Block::default().borders(Borders::ALL).title(" Post ");
        let empty = Paragraph::new("Loading post...")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    };

    let head = header_lines(view);
    let has_nav = view.previous.is_some() || view.next.is_some();

    let mut constraints = vec![
        Constraint::Length(head.len() as u16 + 2),
        Constraint::Min(0),
    ];
    if has_nav {
        constraints.push(Constraint::Length(4));
    }
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let header = Paragraph::new(head)
        .block(Block::default().borders(Borders::ALL).title(" Post "));
    frame.render_widget(header, chunks[0]);

    render_body(frame, app, view, chunks[1]);

    if has_nav {
        render_nav(frame, view, chunks[2]);
    }
}

fn header_lines(view: &PostView) -> Vec<Line<'static>> {
    let post = &view.post;

    let mut lines = vec![
        Line::from(Span::styled(
            post.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(
                format_date(post.first_publication_date),
                Style::default().fg(Color::Gray),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("@{}", post.author),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(" | "),
            Span::styled(
                format!("{} min read", post.reading_minutes()),
                Style::default().fg(Color::Gray),
            ),
        ]),
    ];

    if post.edited() {
        if let Some(last) = post.last_publication_date {
            lines.push(Line::from(Span::styled(
                format!("* edited {}", format_datetime(last)),
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )));
        }
    }

    if let Some(url) = &post.banner_url {
        lines.push(Line::from(Span::styled(
            format!("[banner: {}]", url),
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines
}

fn render_body(frame: &mut Frame, app: &App, view: &PostView, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for section in &view.post.sections {
        if !section.heading.is_empty() {
            lines.push(Line::from(Span::styled(
                section.heading.clone(),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::default());
        }
        lines.extend(section.body.lines());
        lines.push(Line::default());
    }

    let max_scroll = lines.len().saturating_sub(1);
    let scroll_offset = app.scroll_offset.min(max_scroll);

    let visible: Vec<Line> = lines.into_iter().skip(scroll_offset).collect();

    // Clear the area first to prevent artifacts
    frame.render_widget(Clear, area);

    let body = Paragraph::new(Text::from(visible))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" Article "));

    frame.render_widget(body, area);
}

fn render_nav(frame: &mut Frame, view: &PostView, area: Rect) {
    let mut lines = Vec::new();
    if let Some(previous) = &view.previous {
        lines.push(Line::from(vec![
            Span::styled("p: ", Style::default().fg(Color::Gray)),
            Span::raw("« "),
            Span::styled(
                previous.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]));
    }
    if let Some(next) = &view.next {
        lines.push(Line::from(vec![
            Span::styled("n: ", Style::default().fg(Color::Gray)),
            Span::styled(
                next.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" »"),
        ]));
    }

    let nav = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" More posts "));
    frame.render_widget(nav, area);
}
