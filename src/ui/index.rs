use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::types::format_date;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if app.listing.is_empty() && !app.loading() {
        let block = Block::default().borders(Borders::ALL).title(" Posts ");
        let empty = Paragraph::new("No posts published yet")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = app
        .listing
        .posts()
        .iter()
        .enumerate()
        .map(|(i, post)| {
            let selected = i == app.post_index;
            let title_style = if selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };

            let lines = vec![
                Line::from(Span::styled(truncate(&post.title, width), title_style)),
                Line::from(Span::styled(
                    truncate(&post.subtitle, width),
                    Style::default().fg(Color::Gray),
                )),
                Line::from(vec![
                    Span::styled(
                        format_date(post.first_publication_date),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw("  "),
                    Span::styled(
                        format!("@{}", post.author),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]),
                Line::default(),
            ];

            ListItem::new(lines)
        })
        .collect();

    let more = if app.listing.has_more() { "+" } else { "" };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Posts ({}{}) ", app.listing.len(), more)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.post_index));

    frame.render_stateful_widget(list, area, &mut state);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
