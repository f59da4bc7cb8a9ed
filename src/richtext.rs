use std::collections::BTreeSet;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use serde::Deserialize;

/// Structured rich-text body: typed blocks of text carrying character-offset
/// style marks. Parsed straight from the content API's JSON and rendered
/// through span composition, so no markup string ever reaches the UI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<WireBlock>")]
pub struct RichText {
    blocks: Vec<Block>,
}

#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
    pub marks: Vec<MarkSpan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    ListItem,
    OrderedListItem,
    Preformatted,
    Image {
        url: Option<String>,
        alt: Option<String>,
    },
}

/// A style mark over `[start, end)` in character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkSpan {
    pub start: usize,
    pub end: usize,
    pub mark: Mark,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Strong,
    Em,
    Hyperlink(String),
}

impl RichText {
    /// A single unstyled paragraph.
    pub fn paragraph(text: &str) -> Self {
        Self {
            blocks: vec![Block {
                kind: BlockKind::Paragraph,
                text: text.to_string(),
                marks: Vec::new(),
            }],
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block texts joined with spaces; feeds word counts.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Render the body as terminal lines. Blocks are separated by a blank
    /// line, except inside a run of list items.
    pub fn lines(&self) -> Vec<Line<'static>> {
        let mut out = Vec::new();
        let mut ordinal = 0u32;
        let mut blocks = self.blocks.iter().peekable();

        while let Some(block) = blocks.next() {
            if block.kind != BlockKind::OrderedListItem {
                ordinal = 0;
            }

            match &block.kind {
                BlockKind::Paragraph => {
                    out.push(Line::from(styled_spans(
                        &block.text,
                        &block.marks,
                        Style::default(),
                    )));
                }
                BlockKind::Heading(_) => {
                    out.push(Line::from(styled_spans(
                        &block.text,
                        &block.marks,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    )));
                }
                BlockKind::ListItem => {
                    let mut spans = vec![Span::raw("  • ")];
                    spans.extend(styled_spans(&block.text, &block.marks, Style::default()));
                    out.push(Line::from(spans));
                }
                BlockKind::OrderedListItem => {
                    ordinal += 1;
                    let mut spans = vec![Span::raw(format!("  {}. ", ordinal))];
                    spans.extend(styled_spans(&block.text, &block.marks, Style::default()));
                    out.push(Line::from(spans));
                }
                BlockKind::Preformatted => {
                    for text_line in block.text.lines() {
                        out.push(Line::from(Span::styled(
                            format!("    {}", text_line),
                            Style::default().fg(Color::Gray),
                        )));
                    }
                }
                BlockKind::Image { url, alt } => {
                    let label = alt
                        .as_deref()
                        .filter(|a| !a.is_empty())
                        .or(url.as_deref())
                        .unwrap_or("image");
                    out.push(Line::from(Span::styled(
                        format!("[image: {}]", label),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
            }

            let in_list_run = matches!(
                block.kind,
                BlockKind::ListItem | BlockKind::OrderedListItem
            ) && matches!(
                blocks.peek().map(|b| &b.kind),
                Some(BlockKind::ListItem | BlockKind::OrderedListItem)
            );
            if blocks.peek().is_some() && !in_list_run {
                out.push(Line::default());
            }
        }

        out
    }
}

/// Cut `text` at every mark boundary and style each segment with the marks
/// covering it. Offsets are character-based, so multibyte text is cut safely.
fn styled_spans(text: &str, marks: &[MarkSpan], base: Style) -> Vec<Span<'static>> {
    if marks.is_empty() {
        return vec![Span::styled(text.to_string(), base)];
    }

    let chars: Vec<char> = text.chars().collect();
    let mut bounds = BTreeSet::from([0, chars.len()]);
    for mark in marks {
        bounds.insert(mark.start.min(chars.len()));
        bounds.insert(mark.end.min(chars.len()));
    }

    let cuts: Vec<usize> = bounds.into_iter().collect();
    let mut out = Vec::new();
    for window in cuts.windows(2) {
        let (start, end) = (window[0], window[1]);
        if start >= end {
            continue;
        }
        let mut style = base;
        for mark in marks {
            if mark.start <= start && mark.end >= end {
                style = match &mark.mark {
                    Mark::Strong => style.add_modifier(Modifier::BOLD),
                    Mark::Em => style.add_modifier(Modifier::ITALIC),
                    Mark::Hyperlink(_) => style
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                };
            }
        }
        out.push(Span::styled(chars[start..end].iter().collect::<String>(), style));
    }
    out
}

// Wire shape of the API's rich-text field.

#[derive(Deserialize)]
struct WireBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    spans: Vec<WireSpan>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    alt: Option<String>,
}

#[derive(Deserialize)]
struct WireSpan {
    start: usize,
    end: usize,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<WireSpanData>,
}

#[derive(Deserialize)]
struct WireSpanData {
    #[serde(default)]
    url: Option<String>,
}

impl From<Vec<WireBlock>> for RichText {
    fn from(wire: Vec<WireBlock>) -> Self {
        let blocks = wire
            .into_iter()
            .map(|b| {
                let kind = match b.kind.as_str() {
                    "heading1" => BlockKind::Heading(1),
                    "heading2" => BlockKind::Heading(2),
                    "heading3" => BlockKind::Heading(3),
                    "heading4" => BlockKind::Heading(4),
                    "heading5" => BlockKind::Heading(5),
                    "heading6" => BlockKind::Heading(6),
                    "list-item" => BlockKind::ListItem,
                    "o-list-item" => BlockKind::OrderedListItem,
                    "preformatted" => BlockKind::Preformatted,
                    "image" => BlockKind::Image {
                        url: b.url,
                        alt: b.alt,
                    },
                    // Unknown block types degrade to plain paragraphs.
                    _ => BlockKind::Paragraph,
                };
                let marks = b
                    .spans
                    .into_iter()
                    .filter_map(|s| {
                        let mark = match s.kind.as_str() {
                            "strong" => Mark::Strong,
                            "em" => Mark::Em,
                            "hyperlink" => Mark::Hyperlink(s.data.and_then(|d| d.url)?),
                            _ => return None,
                        };
                        Some(MarkSpan {
                            start: s.start,
                            end: s.end,
                            mark,
                        })
                    })
                    .collect();
                Block {
                    kind,
                    text: b.text,
                    marks,
                }
            })
            .collect();
        Self { blocks }
    }
}
