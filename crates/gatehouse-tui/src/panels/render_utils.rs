use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use unicode_width::UnicodeWidthChar;

use crate::common::truncate_start_with_ellipsis;

/// Width of the label column in front of a text field.
const LABEL_WIDTH: usize = 10;

/// Calculates the area for a card, centered horizontally and vertically
/// within `area`.
pub fn calculate_card_area(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));

    let card_x = area.x + (area.width.saturating_sub(width)) / 2;
    let card_y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(card_x, card_y, width, height)
}

/// Renders the card container (clears background, draws border and title)
/// and returns the padded inner area.
pub fn render_card_container(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    border_color: Color,
) -> Rect {
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {title} "))
        .title_style(
            Style::default()
                .fg(border_color)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_widget(block, area);

    Rect::new(
        area.x + 2,
        area.y + 1,
        area.width.saturating_sub(4),
        area.height.saturating_sub(2),
    )
}

/// Helper struct for keyboard hints.
pub struct InputHint<'a> {
    pub key: &'a str,
    pub action: &'a str,
}

impl<'a> InputHint<'a> {
    pub const fn new(key: &'a str, action: &'a str) -> Self {
        Self { key, action }
    }
}

pub fn hints_line(hints: &[InputHint<'_>], highlight_color: Color) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" • ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(
            hint.key.to_string(),
            Style::default().fg(highlight_color),
        ));
        spans.push(Span::styled(
            format!(" {}", hint.action),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

/// Renders a line of keyboard hints on the last row of `area`.
pub fn render_hints(
    frame: &mut Frame,
    area: Rect,
    hints: &[InputHint<'_>],
    highlight_color: Color,
) {
    if area.height == 0 {
        return;
    }
    let hints_y = area.y + area.height.saturating_sub(1);
    let hints_area = Rect::new(area.x, hints_y, area.width, 1);

    let para = Paragraph::new(hints_line(hints, highlight_color)).alignment(Alignment::Center);
    frame.render_widget(para, hints_area);
}

/// A labelled single-line field: "Email     ada@example.com█".
///
/// When focused, the visible window follows the cursor and the character
/// under it is drawn reversed (or a block at the end of the text).
pub fn field_line(
    label: &str,
    text: &str,
    cursor: usize,
    focused: bool,
    width: u16,
) -> Line<'static> {
    let label_style = if focused {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let text_style = Style::default().fg(Color::White);
    let available = usize::from(width).saturating_sub(LABEL_WIDTH).max(1);

    let mut spans = vec![Span::styled(format!("{label:<LABEL_WIDTH$}"), label_style)];

    if !focused {
        let shown = if text.is_empty() {
            Span::styled("·".repeat(available.min(20)), Style::default().fg(Color::DarkGray))
        } else {
            Span::styled(truncate_start_with_ellipsis(text, available), text_style)
        };
        spans.push(shown);
        return Line::from(spans);
    }

    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());
    let (start, end) = cursor_window(&chars, cursor, available);

    let before: String = chars[start..cursor].iter().collect();
    spans.push(Span::styled(before, text_style));
    if cursor < chars.len() {
        spans.push(Span::styled(
            chars[cursor].to_string(),
            text_style.add_modifier(Modifier::REVERSED),
        ));
        let after: String = chars[cursor + 1..end].iter().collect();
        spans.push(Span::styled(after, text_style));
    } else {
        spans.push(Span::styled("█", Style::default().fg(Color::Cyan)));
    }
    Line::from(spans)
}

fn char_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

/// Char range `[start, end)` around `cursor` that fits in `columns` display
/// columns. The cell under the cursor (a block past the end) always shows.
fn cursor_window(chars: &[char], cursor: usize, columns: usize) -> (usize, usize) {
    let cursor_width = chars.get(cursor).map_or(1, |&ch| char_width(ch));
    let mut used = cursor_width;

    let mut start = cursor;
    while start > 0 && used + char_width(chars[start - 1]) <= columns {
        start -= 1;
        used += char_width(chars[start]);
    }

    let mut end = (cursor + 1).min(chars.len());
    while end < chars.len() && used + char_width(chars[end]) <= columns {
        used += char_width(chars[end]);
        end += 1;
    }
    (start, end)
}

/// A "[ Label ]" button. Disabled buttons are dimmed and never highlighted.
pub fn button_span(label: &str, focused: bool, enabled: bool) -> Span<'static> {
    let style = if !enabled {
        Style::default().fg(Color::DarkGray)
    } else if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    Span::styled(format!("[ {label} ]"), style)
}
