use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::{Notification, NotificationKind};

fn style_for(kind: NotificationKind) -> (&'static str, Color) {
    match kind {
        NotificationKind::Error => ("✗", Color::Red),
        NotificationKind::Success => ("✓", Color::Green),
        NotificationKind::Info => ("ℹ", Color::Cyan),
    }
}

/// Banner lines for a notification, wrapped to `width` columns.
pub fn notification_lines(notification: &Notification, width: u16) -> Vec<Line<'static>> {
    let (icon, color) = style_for(notification.kind);
    let text_width = usize::from(width.saturating_sub(2)).max(1);

    wrap_words(&notification.message, text_width)
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let prefix = if i == 0 { icon } else { " " };
            Line::from(vec![
                Span::styled(
                    format!("{prefix} "),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(chunk, Style::default().fg(color)),
            ])
        })
        .collect()
}

fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_error_banner_has_icon_and_message() {
        let notification = Notification {
            kind: NotificationKind::Error,
            message: "Invalid login credentials".to_string(),
            raised_at: Instant::now(),
        };
        let lines = notification_lines(&notification, 60);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "✗ Invalid login credentials");
    }

    #[test]
    fn test_long_message_wraps() {
        let notification = Notification {
            kind: NotificationKind::Success,
            message: "Password reset link sent. Check your email.".to_string(),
            raised_at: Instant::now(),
        };
        let lines = notification_lines(&notification, 22);
        assert!(lines.len() > 1);
        let joined: Vec<String> = lines
            .iter()
            .map(|l| line_text(l).chars().skip(2).collect())
            .collect();
        assert_eq!(
            joined.join(" "),
            "Password reset link sent. Check your email."
        );
    }
}
