//! Signed-in account panel.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use super::render_utils::button_span;
use crate::common::truncate_with_ellipsis;

pub const TITLE: &str = "Account";

pub fn account_panel_lines(email: &str, signing_out: bool, width: u16) -> Vec<Line<'static>> {
    let label = if signing_out {
        "Signing out..."
    } else {
        "Sign out"
    };
    let email = if email.is_empty() {
        "(no email on record)".to_string()
    } else {
        truncate_with_ellipsis(email, usize::from(width))
    };

    vec![
        Line::from(Span::styled(
            "You are signed in",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(email, Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(button_span(label, true, !signing_out)),
    ]
}
