//! Password reset request panel.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use super::render_utils::{button_span, field_line};
use crate::features::forms::{ResetFocus, ResetForm};

pub const TITLE: &str = "Reset password";

pub fn reset_panel_lines(form: &ResetForm, sending: bool, width: u16) -> Vec<Line<'static>> {
    let send_label = if sending {
        "Sending..."
    } else {
        "Send reset link"
    };

    vec![
        Line::from(Span::styled(
            "We'll email you a link to choose a new password.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        field_line(
            "Email",
            form.email.value(),
            form.email.cursor(),
            form.focus == ResetFocus::Email,
            width,
        ),
        Line::from(""),
        Line::from(vec![
            button_span(send_label, form.focus == ResetFocus::Send, !sending),
            Span::raw("  "),
            button_span("Back to sign in", form.focus == ResetFocus::Back, true),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sending_label_disables_button() {
        let form = ResetForm {
            focus: ResetFocus::Send,
            ..ResetForm::default()
        };
        let lines = reset_panel_lines(&form, true, 50);
        let buttons = &lines[4].spans;
        assert_eq!(buttons[0].content, "[ Sending... ]");
        assert_eq!(buttons[0].style.fg, Some(Color::DarkGray));
        assert_eq!(buttons[2].content, "[ Back to sign in ]");
    }
}
