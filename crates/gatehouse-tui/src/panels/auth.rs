//! Sign-in / sign-up panel.

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use super::render_utils::{button_span, field_line};
use crate::common::{Tasks, mask};
use crate::features::forms::{AuthFocus, AuthForm};

pub const TITLE: &str = "Sign in";

pub fn auth_panel_lines(form: &AuthForm, tasks: &Tasks, width: u16) -> Vec<Line<'static>> {
    let busy = tasks.auth_form_busy();
    let sign_in_label = if tasks.sign_in.is_running() {
        "Signing in..."
    } else {
        "Sign in"
    };
    let sign_up_label = if tasks.sign_up.is_running() {
        "Signing up..."
    } else {
        "Sign up"
    };

    vec![
        Line::from(Span::styled(
            "Sign in or create an account.",
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        field_line(
            "Email",
            form.email.value(),
            form.email.cursor(),
            form.focus == AuthFocus::Email,
            width,
        ),
        field_line(
            "Password",
            &mask(form.password.value()),
            form.password.cursor(),
            form.focus == AuthFocus::Password,
            width,
        ),
        Line::from(""),
        Line::from(vec![
            button_span(sign_in_label, form.focus == AuthFocus::SignIn, !busy),
            Span::raw("  "),
            button_span(sign_up_label, form.focus == AuthFocus::SignUp, !busy),
        ]),
        Line::from(""),
        Line::from(button_span(
            "Forgot password?",
            form.focus == AuthFocus::ForgotPassword,
            true,
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TaskId;

    fn plain(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_password_is_masked() {
        let mut form = AuthForm::default();
        form.email.set_text("ada@example.com");
        form.password.set_text("hunter2");

        let text = plain(&auth_panel_lines(&form, &Tasks::default(), 50)).join("\n");
        assert!(text.contains("ada@example.com"));
        assert!(text.contains("•••••••"));
        assert!(!text.contains("hunter2"));
    }

    #[test]
    fn test_busy_labels() {
        let form = AuthForm::default();
        let mut tasks = Tasks::default();
        tasks.sign_up.start(TaskId(1));

        let text = plain(&auth_panel_lines(&form, &tasks, 50)).join("\n");
        assert!(text.contains("[ Signing up... ]"));
        assert!(text.contains("[ Sign in ]"));
    }
}
