//! Pure view/render functions for the TUI.
//!
//! This module contains all rendering logic. Functions here:
//! - Take `&AppState` by immutable reference
//! - Draw to a ratatui Frame
//! - Never mutate state or return effects

use gatehouse_core::auth::Session;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::common::{TaskKind, truncate_with_ellipsis};
use crate::features::notification::notification_lines;
use crate::features::session::View;
use crate::panels::render_utils::{calculate_card_area, render_card_container, render_hints};
use crate::panels::{self, InputHint};
use crate::state::AppState;

const HEADER_HEIGHT: u16 = 1;
const HINTS_HEIGHT: u16 = 1;
const CARD_WIDTH: u16 = 56;
/// Longest message wraps to at most this many banner rows.
const MAX_BANNER_LINES: usize = 3;

/// The one panel on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel<'a> {
    Auth,
    Account { email: &'a str },
    PasswordReset,
}

/// Picks the panel from session presence and the view selector.
///
/// A session always means `Account`; without one the selector chooses
/// between `Auth` and `PasswordReset`.
pub fn select_panel(session: Option<&Session>, view: View) -> Panel<'_> {
    match (session, view) {
        (Some(session), _) => Panel::Account {
            email: session.email(),
        },
        (None, View::PasswordReset) => Panel::PasswordReset,
        (None, View::Auth | View::Account) => Panel::Auth,
    }
}

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();

    let banner: Vec<Line<'static>> = app
        .notification
        .current()
        .map(|n| {
            let mut lines = notification_lines(n, area.width.saturating_sub(2));
            lines.truncate(MAX_BANNER_LINES);
            lines
        })
        .unwrap_or_default();
    let banner_height = banner.len() as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(banner_height),
            Constraint::Length(HINTS_HEIGHT),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(header_line(app, area.width)), chunks[0]);

    let panel = select_panel(app.session.session(), app.session.view());
    render_panel(app, panel, frame, chunks[1]);

    if banner_height > 0 {
        let banner_area = Rect::new(
            chunks[2].x + 1,
            chunks[2].y,
            chunks[2].width.saturating_sub(2),
            chunks[2].height,
        );
        frame.render_widget(Paragraph::new(banner), banner_area);
    }

    render_hints(frame, chunks[3], panel_hints(panel), Color::Cyan);
}

fn render_panel(app: &AppState, panel: Panel<'_>, frame: &mut Frame, area: Rect) {
    let inner_width = CARD_WIDTH.saturating_sub(4);
    let (title, border_color, lines) = match panel {
        Panel::Auth => (
            panels::auth::TITLE,
            Color::Cyan,
            panels::auth_panel_lines(&app.auth_form, &app.tasks, inner_width),
        ),
        Panel::Account { email } => (
            panels::account::TITLE,
            Color::Green,
            panels::account_panel_lines(
                email,
                app.tasks.state(TaskKind::SignOut).is_running(),
                inner_width,
            ),
        ),
        Panel::PasswordReset => (
            panels::password_reset::TITLE,
            Color::Yellow,
            panels::reset_panel_lines(
                &app.reset_form,
                app.tasks.state(TaskKind::PasswordReset).is_running(),
                inner_width,
            ),
        ),
    };

    let card_height = lines.len() as u16 + 2;
    let card = calculate_card_area(area, CARD_WIDTH, card_height);
    let inner = render_card_container(frame, card, title, border_color);
    frame.render_widget(Paragraph::new(lines), inner);
}

fn panel_hints(panel: Panel<'_>) -> &'static [InputHint<'static>] {
    match panel {
        Panel::Auth => panels::AUTH_HINTS,
        Panel::Account { .. } => panels::ACCOUNT_HINTS,
        Panel::PasswordReset => panels::RESET_HINTS,
    }
}

/// "gatehouse · <backend>" plus a status note while the startup query runs.
fn header_line(app: &AppState, width: u16) -> Line<'static> {
    let mut spans = vec![Span::styled(
        " gatehouse",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if !app.options.backend_label.is_empty() {
        let label_width = usize::from(width).saturating_sub(14);
        spans.push(Span::styled(" · ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            truncate_with_ellipsis(&app.options.backend_label, label_width),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if app.tasks.state(TaskKind::SessionQuery).is_running() {
        spans.push(Span::styled(
            "  checking session...",
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}
