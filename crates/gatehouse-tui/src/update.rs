//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use std::time::Instant;

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use gatehouse_core::auth::{AuthError, Session, SessionChange, SignUpOutcome};
use tracing::{debug, info, warn};

use crate::common::{TaskId, TaskKind};
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::features::forms::{AuthFormAction, ResetFocus, ResetFormAction};
use crate::features::session::View;
use crate::render::{Panel, select_panel};
use crate::state::AppState;

pub const RESET_SENT_MESSAGE: &str = "Password reset link sent. Check your email.";
pub const SIGNED_OUT_MESSAGE: &str = "You have been signed out.";

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Started => {
            let task = start_task(app, TaskKind::SessionQuery);
            vec![UiEffect::LoadSession { task }]
        }
        UiEvent::Tick => {
            app.notification.expire(Instant::now());
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(app, term_event),
        UiEvent::SessionChanged(change) => {
            handle_session_changed(app, change);
            vec![]
        }
        UiEvent::SessionLoaded(result) => {
            handle_session_loaded(app, result);
            vec![]
        }
        UiEvent::SignInFinished(result) => {
            match result {
                Ok(()) => app.auth_form.password.clear(),
                Err(err) => report_failure(app, "sign-in", &err),
            }
            vec![]
        }
        UiEvent::SignUpFinished(result) => {
            handle_sign_up_finished(app, result);
            vec![]
        }
        UiEvent::PasswordResetFinished(result) => {
            match result {
                Ok(()) => app.notification.success(RESET_SENT_MESSAGE),
                Err(err) => report_failure(app, "password reset", &err),
            }
            vec![]
        }
        UiEvent::SignOutFinished(result) => {
            // The view follows the SignedOut notification, not this result.
            if let Err(err) = result {
                report_failure(app, "sign-out", &err);
            }
            vec![]
        }
        UiEvent::TaskCompleted { kind, completed } => {
            if app.tasks.state_mut(kind).finish_if_active(completed.id) {
                update(app, *completed.result)
            } else {
                debug!(?kind, "dropping stale task completion");
                vec![]
            }
        }
    }
}

fn start_task(app: &mut AppState, kind: TaskKind) -> TaskId {
    let task = app.task_seq.next_id();
    app.tasks.state_mut(kind).start(task);
    task
}

fn report_failure(app: &mut AppState, operation: &str, err: &AuthError) {
    warn!(kind = ?err.kind, details = ?err.details, "{operation} failed: {err}");
    app.notification.error(err.message.clone());
}

fn handle_session_loaded(app: &mut AppState, result: Result<Option<Session>, AuthError>) {
    match result {
        Ok(session) => {
            let signed_in = session.is_some();
            if app.session.on_startup(session) {
                info!(signed_in, "startup session resolved");
            } else {
                debug!("startup session answer superseded by a change notification");
            }
        }
        Err(err) => report_failure(app, "session query", &err),
    }
}

fn handle_session_changed(app: &mut AppState, change: SessionChange) {
    info!(event = %change.event, signed_in = change.session.is_some(), "session changed");

    let previous = app.session.view();
    app.session.on_session_changed(change.session);

    if app.session.is_signed_in() {
        app.auth_form.password.clear();
    } else if previous == View::Account {
        app.notification.info(SIGNED_OUT_MESSAGE);
    }
}

fn handle_sign_up_finished(app: &mut AppState, result: Result<SignUpOutcome, AuthError>) {
    match result {
        Ok(outcome) => {
            info!(
                confirmation_required = outcome.confirmation_required,
                "sign-up accepted"
            );
            app.auth_form.password.clear();
            app.notification.success(outcome.message());
        }
        Err(err) => report_failure(app, "sign-up", &err),
    }
}

// ============================================================================
// Terminal input
// ============================================================================

fn handle_terminal_event(app: &mut AppState, event: Event) -> Vec<UiEffect> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(app, key),
        Event::Paste(text) => {
            handle_paste(app, &text);
            vec![]
        }
        _ => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c' | 'q')) {
        return vec![UiEffect::Quit];
    }
    if key.code == KeyCode::Esc {
        handle_escape(app);
        return vec![];
    }

    match select_panel(app.session.session(), app.session.view()) {
        Panel::Auth => match app.auth_form.handle_key(key) {
            Some(AuthFormAction::SignIn) => submit_sign_in(app),
            Some(AuthFormAction::SignUp) => submit_sign_up(app),
            Some(AuthFormAction::ForgotPassword) => {
                open_password_reset(app);
                vec![]
            }
            None => vec![],
        },
        Panel::PasswordReset => match app.reset_form.handle_key(key) {
            Some(ResetFormAction::Send) => submit_password_reset(app),
            Some(ResetFormAction::Back) => {
                go_back(app);
                vec![]
            }
            None => vec![],
        },
        Panel::Account { .. } => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
                submit_sign_out(app)
            } else {
                vec![]
            }
        }
    }
}

fn handle_paste(app: &mut AppState, text: &str) {
    match select_panel(app.session.session(), app.session.view()) {
        Panel::Auth => app.auth_form.handle_paste(text),
        Panel::PasswordReset => app.reset_form.handle_paste(text),
        Panel::Account { .. } => {}
    }
}

/// Esc dismisses a visible notification first; otherwise it leaves the reset panel.
fn handle_escape(app: &mut AppState) {
    if app.notification.dismiss() {
        return;
    }
    go_back(app);
}

// ============================================================================
// Navigation
// ============================================================================

fn open_password_reset(app: &mut AppState) {
    if !app.session.request_password_reset() {
        return;
    }
    app.notification.dismiss();
    if app.reset_form.email.is_empty() && !app.auth_form.email.is_empty() {
        let email = app.auth_form.email.value().trim().to_string();
        app.reset_form.email.set_text(&email);
    }
    app.reset_form.focus = ResetFocus::Email;
}

fn go_back(app: &mut AppState) {
    if app.session.back() {
        app.notification.dismiss();
    }
}

// ============================================================================
// Submissions
// ============================================================================

fn submit_sign_in(app: &mut AppState) -> Vec<UiEffect> {
    if app.tasks.auth_form_busy() {
        return vec![];
    }
    let credentials = match app.auth_form.credentials() {
        Ok(credentials) => credentials,
        Err(message) => {
            app.notification.error(message);
            return vec![];
        }
    };
    app.notification.dismiss();
    let task = start_task(app, TaskKind::SignIn);
    vec![UiEffect::SignIn { task, credentials }]
}

fn submit_sign_up(app: &mut AppState) -> Vec<UiEffect> {
    if app.tasks.auth_form_busy() {
        return vec![];
    }
    let credentials = match app.auth_form.credentials() {
        Ok(credentials) => credentials,
        Err(message) => {
            app.notification.error(message);
            return vec![];
        }
    };
    app.notification.dismiss();
    let task = start_task(app, TaskKind::SignUp);
    vec![UiEffect::SignUp { task, credentials }]
}

fn submit_password_reset(app: &mut AppState) -> Vec<UiEffect> {
    if app.tasks.state(TaskKind::PasswordReset).is_running() {
        return vec![];
    }
    let email = match app.reset_form.email() {
        Ok(email) => email,
        Err(message) => {
            app.notification.error(message);
            return vec![];
        }
    };
    app.notification.dismiss();
    let task = start_task(app, TaskKind::PasswordReset);
    vec![UiEffect::RequestPasswordReset {
        task,
        email,
        redirect_url: app.options.reset_redirect.clone(),
    }]
}

fn submit_sign_out(app: &mut AppState) -> Vec<UiEffect> {
    if app.tasks.state(TaskKind::SignOut).is_running() {
        return vec![];
    }
    app.notification.dismiss();
    let task = start_task(app, TaskKind::SignOut);
    vec![UiEffect::SignOut { task }]
}
