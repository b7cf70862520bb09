//! Form state and key handling for the auth and password reset panels.
//!
//! Forms only edit their own fields and report what the user asked for;
//! the reducer decides whether a request is sent.

mod text_field;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use gatehouse_core::auth::Credentials;
pub use text_field::TextField;

/// Focus order shared by the forms: Tab/Down go forward, Shift+Tab/Up go back.
trait FocusCycle: Copy + PartialEq + 'static {
    const ORDER: &'static [Self];

    fn step(self, forward: bool) -> Self {
        let len = Self::ORDER.len();
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        Self::ORDER[next]
    }
}

/// Returns `Some(forward)` for focus navigation keys.
fn focus_direction(key: KeyEvent) -> Option<bool> {
    match key.code {
        KeyCode::Tab if !key.modifiers.contains(KeyModifiers::SHIFT) => Some(true),
        KeyCode::Down => Some(true),
        KeyCode::BackTab | KeyCode::Tab | KeyCode::Up => Some(false),
        _ => None,
    }
}

fn is_activate(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Enter | KeyCode::Char(' '))
}

/// Checks an email the way the service would reject it outright.
///
/// # Errors
/// Returns the message to show the user.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Enter your email address.");
    }
    if !email.contains('@') {
        return Err("Enter a valid email address.");
    }
    Ok(())
}

// ============================================================================
// Auth form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFocus {
    #[default]
    Email,
    Password,
    SignIn,
    SignUp,
    ForgotPassword,
}

impl FocusCycle for AuthFocus {
    const ORDER: &'static [Self] = &[
        AuthFocus::Email,
        AuthFocus::Password,
        AuthFocus::SignIn,
        AuthFocus::SignUp,
        AuthFocus::ForgotPassword,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFormAction {
    SignIn,
    SignUp,
    ForgotPassword,
}

#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub email: TextField,
    pub password: TextField,
    pub focus: AuthFocus,
}

impl AuthForm {
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<AuthFormAction> {
        if let Some(forward) = focus_direction(key) {
            self.focus = self.focus.step(forward);
            return None;
        }

        match self.focus {
            AuthFocus::Email => {
                if key.code == KeyCode::Enter {
                    self.focus = AuthFocus::Password;
                } else {
                    self.email.handle_key(key);
                }
                None
            }
            AuthFocus::Password => {
                if key.code == KeyCode::Enter {
                    Some(AuthFormAction::SignIn)
                } else {
                    self.password.handle_key(key);
                    None
                }
            }
            AuthFocus::SignIn => is_activate(key).then_some(AuthFormAction::SignIn),
            AuthFocus::SignUp => is_activate(key).then_some(AuthFormAction::SignUp),
            AuthFocus::ForgotPassword => {
                is_activate(key).then_some(AuthFormAction::ForgotPassword)
            }
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        match self.focus {
            AuthFocus::Email => self.email.insert_str(text),
            AuthFocus::Password => self.password.insert_str(text),
            AuthFocus::SignIn | AuthFocus::SignUp | AuthFocus::ForgotPassword => {}
        }
    }

    /// Validated credentials from the current field values.
    ///
    /// # Errors
    /// Returns the message to show when a field is missing or malformed.
    pub fn credentials(&self) -> Result<Credentials, &'static str> {
        validate_email(self.email.value())?;
        if self.password.is_empty() {
            return Err("Enter your password.");
        }
        Ok(Credentials::new(
            self.email.value().trim(),
            self.password.value(),
        ))
    }
}

// ============================================================================
// Password reset form
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetFocus {
    #[default]
    Email,
    Send,
    Back,
}

impl FocusCycle for ResetFocus {
    const ORDER: &'static [Self] = &[ResetFocus::Email, ResetFocus::Send, ResetFocus::Back];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetFormAction {
    Send,
    Back,
}

#[derive(Debug, Clone, Default)]
pub struct ResetForm {
    pub email: TextField,
    pub focus: ResetFocus,
}

impl ResetForm {
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<ResetFormAction> {
        if let Some(forward) = focus_direction(key) {
            self.focus = self.focus.step(forward);
            return None;
        }

        match self.focus {
            ResetFocus::Email => {
                if key.code == KeyCode::Enter {
                    Some(ResetFormAction::Send)
                } else {
                    self.email.handle_key(key);
                    None
                }
            }
            ResetFocus::Send => is_activate(key).then_some(ResetFormAction::Send),
            ResetFocus::Back => is_activate(key).then_some(ResetFormAction::Back),
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        if self.focus == ResetFocus::Email {
            self.email.insert_str(text);
        }
    }

    /// # Errors
    /// Returns the message to show when the email is missing or malformed.
    pub fn email(&self) -> Result<String, &'static str> {
        validate_email(self.email.value())?;
        Ok(self.email.value().trim().to_string())
    }
}
