//! Session model shared by all backends.
//!
//! Token values are opaque to the client. `Debug` output redacts them so a
//! stray `{:?}` in a log line never leaks credentials.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Authenticated user as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
}

/// Server-issued proof of authenticated identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
    /// Expiry as unix seconds. Stamped on receipt when the service omits it.
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub refresh_token: String,
    pub user: User,
}

/// `now + expires_in`, clamped instead of overflowing on absurd lifetimes.
fn expiry_from(now: i64, expires_in: u64) -> i64 {
    now.saturating_add(i64::try_from(expires_in).unwrap_or(i64::MAX))
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    pub fn new(
        user: User,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: u64,
        now: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            expires_in,
            expires_at: Some(expiry_from(now, expires_in)),
            refresh_token: refresh_token.into(),
            user,
        }
    }

    /// Email of the signed-in user.
    pub fn email(&self) -> &str {
        &self.user.email
    }

    /// Fills `expires_at` from `expires_in` if the service left it out.
    #[must_use]
    pub fn stamped(mut self, now: i64) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = Some(expiry_from(now, self.expires_in));
        }
        self
    }

    /// Returns true if the access token expires within `margin_secs` of `now`.
    ///
    /// Sessions without a known expiry never count as expiring.
    pub fn expires_within(&self, margin_secs: i64, now: i64) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at.saturating_sub(margin_secs) <= now)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Email and password pair submitted by a form.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of a successful sign-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignUpOutcome {
    /// The account exists but stays unusable until the user confirms by email.
    pub confirmation_required: bool,
}

impl SignUpOutcome {
    pub fn message(self) -> &'static str {
        if self.confirmation_required {
            "Check your email to confirm your account."
        } else {
            "Account created."
        }
    }
}

/// Kind of session change reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

impl fmt::Display for AuthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthEvent::SignedIn => "SIGNED_IN",
            AuthEvent::SignedOut => "SIGNED_OUT",
            AuthEvent::TokenRefreshed => "TOKEN_REFRESHED",
            AuthEvent::UserUpdated => "USER_UPDATED",
            AuthEvent::PasswordRecovery => "PASSWORD_RECOVERY",
        };
        f.write_str(name)
    }
}

/// A session change notification: what happened and the resulting session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

impl SessionChange {
    pub fn new(event: AuthEvent, session: Option<Session>) -> Self {
        Self { event, session }
    }
}
