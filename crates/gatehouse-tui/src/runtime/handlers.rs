//! Effect handlers for the TUI runtime.
//!
//! Handlers are pure async functions that call the backend and return the
//! `UiEvent` carrying the result. The runtime spawns them and wraps the
//! result in a task completion; they never touch `AppState`.

use std::sync::Arc;

use gatehouse_core::auth::{AuthBackend, Credentials};
use tracing::debug;

use crate::events::UiEvent;

pub async fn load_session(backend: Arc<dyn AuthBackend>) -> UiEvent {
    debug!("querying current session");
    UiEvent::SessionLoaded(backend.current_session().await)
}

pub async fn sign_in(backend: Arc<dyn AuthBackend>, credentials: Credentials) -> UiEvent {
    debug!(email = %credentials.email, "signing in");
    UiEvent::SignInFinished(backend.sign_in(credentials).await)
}

pub async fn sign_up(backend: Arc<dyn AuthBackend>, credentials: Credentials) -> UiEvent {
    debug!(email = %credentials.email, "signing up");
    UiEvent::SignUpFinished(backend.sign_up(credentials).await)
}

pub async fn request_password_reset(
    backend: Arc<dyn AuthBackend>,
    email: String,
    redirect_url: Option<String>,
) -> UiEvent {
    debug!(%email, "requesting password reset");
    UiEvent::PasswordResetFinished(backend.request_password_reset(email, redirect_url).await)
}

pub async fn sign_out(backend: Arc<dyn AuthBackend>) -> UiEvent {
    debug!("signing out");
    UiEvent::SignOutFinished(backend.sign_out().await)
}
