//! Auth backends.
//!
//! The hosted service owns identity, credential checks and the session
//! lifecycle. Clients talk to it only through [`AuthBackend`], which is
//! injected into whatever needs it (UI, CLI commands, tests).

mod error;
pub mod hosted;
pub mod memory;
mod notifier;
mod session;
pub mod store;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

pub use error::{AuthError, AuthErrorKind, AuthResult};
pub use hosted::HostedAuthClient;
pub use memory::MemoryBackend;
pub use notifier::{SessionListener, SessionNotifier, Subscription};
pub use session::{AuthEvent, Credentials, Session, SessionChange, SignUpOutcome, User};
pub use store::SessionStore;

use crate::config::{BackendKind, Config};

/// Boxed future returned by backend operations.
pub type AuthFuture<'a, T> = Pin<Box<dyn Future<Output = AuthResult<T>> + Send + 'a>>;

/// Operations the client needs from the auth service.
///
/// Every completed sign-in, sign-up with immediate session, sign-out and
/// token refresh is reported to subscribers as a [`SessionChange`].
pub trait AuthBackend: Send + Sync {
    /// Returns the current session, refreshing it first if it is about to expire.
    fn current_session(&self) -> AuthFuture<'_, Option<Session>>;

    /// Registers a listener for session changes.
    fn subscribe(&self, listener: SessionListener) -> Subscription;

    fn sign_in(&self, credentials: Credentials) -> AuthFuture<'_, ()>;

    fn sign_up(&self, credentials: Credentials) -> AuthFuture<'_, SignUpOutcome>;

    /// Asks the service to email a reset link. Unknown addresses are not an error.
    fn request_password_reset(
        &self,
        email: String,
        redirect_url: Option<String>,
    ) -> AuthFuture<'_, ()>;

    fn sign_out(&self) -> AuthFuture<'_, ()>;
}

/// Simulated round trip of the offline backend.
const DEMO_LATENCY: Duration = Duration::from_millis(300);

/// Builds the backend selected by `config`.
///
/// # Errors
/// Returns an error if the hosted backend is selected but not configured.
pub fn build_backend(config: &Config) -> Result<Arc<dyn AuthBackend>> {
    match config.backend {
        BackendKind::Hosted => {
            let mut client = HostedAuthClient::from_config(config)?;
            if config.persist_session {
                client = client.with_store(SessionStore::default_location());
            }
            Ok(Arc::new(client))
        }
        BackendKind::Memory => Ok(Arc::new(
            MemoryBackend::new()
                .with_autoconfirm(true)
                .with_latency(DEMO_LATENCY),
        )),
    }
}

/// Current time as unix seconds.
pub(crate) fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
