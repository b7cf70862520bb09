//! In-process auth backend.
//!
//! Behaves like the hosted service for the flows the client uses: accounts
//! need email confirmation unless auto-confirm is on, bad credentials get the
//! service's wording, and every session change is broadcast. Used for the
//! offline demo mode and for driving the UI in tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::debug;

use super::{
    AuthBackend, AuthError, AuthEvent, AuthFuture, AuthResult, Credentials, Session,
    SessionChange, SessionListener, SessionNotifier, SignUpOutcome, Subscription, User, now_secs,
};

const SESSION_TTL_SECS: u64 = 3600;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug)]
struct Account {
    id: String,
    password: String,
    confirmed: bool,
}

/// A password reset the backend was asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    pub email: String,
    pub redirect_url: Option<String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    session: Option<Session>,
    resets: Vec<ResetRequest>,
    unavailable: bool,
}

/// Auth backend keeping accounts and the session in memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    notifier: SessionNotifier,
    autoconfirm: bool,
    latency: Option<Duration>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign-ups produce a session immediately instead of waiting for confirmation.
    #[must_use]
    pub fn with_autoconfirm(mut self, autoconfirm: bool) -> Self {
        self.autoconfirm = autoconfirm;
        self
    }

    /// Delays every operation, so busy states are visible.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Adds a confirmed account.
    #[must_use]
    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.lock().accounts.insert(
            normalize(email),
            Account {
                id: uuid::Uuid::new_v4().to_string(),
                password: password.to_string(),
                confirmed: true,
            },
        );
        self
    }

    /// Starts out signed in as an existing account, without notifying anyone.
    #[must_use]
    pub fn with_signed_in(self, email: &str) -> Self {
        {
            let mut state = self.lock();
            let id = state
                .accounts
                .get(&normalize(email))
                .map_or_else(|| uuid::Uuid::new_v4().to_string(), |a| a.id.clone());
            state.session = Some(issue_session(id, normalize(email)));
        }
        self
    }

    /// Marks an account as confirmed, as the emailed link would.
    pub fn confirm(&self, email: &str) -> bool {
        match self.lock().accounts.get_mut(&normalize(email)) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Makes every call fail with a network error until turned off.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    pub fn reset_requests(&self) -> Vec<ResetRequest> {
        self.lock().resets.clone()
    }

    /// Replaces the session from outside the client (another device,
    /// server-side revocation) and broadcasts the change.
    pub fn push_change(&self, event: AuthEvent, session: Option<Session>) {
        self.lock().session.clone_from(&session);
        self.notifier.notify(&SessionChange::new(event, session));
    }

    /// Issues a session for an arbitrary email, for use with [`Self::push_change`].
    pub fn session_for(email: &str) -> Session {
        issue_session(uuid::Uuid::new_v4().to_string(), normalize(email))
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn simulate_round_trip(&self) -> AuthResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.lock().unavailable {
            return Err(AuthError::network("Could not reach the auth service."));
        }
        Ok(())
    }

    fn set_session(&self, event: AuthEvent, session: Option<Session>) {
        self.push_change(event, session);
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn issue_session(user_id: String, email: String) -> Session {
    Session::new(
        User { id: user_id, email },
        uuid::Uuid::new_v4().to_string(),
        uuid::Uuid::new_v4().to_string(),
        SESSION_TTL_SECS,
        now_secs(),
    )
}

fn validate_sign_up(credentials: &Credentials) -> AuthResult<()> {
    let email = credentials.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::api(
            "Unable to validate email address: invalid format",
        ));
    }
    if credentials.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::api(format!(
            "Password should be at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    Ok(())
}

impl AuthBackend for MemoryBackend {
    fn current_session(&self) -> AuthFuture<'_, Option<Session>> {
        Box::pin(async move {
            self.simulate_round_trip().await?;
            Ok(self.lock().session.clone())
        })
    }

    fn subscribe(&self, listener: SessionListener) -> Subscription {
        self.notifier.subscribe(listener)
    }

    fn sign_in(&self, credentials: Credentials) -> AuthFuture<'_, ()> {
        Box::pin(async move {
            self.simulate_round_trip().await?;
            let email = normalize(&credentials.email);
            let session = {
                let state = self.lock();
                let account = state
                    .accounts
                    .get(&email)
                    .filter(|a| a.password == credentials.password)
                    .ok_or_else(|| AuthError::api("Invalid login credentials"))?;
                if !account.confirmed {
                    return Err(AuthError::api("Email not confirmed"));
                }
                issue_session(account.id.clone(), email)
            };
            debug!("memory backend: signed in");
            self.set_session(AuthEvent::SignedIn, Some(session));
            Ok(())
        })
    }

    fn sign_up(&self, credentials: Credentials) -> AuthFuture<'_, SignUpOutcome> {
        Box::pin(async move {
            self.simulate_round_trip().await?;
            validate_sign_up(&credentials)?;
            let email = normalize(&credentials.email);
            let id = uuid::Uuid::new_v4().to_string();
            {
                let mut state = self.lock();
                if state.accounts.contains_key(&email) {
                    return Err(AuthError::api("User already registered"));
                }
                state.accounts.insert(
                    email.clone(),
                    Account {
                        id: id.clone(),
                        password: credentials.password,
                        confirmed: self.autoconfirm,
                    },
                );
            }

            if !self.autoconfirm {
                return Ok(SignUpOutcome {
                    confirmation_required: true,
                });
            }
            self.set_session(AuthEvent::SignedIn, Some(issue_session(id, email)));
            Ok(SignUpOutcome {
                confirmation_required: false,
            })
        })
    }

    fn request_password_reset(
        &self,
        email: String,
        redirect_url: Option<String>,
    ) -> AuthFuture<'_, ()> {
        Box::pin(async move {
            self.simulate_round_trip().await?;
            self.lock().resets.push(ResetRequest {
                email: normalize(&email),
                redirect_url,
            });
            Ok(())
        })
    }

    fn sign_out(&self) -> AuthFuture<'_, ()> {
        Box::pin(async move {
            self.simulate_round_trip().await?;
            self.set_session(AuthEvent::SignedOut, None);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::auth::AuthErrorKind;

    fn record_events(backend: &MemoryBackend) -> (Subscription, Arc<Mutex<Vec<AuthEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let sub = backend.subscribe(Box::new(move |change| {
            sink.lock().unwrap().push(change.event);
        }));
        (sub, events)
    }

    #[tokio::test]
    async fn test_sign_up_requires_confirmation_by_default() {
        let backend = MemoryBackend::new();
        let outcome = backend
            .sign_up(Credentials::new("ada@example.com", "secret1"))
            .await
            .unwrap();
        assert!(outcome.confirmation_required);
        assert!(backend.current_session().await.unwrap().is_none());

        let err = backend
            .sign_in(Credentials::new("ada@example.com", "secret1"))
            .await
            .unwrap_err();
        assert_eq!(err.message, "Email not confirmed");

        assert!(backend.confirm("ADA@example.com"));
        backend
            .sign_in(Credentials::new("ada@example.com", "secret1"))
            .await
            .unwrap();
        let session = backend.current_session().await.unwrap().unwrap();
        assert_eq!(session.email(), "ada@example.com");
    }

    #[tokio::test]
    async fn test_autoconfirm_signs_in_on_sign_up() {
        let backend = MemoryBackend::new().with_autoconfirm(true);
        let (_sub, events) = record_events(&backend);

        let outcome = backend
            .sign_up(Credentials::new("ada@example.com", "secret1"))
            .await
            .unwrap();
        assert!(!outcome.confirmation_required);
        assert_eq!(*events.lock().unwrap(), vec![AuthEvent::SignedIn]);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_share_message() {
        let backend = MemoryBackend::new().with_account("ada@example.com", "secret1");
        for creds in [
            Credentials::new("ada@example.com", "nope"),
            Credentials::new("bob@example.com", "secret1"),
        ] {
            let err = backend.sign_in(creds).await.unwrap_err();
            assert_eq!(err.kind, AuthErrorKind::Api);
            assert_eq!(err.message, "Invalid login credentials");
        }
    }

    #[tokio::test]
    async fn test_duplicate_and_weak_sign_ups_rejected() {
        let backend = MemoryBackend::new().with_account("ada@example.com", "secret1");
        let dup = backend
            .sign_up(Credentials::new("ada@example.com", "another1"))
            .await
            .unwrap_err();
        assert_eq!(dup.message, "User already registered");

        let weak = backend
            .sign_up(Credentials::new("bob@example.com", "123"))
            .await
            .unwrap_err();
        assert!(weak.message.contains("at least 6"));
    }

    #[tokio::test]
    async fn test_sign_out_notifies() {
        let backend = MemoryBackend::new()
            .with_account("ada@example.com", "secret1")
            .with_signed_in("ada@example.com");
        let (_sub, events) = record_events(&backend);

        backend.sign_out().await.unwrap();
        assert!(backend.current_session().await.unwrap().is_none());
        assert_eq!(*events.lock().unwrap(), vec![AuthEvent::SignedOut]);
    }

    #[tokio::test]
    async fn test_unavailable_fails_every_call() {
        let backend = MemoryBackend::new().with_signed_in("ada@example.com");
        backend.set_unavailable(true);

        let err = backend.sign_out().await.unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::Network);

        backend.set_unavailable(false);
        assert!(backend.current_session().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reset_requests_are_recorded() {
        let backend = MemoryBackend::new();
        backend
            .request_password_reset(
                "Ada@Example.com ".to_string(),
                Some("https://app/reset".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(
            backend.reset_requests(),
            vec![ResetRequest {
                email: "ada@example.com".to_string(),
                redirect_url: Some("https://app/reset".to_string()),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_delays_answers() {
        let backend = MemoryBackend::new().with_latency(Duration::from_millis(500));
        let started = tokio::time::Instant::now();
        backend.current_session().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
    }
}
