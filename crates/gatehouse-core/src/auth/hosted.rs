//! Client for a GoTrue-compatible hosted auth service.
//!
//! Endpoints used (relative to `<service_url>/auth/v1`):
//! - `POST token?grant_type=password` sign in
//! - `POST token?grant_type=refresh_token` refresh
//! - `POST signup` sign up
//! - `POST recover?redirect_to=...` password reset email
//! - `POST logout` sign out
//!
//! Every request carries the anon key as `apikey`. Authenticated calls send
//! the access token as bearer; the rest send the anon key.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use url::Url;

use super::{
    AuthBackend, AuthError, AuthEvent, AuthFuture, AuthResult, Credentials, Session,
    SessionChange, SessionListener, SessionNotifier, SessionStore, SignUpOutcome, Subscription,
    now_secs,
};
use crate::config::Config;

/// Sessions expiring within this many seconds are refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Default)]
struct SessionCache {
    /// Whether the store has been consulted yet.
    loaded: bool,
    session: Option<Session>,
}

/// Hosted auth backend.
#[derive(Debug)]
pub struct HostedAuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    store: Option<SessionStore>,
    cache: Mutex<SessionCache>,
    notifier: SessionNotifier,
}

impl HostedAuthClient {
    /// Creates a client for `base_url` (without the `/auth/v1` suffix).
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            store: None,
            cache: Mutex::new(SessionCache::default()),
            notifier: SessionNotifier::new(),
        })
    }

    /// Creates a client from the effective config values.
    ///
    /// # Errors
    /// Returns an error if the service URL or anon key is missing or invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.effective_service_url()?,
            config.effective_anon_key()?,
            config.request_timeout(),
        )
    }

    /// Persists the session to `store` and restores it on first use.
    #[must_use]
    pub fn with_store(mut self, store: SessionStore) -> Self {
        self.store = Some(store);
        self
    }

    fn lock_cache(&self) -> MutexGuard<'_, SessionCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached session, loading it from the store on first call.
    fn cached_session(&self) -> Option<Session> {
        let mut cache = self.lock_cache();
        if !cache.loaded {
            cache.loaded = true;
            if let Some(store) = &self.store {
                cache.session = store.load().unwrap_or_else(|err| {
                    warn!("Ignoring stored session: {err:#}");
                    None
                });
            }
        }
        cache.session.clone()
    }

    /// Replaces the session, persists it and tells subscribers.
    fn apply(&self, event: AuthEvent, session: Option<Session>) {
        {
            let mut cache = self.lock_cache();
            cache.loaded = true;
            cache.session.clone_from(&session);
        }
        self.persist(session.as_ref());
        self.notifier.notify(&SessionChange::new(event, session));
    }

    fn persist(&self, session: Option<&Session>) {
        let Some(store) = &self.store else {
            return;
        };
        let result = match session {
            Some(session) => store.save(session),
            None => store.clear().map(|_| ()),
        };
        if let Err(err) = result {
            warn!("Failed to persist session: {err:#}");
        }
    }

    fn endpoint(&self, path: &str) -> AuthResult<Url> {
        let raw = format!("{}/auth/v1/{path}", self.base_url);
        Url::parse(&raw).map_err(|e| AuthError::config(format!("Invalid auth URL {raw}: {e}")))
    }

    /// Sends a JSON POST and returns the decoded body (`Null` when empty).
    async fn post(&self, url: Url, bearer: &str, body: &Value) -> AuthResult<Value> {
        debug!(path = url.path(), "auth request");
        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::from_transport(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AuthError::from_transport(&e))?;

        if !status.is_success() {
            let error = AuthError::from_response(status.as_u16(), &text);
            debug!(status = status.as_u16(), message = %error.message, "auth request rejected");
            return Err(error);
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| {
            AuthError::parse(format!("Unreadable response from the auth service: {e}"))
        })
    }

    async fn token_grant(&self, grant_type: &str, body: &Value) -> AuthResult<Session> {
        let mut url = self.endpoint("token")?;
        url.query_pairs_mut().append_pair("grant_type", grant_type);
        let value = self.post(url, &self.anon_key, body).await?;
        parse_session(value)
    }

    async fn refresh(&self, refresh_token: &str) -> AuthResult<Session> {
        self.token_grant("refresh_token", &json!({ "refresh_token": refresh_token }))
            .await
    }
}

fn parse_session(value: Value) -> AuthResult<Session> {
    let session: Session = serde_json::from_value(value)
        .map_err(|e| AuthError::parse(format!("Unexpected session payload: {e}")))?;
    Ok(session.stamped(now_secs()))
}

impl AuthBackend for HostedAuthClient {
    fn current_session(&self) -> AuthFuture<'_, Option<Session>> {
        Box::pin(async move {
            let Some(session) = self.cached_session() else {
                return Ok(None);
            };
            if !session.expires_within(REFRESH_MARGIN_SECS, now_secs()) {
                return Ok(Some(session));
            }

            if session.refresh_token.is_empty() {
                info!("Session expired without refresh token");
                self.apply(AuthEvent::SignedOut, None);
                return Ok(None);
            }

            match self.refresh(&session.refresh_token).await {
                Ok(fresh) => {
                    info!("Session refreshed");
                    self.apply(AuthEvent::TokenRefreshed, Some(fresh.clone()));
                    Ok(Some(fresh))
                }
                // Keep the session; the service may just be unreachable right now.
                Err(err) if err.kind.is_transient() => Err(err),
                Err(err) => {
                    warn!("Session refresh rejected: {err}");
                    self.apply(AuthEvent::SignedOut, None);
                    Ok(None)
                }
            }
        })
    }

    fn subscribe(&self, listener: SessionListener) -> Subscription {
        self.notifier.subscribe(listener)
    }

    fn sign_in(&self, credentials: Credentials) -> AuthFuture<'_, ()> {
        Box::pin(async move {
            let session = self
                .token_grant(
                    "password",
                    &json!({ "email": credentials.email, "password": credentials.password }),
                )
                .await?;
            info!("Signed in");
            self.apply(AuthEvent::SignedIn, Some(session));
            Ok(())
        })
    }

    fn sign_up(&self, credentials: Credentials) -> AuthFuture<'_, SignUpOutcome> {
        Box::pin(async move {
            let url = self.endpoint("signup")?;
            let value = self
                .post(
                    url,
                    &self.anon_key,
                    &json!({ "email": credentials.email, "password": credentials.password }),
                )
                .await?;

            // With email confirmation on, the service returns only the user.
            if value.get("access_token").is_none() {
                info!("Signed up; confirmation pending");
                return Ok(SignUpOutcome {
                    confirmation_required: true,
                });
            }

            let session = parse_session(value)?;
            info!("Signed up and signed in");
            self.apply(AuthEvent::SignedIn, Some(session));
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
            let mut url = self.endpoint("recover")?;
            if let Some(redirect) = redirect_url.as_deref().filter(|r| !r.is_empty()) {
                url.query_pairs_mut().append_pair("redirect_to", redirect);
            }
            self.post(url, &self.anon_key, &json!({ "email": email }))
                .await?;
            info!("Password reset requested");
            Ok(())
        })
    }

    fn sign_out(&self) -> AuthFuture<'_, ()> {
        Box::pin(async move {
            if let Some(session) = self.cached_session() {
                let url = self.endpoint("logout")?;
                match self.post(url, &session.access_token, &json!({})).await {
                    Ok(_) => {}
                    // Token already invalid or revoked: the session is gone either way.
                    Err(err) if matches!(err.status, Some(401 | 403 | 404)) => {
                        debug!("Logout with stale token: {err}");
                    }
                    Err(err) => return Err(err),
                }
            }
            info!("Signed out");
            self.apply(AuthEvent::SignedOut, None);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tempfile::tempdir;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::auth::{AuthErrorKind, User};

    const ANON: &str = "anon-key";

    fn client(server: &MockServer) -> HostedAuthClient {
        HostedAuthClient::new(server.uri(), ANON, Some(Duration::from_secs(5))).unwrap()
    }

    fn token_body(email: &str) -> Value {
        json!({
            "access_token": "access-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-1",
            "user": { "id": "user-1", "email": email }
        })
    }

    fn stored_session(expires_at: i64) -> Session {
        let mut session = Session::new(
            User {
                id: "user-1".to_string(),
                email: "ada@example.com".to_string(),
            },
            "old-access",
            "old-refresh",
            3600,
            0,
        );
        session.expires_at = Some(expires_at);
        session
    }

    fn record_events(client: &HostedAuthClient) -> (Subscription, Arc<Mutex<Vec<AuthEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let sub = client.subscribe(Box::new(move |change| {
            sink.lock().unwrap().push(change.event);
        }));
        (sub, events)
    }

    #[tokio::test]
    async fn test_sign_in_stores_session_and_notifies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", ANON))
            .and(body_json(json!({ "email": "ada@example.com", "password": "secret" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("ada@example.com")))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let (_sub, events) = record_events(&client);

        client
            .sign_in(Credentials::new("ada@example.com", "secret"))
            .await
            .unwrap();

        let session = client.current_session().await.unwrap().unwrap();
        assert_eq!(session.email(), "ada@example.com");
        assert!(session.expires_at.is_some());
        assert_eq!(*events.lock().unwrap(), vec![AuthEvent::SignedIn]);
    }

    #[tokio::test]
    async fn test_sign_in_surfaces_service_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "code": 400,
                "error_code": "invalid_credentials",
                "msg": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let (_sub, events) = record_events(&client);

        let err = client
            .sign_in(Credentials::new("ada@example.com", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AuthErrorKind::Api);
        assert_eq!(err.message, "Invalid login credentials");
        assert!(client.current_session().await.unwrap().is_none());
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_with_confirmation_pending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "user-2",
                "email": "new@example.com",
                "confirmation_sent_at": "2026-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let (_sub, events) = record_events(&client);

        let outcome = client
            .sign_up(Credentials::new("new@example.com", "secret1"))
            .await
            .unwrap();
        assert!(outcome.confirmation_required);
        assert!(client.current_session().await.unwrap().is_none());
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_with_immediate_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("new@example.com")))
            .mount(&server)
            .await;

        let client = client(&server);
        let (_sub, events) = record_events(&client);

        let outcome = client
            .sign_up(Credentials::new("new@example.com", "secret1"))
            .await
            .unwrap();
        assert!(!outcome.confirmation_required);
        assert_eq!(*events.lock().unwrap(), vec![AuthEvent::SignedIn]);
    }

    #[tokio::test]
    async fn test_password_reset_sends_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/recover"))
            .and(query_param("redirect_to", "https://app.example.com/reset"))
            .and(body_json(json!({ "email": "ada@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .request_password_reset(
                "ada@example.com".to_string(),
                Some("https://app.example.com/reset".to_string()),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_password_reset_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/recover"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "msg": "For security purposes, you can only request this once every 60 seconds"
            })))
            .mount(&server)
            .await;

        let err = client(&server)
            .request_password_reset("ada@example.com".to_string(), None)
            .await
            .unwrap_err();
        assert!(err.message.starts_with("For security purposes"));
    }

    #[tokio::test]
    async fn test_sign_out_revokes_and_clears_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("authorization", "Bearer old-access"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&stored_session(now_secs() + 3600)).unwrap();

        let client = client(&server).with_store(store.clone());
        let (_sub, events) = record_events(&client);

        client.sign_out().await.unwrap();

        assert!(store.load().unwrap().is_none());
        assert!(client.current_session().await.unwrap().is_none());
        assert_eq!(*events.lock().unwrap(), vec![AuthEvent::SignedOut]);
    }

    #[tokio::test]
    async fn test_sign_out_with_revoked_token_still_signs_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"msg": "invalid JWT"})))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&stored_session(now_secs() + 3600)).unwrap();

        let client = client(&server).with_store(store);
        client.sign_out().await.unwrap();
        assert!(client.current_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sign_out_server_error_keeps_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&stored_session(now_secs() + 3600)).unwrap();

        let client = client(&server).with_store(store);
        let (_sub, events) = record_events(&client);

        let err = client.sign_out().await.unwrap_err();
        assert_eq!(err.message, "HTTP 500");
        assert!(client.current_session().await.unwrap().is_some());
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_without_session_skips_request() {
        let server = MockServer::start().await;
        let client = client(&server);
        let (_sub, events) = record_events(&client);

        client.sign_out().await.unwrap();
        assert_eq!(*events.lock().unwrap(), vec![AuthEvent::SignedOut]);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expiring_session_is_refreshed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "refresh_token"))
            .and(body_json(json!({ "refresh_token": "old-refresh" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("ada@example.com")))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&stored_session(now_secs() + 10)).unwrap();

        let client = client(&server).with_store(store.clone());
        let (_sub, events) = record_events(&client);

        let session = client.current_session().await.unwrap().unwrap();
        assert_eq!(session.access_token, "access-1");
        assert_eq!(store.load().unwrap().unwrap().access_token, "access-1");
        assert_eq!(*events.lock().unwrap(), vec![AuthEvent::TokenRefreshed]);
    }

    #[tokio::test]
    async fn test_rejected_refresh_signs_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid Refresh Token: Already Used"
            })))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&stored_session(now_secs() - 5)).unwrap();

        let client = client(&server).with_store(store.clone());
        let (_sub, events) = record_events(&client);

        assert!(client.current_session().await.unwrap().is_none());
        assert!(store.load().unwrap().is_none());
        assert_eq!(*events.lock().unwrap(), vec![AuthEvent::SignedOut]);
    }

    #[tokio::test]
    async fn test_fresh_stored_session_needs_no_request() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&stored_session(now_secs() + 3600)).unwrap();

        let client = client(&server).with_store(store);
        let session = client.current_session().await.unwrap().unwrap();
        assert_eq!(session.email(), "ada@example.com");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_parse_session_clamps_huge_lifetime() {
        let mut body = token_body("ada@example.com");
        body["expires_in"] = json!(u64::MAX);

        let session = parse_session(body).unwrap();
        assert_eq!(session.expires_at, Some(i64::MAX));
        assert!(!session.expires_within(REFRESH_MARGIN_SECS, now_secs()));
    }

    #[tokio::test]
    async fn test_sign_in_with_huge_lifetime_completes() {
        let server = MockServer::start().await;
        let mut body = token_body("ada@example.com");
        body["expires_in"] = json!(i64::MAX);
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        client
            .sign_in(Credentials::new("ada@example.com", "secret"))
            .await
            .unwrap();

        let session = client.current_session().await.unwrap().unwrap();
        assert_eq!(session.expires_at, Some(i64::MAX));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_network_error() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let client = HostedAuthClient::new(uri, ANON, Some(Duration::from_secs(2))).unwrap();
        let err = client
            .sign_in(Credentials::new("ada@example.com", "secret"))
            .await
            .unwrap_err();
        assert!(err.kind.is_transient(), "unexpected kind: {:?}", err.kind);
    }

    #[tokio::test]
    async fn test_dropped_subscription_stops_delivery() {
        let server = MockServer::start().await;
        let client = client(&server);
        let (sub, events) = record_events(&client);
        sub.unsubscribe();

        client.sign_out().await.unwrap();
        assert!(events.lock().unwrap().is_empty());
    }
}
