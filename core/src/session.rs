//! Session lifecycle: the single authority for "who is logged in".
//!
//! # Design
//! `SessionStore` owns the token+user pair and the persisted blob. Network
//! round-trips go through a caller-supplied `HttpTransport`, so the state
//! machine runs identically under a fake transport in tests and a real one
//! in the host. Invariant: token and user live inside one `Session` value,
//! installed and cleared together — one can never exist without the other.
//!
//! The store is single-threaded by construction (`&mut self` everywhere);
//! the original UI relied on disabling controls while a call was in
//! flight, which the ownership rules enforce here for free.

use tracing::debug;

use crate::client::JudgeClient;
use crate::error::ApiError;
use crate::http::HttpTransport;
use crate::storage::SessionStorage;
use crate::types::{Credentials, Registration, Session, User};

/// Where the store stands in the auth lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Construction-time state, before `restore` has consulted storage.
    Unresolved,
    Authenticated(Session),
    Unauthenticated,
}

type Listener = Box<dyn Fn(Option<&Session>)>;

pub struct SessionStore<S: SessionStorage> {
    client: JudgeClient,
    storage: S,
    state: SessionState,
    listeners: Vec<Listener>,
}

impl<S: SessionStorage> SessionStore<S> {
    pub fn new(client: JudgeClient, storage: S) -> Self {
        Self {
            client,
            storage,
            state: SessionState::Unresolved,
            listeners: Vec::new(),
        }
    }

    /// Speculatively decode the persisted blob. Absence or corruption is
    /// plain "logged out" — never an error, never a network call.
    pub fn restore(&mut self) -> Option<&User> {
        let restored = self
            .storage
            .read()
            .and_then(|blob| serde_json::from_str::<Session>(&blob).ok());
        self.state = match restored {
            Some(session) => SessionState::Authenticated(session),
            None => SessionState::Unauthenticated,
        };
        self.notify();
        self.user()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// False only before the first `restore`.
    pub fn is_resolved(&self) -> bool {
        !matches!(self.state, SessionState::Unresolved)
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.session().map(|session| session.token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|session| &session.user)
    }

    /// Register a change listener, invoked after every state transition
    /// with the session now in effect.
    pub fn subscribe(&mut self, listener: impl Fn(Option<&Session>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Exchange credentials for a session. On success token+user are
    /// installed and persisted atomically; on failure the error propagates
    /// untouched and the prior state stands.
    pub fn login(
        &mut self,
        transport: &dyn HttpTransport,
        credentials: &Credentials,
    ) -> Result<User, ApiError> {
        let request = self.client.build_login(credentials)?;
        let response = transport.execute(request)?;
        let session = self.client.parse_login(response)?;
        Ok(self.install(session))
    }

    /// Same contract as `login`, via the registration endpoint. The
    /// verification-code request that precedes it is a plain client call
    /// and does not touch this state machine.
    pub fn register(
        &mut self,
        transport: &dyn HttpTransport,
        registration: &Registration,
    ) -> Result<User, ApiError> {
        let request = self.client.build_register(registration)?;
        let response = transport.execute(request)?;
        let session = self.client.parse_register(response)?;
        Ok(self.install(session))
    }

    /// Drop the session and the persisted blob. Safe to call repeatedly.
    pub fn logout(&mut self) {
        self.state = SessionState::Unauthenticated;
        self.storage.remove();
        self.notify();
    }

    /// Re-fetch the profile behind the held token.
    ///
    /// Returns `Ok(None)` without touching the network when no token is
    /// held. A 401/403 means the credential is dead: the store logs out
    /// fully AND hands the error back. Any other failure (transport, 5xx)
    /// leaves the session in place so a transient blip does not log the
    /// user out.
    pub fn refresh_profile(
        &mut self,
        transport: &dyn HttpTransport,
    ) -> Result<Option<User>, ApiError> {
        let Some(token) = self.token().map(str::to_string) else {
            return Ok(None);
        };
        match self.execute_profile_fetch(transport, &token) {
            Ok(user) => {
                self.install(Session {
                    token,
                    user: user.clone(),
                });
                Ok(Some(user))
            }
            Err(err) => {
                if matches!(err.status(), Some(401 | 403)) {
                    debug!("profile refresh rejected, dropping session");
                    self.logout();
                }
                Err(err)
            }
        }
    }

    fn execute_profile_fetch(
        &self,
        transport: &dyn HttpTransport,
        token: &str,
    ) -> Result<User, ApiError> {
        let request = self.client.build_fetch_profile(token);
        let response = transport.execute(request)?;
        self.client.parse_fetch_profile(response)
    }

    fn install(&mut self, session: Session) -> User {
        match serde_json::to_string(&session) {
            Ok(blob) => self.storage.write(&blob),
            Err(err) => tracing::warn!("session not persisted: {err}"),
        }
        let user = session.user.clone();
        self.state = SessionState::Authenticated(session);
        self.notify();
        user
    }

    fn notify(&self) {
        let session = self.session();
        for listener in &self.listeners {
            listener(session);
        }
    }
}
