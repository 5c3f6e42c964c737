//! Explicit client context for the signed-in session.
//!
//! Holds the bearer credential and the cached current-user identity. The
//! session is created at sign-in and passed to the API client, gallery and
//! upload flow at construction; `invalidate` is the teardown path, triggered
//! either by an explicit sign-out or by the remote rejecting the credential.

use async_channel::{Receiver, Sender};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::api::types::CurrentUser;

/// Lifecycle notifications emitted by a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The credential is gone; the outer shell should route to sign-in.
    Invalidated,
}

#[derive(Default)]
struct SessionInner {
    token: Option<String>,
    user: Option<CurrentUser>,
}

/// Shared credential and identity store for one signed-in session.
pub struct Session {
    inner: RwLock<SessionInner>,
    events: Sender<SessionEvent>,
}

impl Session {
    /// Creates an unauthenticated session and its event stream.
    pub fn new() -> (Self, Receiver<SessionEvent>) {
        let (events, receiver) = async_channel::unbounded();
        (
            Self {
                inner: RwLock::new(SessionInner::default()),
                events,
            },
            receiver,
        )
    }

    /// Creates a session already carrying a bearer credential.
    pub fn with_token(token: impl Into<String>) -> (Self, Receiver<SessionEvent>) {
        let (session, receiver) = Self::new();
        session.sign_in(token);
        (session, receiver)
    }

    /// Stores the bearer credential after a successful sign-in.
    pub fn sign_in(&self, token: impl Into<String>) {
        self.inner.write().token = Some(token.into());
        debug!("bearer credential stored");
    }

    /// Caches the identity returned by the current-user lookup.
    pub fn set_user(&self, user: CurrentUser) {
        self.inner.write().user = Some(user);
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().token.clone()
    }

    pub fn user(&self) -> Option<CurrentUser> {
        self.inner.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().token.is_some()
    }

    /// Clears credential and identity and notifies the event stream.
    ///
    /// Called on explicit sign-out and on any 401 from the remote.
    pub fn invalidate(&self) {
        {
            let mut inner = self.inner.write();
            inner.token = None;
            inner.user = None;
        }
        info!("session invalidated; sign-in required");
        let _ = self.events.try_send(SessionEvent::Invalidated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_stores_the_credential() {
        let (session, _events) = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);

        session.sign_in("tok-123");
        assert!(session.is_authenticated());
        assert_eq!(session.token().as_deref(), Some("tok-123"));
    }

    #[test]
    fn invalidate_clears_state_and_emits() {
        let (session, events) = Session::with_token("tok-123");
        session.set_user(CurrentUser {
            id: "user-1".to_string(),
            username: "ana".to_string(),
            email: None,
        });

        session.invalidate();

        assert!(!session.is_authenticated());
        assert_eq!(session.user(), None);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::Invalidated);
    }
}
