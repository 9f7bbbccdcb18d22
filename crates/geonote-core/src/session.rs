//! Process-wide session state.
//!
//! The authenticated-user signal is the only shared mutable state in the
//! system. It has exactly one writer (the controller owning the
//! `watch::Sender`) and any number of readers; receivers always observe a
//! consistent snapshot, and notifications are totally ordered.

use tokio::sync::watch;

use crate::auth::{AuthResult, AuthSession, AuthUser, FirebaseAuthClient, SessionPersistence};

/// Where the process stands with respect to authentication.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthPhase {
    /// No notification from the identity service yet; the navigation
    /// layer renders nothing in this phase.
    #[default]
    Initializing,
    Unauthenticated,
    Authenticated(AuthUser),
}

impl AuthPhase {
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    #[must_use]
    pub const fn user(&self) -> Option<&AuthUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Map an identity-service notification payload onto a phase.
    #[must_use]
    pub fn from_notification(user: Option<AuthUser>) -> Self {
        user.map_or(Self::Unauthenticated, Self::Authenticated)
    }
}

/// Single-writer holder for the current [`AuthPhase`].
///
/// Owning the signal is owning the write side; readers get cheap
/// [`watch::Receiver`] handles.
#[derive(Debug)]
pub struct SessionSignal {
    tx: watch::Sender<AuthPhase>,
}

impl SessionSignal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tx: watch::Sender::new(AuthPhase::Initializing),
        }
    }

    #[must_use]
    pub fn current(&self) -> AuthPhase {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthPhase> {
        self.tx.subscribe()
    }

    pub fn publish(&self, phase: AuthPhase) {
        self.tx.send_replace(phase);
    }
}

impl Default for SessionSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns the auth client and the session signal, and is the signal's only
/// writer.
pub struct SessionController<S: SessionPersistence> {
    auth: FirebaseAuthClient<S>,
    signal: SessionSignal,
}

impl<S: SessionPersistence> SessionController<S> {
    #[must_use]
    pub fn new(auth: FirebaseAuthClient<S>) -> Self {
        Self {
            auth,
            signal: SessionSignal::new(),
        }
    }

    /// Deliver the first notification: restore the persisted session and
    /// leave `Initializing`. A restore failure is logged and treated as
    /// signed-out rather than blocking startup.
    pub async fn initialize(&self) -> AuthPhase {
        let phase = match self.auth.restore_session().await {
            Ok(session) => AuthPhase::from_notification(session.map(|s| s.user)),
            Err(error) => {
                tracing::warn!("Session restore failed: {}", error);
                AuthPhase::Unauthenticated
            }
        };
        self.signal.publish(phase.clone());
        phase
    }

    /// Sign in and publish `Authenticated` on success. A failure leaves
    /// the phase untouched; the error text is for the caller to surface.
    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let session = self.auth.sign_in(email, password).await?;
        self.signal
            .publish(AuthPhase::Authenticated(session.user.clone()));
        Ok(session)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> AuthResult<AuthSession> {
        let session = self.auth.sign_up(email, password).await?;
        self.signal
            .publish(AuthPhase::Authenticated(session.user.clone()));
        Ok(session)
    }

    /// Explicit sign-out: drop the persisted session and publish
    /// `Unauthenticated`.
    pub fn sign_out(&self) -> AuthResult<()> {
        self.auth.sign_out()?;
        self.signal.publish(AuthPhase::Unauthenticated);
        Ok(())
    }

    /// Backend-pushed session invalidation.
    pub fn invalidate(&self) {
        self.signal.publish(AuthPhase::Unauthenticated);
    }

    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        self.signal.current()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthPhase> {
        self.signal.subscribe()
    }

    #[must_use]
    pub const fn auth(&self) -> &FirebaseAuthClient<S> {
        &self.auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            email: None,
            display_name: None,
        }
    }

    #[test]
    fn signal_starts_initializing() {
        let signal = SessionSignal::new();
        assert_eq!(signal.current(), AuthPhase::Initializing);
    }

    #[test]
    fn notification_mapping() {
        assert_eq!(
            AuthPhase::from_notification(None),
            AuthPhase::Unauthenticated
        );
        assert_eq!(
            AuthPhase::from_notification(Some(user("u1"))),
            AuthPhase::Authenticated(user("u1"))
        );
    }

    #[test]
    fn readers_observe_published_phases_in_order() {
        let signal = SessionSignal::new();
        let mut rx = signal.subscribe();

        signal.publish(AuthPhase::Unauthenticated);
        signal.publish(AuthPhase::Authenticated(user("u1")));

        // watch keeps only the latest value; a late reader sees the
        // current snapshot, never an intermediate one.
        assert!(rx.has_changed().unwrap());
        assert_eq!(
            *rx.borrow_and_update(),
            AuthPhase::Authenticated(user("u1"))
        );

        signal.publish(AuthPhase::Unauthenticated);
        assert_eq!(*rx.borrow_and_update(), AuthPhase::Unauthenticated);
    }

    #[test]
    fn publish_without_readers_is_fine() {
        let signal = SessionSignal::new();
        signal.publish(AuthPhase::Unauthenticated);
        assert_eq!(signal.current(), AuthPhase::Unauthenticated);
    }
}
