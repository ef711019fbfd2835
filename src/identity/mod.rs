//! The identity service: who a client is signed in as, and the account
//! operations (sign in/up/out, verification and password reset emails) that
//! change it.
//!
//! The rest of the application only talks to the [IdentityService] trait.
//! [SqliteIdentityService] is the implementation the server runs with.

mod mailer;
mod password;
mod sqlite;

use std::sync::{Arc, Mutex, PoisonError, Weak};

pub use mailer::{ActionKind, AuthEmail, LogMailer, Mailer};
pub use password::{PasswordHash, ValidatedPassword};
pub use sqlite::{IdentityConfig, SqliteIdentityService, create_identity_tables};

/// An authenticated account as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The stable, unique ID of the account.
    pub uid: String,
    /// The email address the account was registered with.
    pub email: String,
    /// Whether the owner of the account has confirmed the email address.
    pub email_verified: bool,
}

/// The error codes reported by the identity service.
///
/// These are translated into the application's [crate::Error] at the
/// session boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The email and password did not match an account.
    #[error("auth/invalid-credential")]
    InvalidCredential,
    /// The email address is already registered.
    #[error("auth/email-already-in-use")]
    EmailAlreadyInUse,
    /// There is no account with the email address.
    #[error("auth/user-not-found")]
    UserNotFound,
    /// Too many requests were made for the account in a short period.
    #[error("auth/too-many-requests")]
    TooManyRequests,
    /// The email address is malformed.
    #[error("auth/invalid-email: {0}")]
    InvalidEmail(String),
    /// The password is too easy to guess, the string holds suggestions for a
    /// stronger password.
    #[error("auth/weak-password: {0}")]
    WeakPassword(String),
    /// The verification or reset code is unknown, used, or expired.
    #[error("auth/invalid-action-code")]
    InvalidActionCode,
    /// Any other failure inside the identity service.
    #[error("auth/internal-error: {0}")]
    Internal(String),
}

/// The operations a client can perform against the identity service.
///
/// Each value is one client's view of the service: it has at most one
/// signed in account at a time, reported by [IdentityService::current_user].
pub trait IdentityService: Send + Sync + 'static {
    /// The account this client is signed in as, if any.
    fn current_user(&self) -> Option<Identity>;

    /// Sign in and make the account the current user.
    ///
    /// # Errors
    /// Returns [AuthError::InvalidCredential] if the email and password do not
    /// match an account.
    fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError>;

    /// Register a new account and sign in as it.
    ///
    /// # Errors
    /// Returns [AuthError::EmailAlreadyInUse] if the email is taken, or
    /// [AuthError::WeakPassword] if the password is too easy to guess.
    fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError>;

    /// Sign out the current user, if any.
    fn sign_out(&self) -> Result<(), AuthError>;

    /// Email a verification link to the owner of `identity`.
    ///
    /// # Errors
    /// Returns [AuthError::TooManyRequests] if a link was sent very recently.
    fn send_email_verification(&self, identity: &Identity) -> Result<(), AuthError>;

    /// Email a password reset link to `email`.
    ///
    /// # Errors
    /// Returns [AuthError::UserNotFound] if there is no account for `email`.
    fn send_password_reset_email(&self, email: &str) -> Result<(), AuthError>;

    /// Register `listener` to be called with the current user now and after
    /// every sign in or sign out.
    ///
    /// The listener stays registered until the returned [Subscription] is
    /// unsubscribed or dropped.
    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription;
}

/// A callback for changes to the signed in account.
pub type AuthStateListener = Arc<dyn Fn(Option<&Identity>) + Send + Sync>;

/// A handle that keeps a listener registered.
///
/// Call [Subscription::unsubscribe] or drop the handle to remove the listener.
#[must_use = "dropping a subscription removes the listener immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a subscription that runs `teardown` when it is cancelled.
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Remove the listener.
    pub fn unsubscribe(mut self) {
        self.cancel();
    }

    fn cancel(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.teardown.is_some())
            .finish()
    }
}

#[derive(Default)]
struct ListenerSet {
    next_id: u64,
    listeners: Vec<(u64, AuthStateListener)>,
}

/// The listeners registered with one identity client.
#[derive(Clone, Default)]
pub(crate) struct Listeners {
    inner: Arc<Mutex<ListenerSet>>,
}

impl Listeners {
    /// Register `listener` and return the handle that removes it again.
    pub(crate) fn add(&self, listener: AuthStateListener) -> Subscription {
        let id = {
            let mut set = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let id = set.next_id;
            set.next_id += 1;
            set.listeners.push((id, listener));
            id
        };

        let inner: Weak<Mutex<ListenerSet>> = Arc::downgrade(&self.inner);

        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .listeners
                    .retain(|(listener_id, _)| *listener_id != id);
            }
        })
    }

    /// Call every registered listener with `identity`.
    ///
    /// The lock is released before the listeners run so that a listener may
    /// register or remove listeners itself.
    pub(crate) fn notify(&self, identity: Option<&Identity>) {
        let listeners: Vec<AuthStateListener> = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();

        for listener in listeners {
            listener(identity);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}
