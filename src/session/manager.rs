//! The session manager: the single owner of "who is signed in" for one client.

use std::sync::{Arc, Mutex, PoisonError};

use time::OffsetDateTime;
use tokio::sync::watch;

use crate::{
    Error,
    currency::CurrencyFormatter,
    identity::{Identity, IdentityService, Subscription},
    store::{DocumentStore, from_document, to_document},
};

use super::profile::{
    NewProfile, ProfileUpdate, UserProfile, UserSettings, profile_path, settings_path,
};

/// A snapshot of one client's session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The signed in account, if any.
    pub identity: Option<Identity>,
    /// The cached profile of the signed in account.
    ///
    /// Only set when `identity` is set and the profile document exists.
    pub profile: Option<UserProfile>,
    /// Whether the first auth state has not been received yet.
    pub loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            identity: None,
            profile: None,
            loading: true,
        }
    }
}

/// The coarse state of a [Session].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the identity service to report the first auth state.
    Loading,
    /// An account is signed in. The profile may still be missing.
    Authenticated,
    /// Nobody is signed in.
    Anonymous,
}

impl Session {
    /// Which phase the session is in.
    pub fn phase(&self) -> SessionPhase {
        match (&self.identity, self.loading) {
            (_, true) => SessionPhase::Loading,
            (Some(_), false) => SessionPhase::Authenticated,
            (None, false) => SessionPhase::Anonymous,
        }
    }

    /// Whether an account is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.phase() == SessionPhase::Authenticated
    }
}

/// Owns the [Session] of one client and mediates every operation that
/// changes who is signed in.
///
/// The session is only ever written by the manager's own methods and by its
/// auth state listener. Everybody else gets read-only snapshots through
/// [SessionManager::session] or a receiver from [SessionManager::subscribe].
pub struct SessionManager<I, D> {
    identity: Arc<I>,
    store: D,
    state: Arc<watch::Sender<Session>>,
    subscription: Mutex<Option<Subscription>>,
}

impl<I, D> SessionManager<I, D>
where
    I: IdentityService,
    D: DocumentStore,
{
    /// Create a manager and subscribe it to auth state changes of `identity`.
    pub fn new(identity: I, store: D) -> Self {
        let identity = Arc::new(identity);
        let (state, _) = watch::channel(Session::default());
        let state = Arc::new(state);

        let subscription = {
            let state = state.clone();
            let store = store.clone();

            identity.on_auth_state_changed(Arc::new(move |user: Option<&Identity>| {
                apply_auth_state(&state, &store, user);
            }))
        };

        Self {
            identity,
            store,
            state,
            subscription: Mutex::new(Some(subscription)),
        }
    }

    /// The identity service client this manager is subscribed to.
    pub fn identity(&self) -> &I {
        &self.identity
    }

    /// The document store profiles and settings are kept in.
    pub fn store(&self) -> &D {
        &self.store
    }

    /// A snapshot of the current session.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// A receiver that sees every change to the session.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// Wait until the first auth state has been received and return the
    /// session at that point.
    pub async fn wait_until_ready(&self) -> Session {
        let mut receiver = self.state.subscribe();

        match receiver.wait_for(|session| !session.loading).await {
            Ok(session) => session.clone(),
            Err(_) => self.session(),
        }
    }

    /// Sign in with an email and password.
    ///
    /// Accounts that have not verified their email address are signed back
    /// out straight away.
    ///
    /// # Errors
    /// Returns [Error::InvalidCredentials] for a wrong email or password and
    /// [Error::UnverifiedEmail] if the account's email is not verified.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Identity, Error> {
        let identity = self
            .identity
            .sign_in_with_email_and_password(email, password)?;

        if !identity.email_verified {
            tracing::info!("Rejecting sign in for unverified account {}", identity.uid);
            self.identity.sign_out()?;
            return Err(Error::UnverifiedEmail);
        }

        Ok(identity)
    }

    /// Register a new account with its profile and default settings, then
    /// send a verification email.
    ///
    /// The client is always signed out afterwards, the new user has to verify
    /// their email and sign in separately.
    ///
    /// # Errors
    /// Returns [Error::EmailAlreadyInUse] if the email is taken.
    pub fn sign_up(&self, email: &str, password: &str, details: NewProfile) -> Result<(), Error> {
        let identity = self
            .identity
            .create_user_with_email_and_password(email, password)?;

        let created = self.create_account_documents(&identity, details);
        let signed_out = self.identity.sign_out();

        created?;
        signed_out?;

        Ok(())
    }

    fn create_account_documents(&self, identity: &Identity, details: NewProfile) -> Result<(), Error> {
        let profile = UserProfile::new(&identity.email, details, OffsetDateTime::now_utc());

        self.store
            .set(&profile_path(&identity.uid)?, to_document(&profile)?)?;
        self.store.set(
            &settings_path(&identity.uid)?,
            to_document(&UserSettings::default())?,
        )?;
        self.identity.send_email_verification(identity)?;

        Ok(())
    }

    /// Sign out and forget the cached profile.
    pub fn logout(&self) -> Result<(), Error> {
        self.identity.sign_out()?;

        Ok(())
    }

    /// Send a password reset email to `email`.
    ///
    /// # Errors
    /// Returns [Error::NoAccountFound] if no account uses `email`.
    pub fn reset_password(&self, email: &str) -> Result<(), Error> {
        self.identity.send_password_reset_email(email)?;

        Ok(())
    }

    /// Send a verification email to the signed in account.
    ///
    /// Returns `false` without sending anything if nobody is signed in or the
    /// email is already verified.
    ///
    /// # Errors
    /// Returns [Error::RateLimited] if an email was sent very recently.
    pub fn verify_email(&self) -> Result<bool, Error> {
        match self.identity.current_user() {
            Some(identity) if !identity.email_verified => {
                self.identity.send_email_verification(&identity)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Merge `update` into the signed in user's profile and refresh the
    /// cached copy.
    ///
    /// # Errors
    /// Returns [Error::NotAuthenticated] if nobody is signed in.
    pub fn update_user_profile(&self, update: ProfileUpdate) -> Result<(), Error> {
        self.update_user_profile_at(update, OffsetDateTime::now_utc())
    }

    fn update_user_profile_at(
        &self,
        update: ProfileUpdate,
        now: OffsetDateTime,
    ) -> Result<(), Error> {
        let uid = self
            .state
            .borrow()
            .identity
            .as_ref()
            .map(|identity| identity.uid.clone())
            .ok_or(Error::NotAuthenticated)?;

        let path = profile_path(&uid)?;
        self.store
            .merge(&path, update.into_fields(now)?)?;

        let profile = load_profile(&self.store, &uid)?;
        self.state.send_modify(|session| {
            if session.identity.as_ref().is_some_and(|identity| identity.uid == uid) {
                session.profile = profile;
            }
        });

        Ok(())
    }

    /// The signed in user's settings, or the defaults if none are stored.
    ///
    /// # Errors
    /// Returns [Error::NotAuthenticated] if nobody is signed in.
    pub fn user_settings(&self) -> Result<UserSettings, Error> {
        let uid = self
            .state
            .borrow()
            .identity
            .as_ref()
            .map(|identity| identity.uid.clone())
            .ok_or(Error::NotAuthenticated)?;

        match self.store.get(&settings_path(&uid)?)? {
            Some(document) => from_document(document),
            None => Ok(UserSettings::default()),
        }
    }

    /// A formatter for the currency in the signed in user's settings.
    ///
    /// Falls back to the default currency if the settings cannot be read.
    pub fn currency_formatter(&self) -> CurrencyFormatter {
        match self.user_settings() {
            Ok(settings) => CurrencyFormatter::new(&settings.currency),
            Err(error) => {
                tracing::warn!("Could not get user settings, using the default currency: {error}");
                CurrencyFormatter::default()
            }
        }
    }

    /// Stop listening to auth state changes.
    pub fn shutdown(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
    }
}

/// Update the session for a new auth state.
///
/// For a signed in user the identity is published first with no profile, then
/// the profile is fetched, and only then is loading cleared.
fn apply_auth_state<D: DocumentStore>(
    state: &watch::Sender<Session>,
    store: &D,
    identity: Option<&Identity>,
) {
    let Some(identity) = identity else {
        state.send_modify(|session| {
            session.identity = None;
            session.profile = None;
            session.loading = false;
        });
        return;
    };

    state.send_modify(|session| {
        session.identity = Some(identity.clone());
        session.profile = None;
    });

    let profile = match load_profile(store, &identity.uid) {
        Ok(profile) => profile,
        Err(error) => {
            tracing::error!("Could not fetch the profile for {}: {error}", identity.uid);
            None
        }
    };

    // The client may have signed out or switched accounts during the fetch.
    state.send_modify(|session| {
        if session
            .identity
            .as_ref()
            .is_some_and(|current| current.uid == identity.uid)
        {
            session.profile = profile;
        }
        session.loading = false;
    });
}

fn load_profile<D: DocumentStore>(store: &D, uid: &str) -> Result<Option<UserProfile>, Error> {
    store
        .get(&profile_path(uid)?)?
        .map(from_document)
        .transpose()
}
