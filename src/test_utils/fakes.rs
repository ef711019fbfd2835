//! Test doubles for the mailer, the database and the document store.

use std::sync::{Arc, Mutex, PoisonError};

use rusqlite::Connection;

use crate::{
    AppState, Error,
    db::initialize,
    identity::{ActionKind, AuthEmail, IdentityConfig, Mailer},
    session::{AppSession, ClientId, NewProfile, SessionRegistry},
    store::{Document, DocumentPath, DocumentStore},
};

/// A password strong enough to pass validation.
pub(crate) const TEST_PASSWORD: &str = "correct horse battery staple";

/// An initialized in-memory database.
pub(crate) fn get_test_connection() -> Arc<Mutex<Connection>> {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");

    Arc::new(Mutex::new(connection))
}

/// Identity settings with a cheap hash cost that send email to `mailer`.
pub(crate) fn test_identity_config(mailer: &RecordingMailer) -> IdentityConfig {
    IdentityConfig {
        public_url: "http://localhost:3000".to_owned(),
        password_cost: 4,
        mailer: Arc::new(mailer.clone()),
    }
}

/// App state over a fresh in-memory database in UTC.
pub(crate) fn get_test_app_state(mailer: &RecordingMailer) -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");

    AppState::new(connection, "foobar", "Etc/UTC", test_identity_config(mailer))
        .expect("Could not create app state")
}

/// Register `email` with a verified address and leave it signed out.
pub(crate) fn create_verified_account(
    registry: &SessionRegistry,
    mailer: &RecordingMailer,
    email: &str,
    details: NewProfile,
) {
    let session = registry.new_session();
    session
        .sign_up(email, TEST_PASSWORD, details)
        .expect("Could not sign up");
    let code = mailer
        .last_code(ActionKind::VerifyEmail)
        .expect("No verification email was sent");
    registry
        .identity_client()
        .apply_action_code(&code)
        .expect("Could not verify email");
    session.shutdown();
}

/// A new client signed in to a new verified account for `email`.
pub(crate) fn signed_in_session(
    registry: &SessionRegistry,
    mailer: &RecordingMailer,
    email: &str,
) -> (ClientId, Arc<AppSession>) {
    create_verified_account(registry, mailer, email, NewProfile::default());

    let client_id = ClientId::new_random();
    let session = registry.new_session();
    registry.insert(&client_id, session.clone());
    session
        .sign_in(email, TEST_PASSWORD)
        .expect("Could not sign in");

    (client_id, session)
}

/// Keeps every email sent instead of delivering it.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingMailer {
    emails: Arc<Mutex<Vec<AuthEmail>>>,
}

impl RecordingMailer {
    pub(crate) fn emails(&self) -> Vec<AuthEmail> {
        self.emails
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The code of the latest email of `kind`.
    pub(crate) fn last_code(&self, kind: ActionKind) -> Option<String> {
        self.emails()
            .into_iter()
            .rev()
            .find(|email| email.kind == kind)
            .map(|email| email.code)
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, email: AuthEmail) {
        self.emails
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(email);
    }
}

/// A document store where every operation fails.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FailingDocumentStore;

impl DocumentStore for FailingDocumentStore {
    fn get(&self, _path: &DocumentPath) -> Result<Option<Document>, Error> {
        Err(Error::DatabaseLockError)
    }

    fn set(&self, _path: &DocumentPath, _document: Document) -> Result<(), Error> {
        Err(Error::DatabaseLockError)
    }

    fn merge(&self, _path: &DocumentPath, _fields: Document) -> Result<(), Error> {
        Err(Error::DatabaseLockError)
    }

    fn add(&self, _collection: &DocumentPath, _document: Document) -> Result<DocumentPath, Error> {
        Err(Error::DatabaseLockError)
    }

    fn list(&self, _collection: &DocumentPath) -> Result<Vec<(DocumentPath, Document)>, Error> {
        Err(Error::DatabaseLockError)
    }
}

/// A document store that only records the documents added to collections.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordingDocumentStore {
    writes: Arc<Mutex<Vec<(DocumentPath, Document)>>>,
}

impl RecordingDocumentStore {
    /// The collection and document of every call to `add`, oldest first.
    pub(crate) fn writes(&self) -> Vec<(DocumentPath, Document)> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl DocumentStore for RecordingDocumentStore {
    fn get(&self, _path: &DocumentPath) -> Result<Option<Document>, Error> {
        Ok(None)
    }

    fn set(&self, _path: &DocumentPath, _document: Document) -> Result<(), Error> {
        Ok(())
    }

    fn merge(&self, _path: &DocumentPath, _fields: Document) -> Result<(), Error> {
        Err(Error::NotFound)
    }

    fn add(&self, collection: &DocumentPath, document: Document) -> Result<DocumentPath, Error> {
        let mut writes = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        writes.push((collection.clone(), document));

        collection.child(&format!("doc{}", writes.len()))
    }

    fn list(&self, collection: &DocumentPath) -> Result<Vec<(DocumentPath, Document)>, Error> {
        Ok(self
            .writes()
            .into_iter()
            .filter(|(path, _)| path == collection)
            .collect())
    }
}
