//! Keeps one [SessionManager] per signed in browser client.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use crate::{
    identity::{IdentityConfig, SqliteIdentityService},
    store::SqliteDocumentStore,
};

use super::{ClientId, SessionManager};

/// The session manager the server runs with.
pub type AppSession = SessionManager<SqliteIdentityService, SqliteDocumentStore>;

struct Entry {
    session: Arc<AppSession>,
    last_seen: OffsetDateTime,
}

/// Maps client IDs to their session managers.
///
/// Only sessions that signed in are kept. A session is dropped on log out or
/// once its client has not been seen for longer than the session lifetime,
/// which matches how long the client cookie lasts. Clones share the same
/// sessions.
#[derive(Clone)]
pub struct SessionRegistry {
    db_connection: Arc<Mutex<Connection>>,
    identity_config: IdentityConfig,
    session_lifetime: Duration,
    sessions: Arc<Mutex<HashMap<ClientId, Entry>>>,
}

impl SessionRegistry {
    /// Create an empty registry whose sessions share `db_connection` and
    /// expire after `session_lifetime` without a request.
    pub fn new(
        db_connection: Arc<Mutex<Connection>>,
        identity_config: IdentityConfig,
        session_lifetime: Duration,
    ) -> Self {
        Self {
            db_connection,
            identity_config,
            session_lifetime,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The session of `client_id`, if it has one that has not expired.
    ///
    /// Counts as activity and pushes the expiry back.
    pub fn get(&self, client_id: &ClientId) -> Option<Arc<AppSession>> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        let entry = sessions.get_mut(client_id)?;
        if now - entry.last_seen > self.session_lifetime {
            let expired = sessions.remove(client_id);
            drop(sessions);
            if let Some(expired) = expired {
                expired.session.shutdown();
            }
            return None;
        }

        entry.last_seen = now;
        Some(entry.session.clone())
    }

    /// A new session that nobody is signed in to.
    ///
    /// It is not kept, see [SessionRegistry::insert].
    pub fn new_session(&self) -> Arc<AppSession> {
        Arc::new(SessionManager::new(
            self.identity_client(),
            SqliteDocumentStore::new(self.db_connection.clone()),
        ))
    }

    /// Keep `session` as the session of `client_id`, replacing any older one.
    ///
    /// Sessions that have expired are dropped at the same time.
    pub fn insert(&self, client_id: &ClientId, session: Arc<AppSession>) {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);

        let mut dropped = self.take_expired(&mut sessions, now);
        let entry = Entry {
            session: session.clone(),
            last_seen: now,
        };
        if let Some(previous) = sessions.insert(client_id.clone(), entry)
            && !Arc::ptr_eq(&previous.session, &session)
        {
            dropped.push(previous.session);
        }
        drop(sessions);

        for session in dropped {
            session.shutdown();
        }
    }

    /// Shut down and forget the session of `client_id`.
    pub fn remove(&self, client_id: &ClientId) {
        let entry = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(client_id);

        if let Some(entry) = entry {
            entry.session.shutdown();
        }
    }

    /// A fresh identity client with nobody signed in, for the account
    /// operations that do not belong to a session such as applying action
    /// codes from emails.
    pub fn identity_client(&self) -> SqliteIdentityService {
        SqliteIdentityService::new(self.db_connection.clone(), self.identity_config.clone())
    }

    fn take_expired(
        &self,
        sessions: &mut HashMap<ClientId, Entry>,
        now: OffsetDateTime,
    ) -> Vec<Arc<AppSession>> {
        let expired: Vec<ClientId> = sessions
            .iter()
            .filter(|(_, entry)| now - entry.last_seen > self.session_lifetime)
            .map(|(client_id, _)| client_id.clone())
            .collect();

        expired
            .iter()
            .filter_map(|client_id| sessions.remove(client_id))
            .map(|entry| entry.session)
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    fn set_last_seen(&self, client_id: &ClientId, last_seen: OffsetDateTime) {
        if let Some(entry) = self
            .sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(client_id)
        {
            entry.last_seen = last_seen;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::{Duration, OffsetDateTime};

    use crate::{
        session::{ClientId, DEFAULT_COOKIE_DURATION},
        test_utils::{RecordingMailer, get_test_connection, test_identity_config},
    };

    use super::SessionRegistry;

    fn get_test_registry() -> SessionRegistry {
        SessionRegistry::new(
            get_test_connection(),
            test_identity_config(&RecordingMailer::default()),
            DEFAULT_COOKIE_DURATION,
        )
    }

    #[test]
    fn new_session_is_not_kept() {
        let registry = get_test_registry();

        registry.new_session();

        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn get_returns_inserted_session() {
        let registry = get_test_registry();
        let client_id = ClientId::new_random();
        let session = registry.new_session();

        registry.insert(&client_id, session.clone());

        let got = registry.get(&client_id).unwrap();
        assert!(Arc::ptr_eq(&got, &session));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn clients_get_separate_sessions() {
        let registry = get_test_registry();
        let first_id = ClientId::new_random();
        let second_id = ClientId::new_random();
        registry.insert(&first_id, registry.new_session());
        registry.insert(&second_id, registry.new_session());

        let first = registry.get(&first_id).unwrap();
        let second = registry.get(&second_id).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn remove_forgets_session() {
        let registry = get_test_registry();
        let client_id = ClientId::new_random();
        registry.insert(&client_id, registry.new_session());

        registry.remove(&client_id);

        assert!(registry.get(&client_id).is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn idle_session_expires() {
        let registry = get_test_registry();
        let client_id = ClientId::new_random();
        registry.insert(&client_id, registry.new_session());

        registry.set_last_seen(
            &client_id,
            OffsetDateTime::now_utc() - DEFAULT_COOKIE_DURATION - Duration::minutes(1),
        );

        assert!(registry.get(&client_id).is_none());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn insert_drops_expired_sessions_of_other_clients() {
        let registry = get_test_registry();
        let idle_client = ClientId::new_random();
        let active_client = ClientId::new_random();
        registry.insert(&idle_client, registry.new_session());
        registry.insert(&active_client, registry.new_session());
        registry.set_last_seen(
            &idle_client,
            OffsetDateTime::now_utc() - DEFAULT_COOKIE_DURATION - Duration::minutes(1),
        );

        registry.insert(&ClientId::new_random(), registry.new_session());

        assert_eq!(registry.len(), 2);
        assert!(registry.get(&idle_client).is_none());
        assert!(registry.get(&active_client).is_some());
    }
}
