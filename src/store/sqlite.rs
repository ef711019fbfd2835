//! A [DocumentStore] that keeps JSON documents in a SQLite table.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::Error;

use super::{Document, DocumentPath, DocumentStore};

/// Stores documents in the `document` table of the application database.
#[derive(Debug, Clone)]
pub struct SqliteDocumentStore {
    db_connection: Arc<Mutex<Connection>>,
}

impl SqliteDocumentStore {
    /// Create a store over `db_connection`.
    ///
    /// The table must already exist, see [create_document_table].
    pub fn new(db_connection: Arc<Mutex<Connection>>) -> Self {
        Self { db_connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            Error::DatabaseLockError
        })
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get(&self, path: &DocumentPath) -> Result<Option<Document>, Error> {
        path.expect_document()?;

        let connection = self.lock()?;
        let data: Option<String> = connection
            .query_row(
                "SELECT data FROM document WHERE path = ?1",
                (path.as_str(),),
                |row| row.get(0),
            )
            .optional()?;

        data.map(|data| parse_document(&data)).transpose()
    }

    fn set(&self, path: &DocumentPath, document: Document) -> Result<(), Error> {
        path.expect_document()?;
        let data = serde_json::to_string(&document)?;

        self.lock()?.execute(
            "INSERT INTO document (path, collection, data) VALUES (?1, ?2, ?3)
             ON CONFLICT(path) DO UPDATE SET data = excluded.data",
            (path.as_str(), path.parent().unwrap_or_default(), data),
        )?;

        Ok(())
    }

    fn merge(&self, path: &DocumentPath, fields: Document) -> Result<(), Error> {
        path.expect_document()?;

        let connection = self.lock()?;
        let transaction = connection.unchecked_transaction()?;

        let data: String = transaction
            .query_row(
                "SELECT data FROM document WHERE path = ?1",
                (path.as_str(),),
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        let mut document = parse_document(&data)?;
        document.extend(fields);

        transaction.execute(
            "UPDATE document SET data = ?1 WHERE path = ?2",
            (serde_json::to_string(&document)?, path.as_str()),
        )?;
        transaction.commit()?;

        Ok(())
    }

    fn add(&self, collection: &DocumentPath, document: Document) -> Result<DocumentPath, Error> {
        collection.expect_collection()?;

        let path = collection.child(&Uuid::new_v4().simple().to_string())?;
        self.set(&path, document)?;

        Ok(path)
    }

    fn list(&self, collection: &DocumentPath) -> Result<Vec<(DocumentPath, Document)>, Error> {
        collection.expect_collection()?;

        let connection = self.lock()?;
        let mut statement = connection
            .prepare("SELECT path, data FROM document WHERE collection = ?1 ORDER BY rowid")?;

        let rows = statement
            .query_map((collection.as_str(),), |row| {
                let path: String = row.get(0)?;
                let data: String = row.get(1)?;
                Ok((path, data))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(path, data)| {
                let segments: Vec<&str> = path.split('/').collect();
                Ok((DocumentPath::new(&segments)?, parse_document(&data)?))
            })
            .collect()
    }
}

fn parse_document(data: &str) -> Result<Document, Error> {
    serde_json::from_str(data).map_err(Error::from)
}

/// Create the document table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_document_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS document (
                path TEXT PRIMARY KEY,
                collection TEXT NOT NULL,
                data TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_document_collection ON document(collection);",
        (),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        Error,
        store::{Document, DocumentPath, DocumentStore},
        test_utils::get_test_connection,
    };

    use super::SqliteDocumentStore;

    fn get_test_store() -> SqliteDocumentStore {
        SqliteDocumentStore::new(get_test_connection())
    }

    fn document(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(document) => document,
            _ => panic!("test documents must be JSON objects"),
        }
    }

    fn path(raw: &str) -> DocumentPath {
        let segments: Vec<&str> = raw.split('/').collect();
        DocumentPath::new(&segments).unwrap()
    }

    #[test]
    fn get_missing_document_returns_none() {
        let store = get_test_store();

        assert_eq!(store.get(&path("users/u1")), Ok(None));
    }

    #[test]
    fn set_replaces_whole_document() {
        let store = get_test_store();
        let profile = path("users/u1");
        store
            .set(&profile, document(json!({"first_name": "Jane", "city": "Auckland"})))
            .unwrap();

        store
            .set(&profile, document(json!({"first_name": "Janet"})))
            .unwrap();

        assert_eq!(
            store.get(&profile).unwrap(),
            Some(document(json!({"first_name": "Janet"})))
        );
    }

    #[test]
    fn merge_keeps_unspecified_fields() {
        let store = get_test_store();
        let profile = path("users/u1");
        store
            .set(&profile, document(json!({"first_name": "Jane", "city": "Auckland"})))
            .unwrap();

        store
            .merge(&profile, document(json!({"city": "Wellington", "phone": "021"})))
            .unwrap();

        assert_eq!(
            store.get(&profile).unwrap(),
            Some(document(
                json!({"first_name": "Jane", "city": "Wellington", "phone": "021"})
            ))
        );
    }

    #[test]
    fn merge_fails_on_missing_document() {
        let store = get_test_store();

        let result = store.merge(&path("users/u1"), document(json!({"city": "Wellington"})));

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn add_and_list_documents_in_collection() {
        let store = get_test_store();
        let transactions = path("users/u1/transactions");
        let other_user = path("users/u2/transactions");

        let first = store
            .add(&transactions, document(json!({"amount": 1.0})))
            .unwrap();
        let second = store
            .add(&transactions, document(json!({"amount": 2.0})))
            .unwrap();
        store
            .add(&other_user, document(json!({"amount": 3.0})))
            .unwrap();

        let listed = store.list(&transactions).unwrap();

        assert_eq!(
            listed,
            vec![
                (first, document(json!({"amount": 1.0}))),
                (second, document(json!({"amount": 2.0}))),
            ]
        );
    }

    #[test]
    fn rejects_wrong_kind_of_path() {
        let store = get_test_store();

        assert!(matches!(
            store.get(&path("users")),
            Err(Error::InvalidPath(_))
        ));
        assert!(matches!(
            store.add(&path("users/u1"), Document::new()),
            Err(Error::InvalidPath(_))
        ));
    }
}
