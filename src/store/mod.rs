//! A namespaced document store for profiles, settings, and transactions.
//!
//! Documents are JSON objects addressed by slash separated paths. A path with
//! an even number of segments names a document (`users/u1`), a path with an
//! odd number names a collection of documents (`users/u1/transactions`).

mod sqlite;

use std::fmt::Display;

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::Error;

pub use sqlite::{SqliteDocumentStore, create_document_table};

/// The fields of a stored document.
pub type Document = serde_json::Map<String, Value>;

/// A validated path to a document or a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath(String);

impl DocumentPath {
    /// Parse a path from its segments, e.g. `["users", "u1", "transactions"]`.
    ///
    /// # Errors
    /// Returns [Error::InvalidPath] if there are no segments, or a segment is
    /// empty or contains a slash.
    pub fn new(segments: &[&str]) -> Result<Self, Error> {
        let is_valid = !segments.is_empty()
            && segments
                .iter()
                .all(|segment| !segment.trim().is_empty() && !segment.contains('/'));

        if !is_valid {
            return Err(Error::InvalidPath(segments.join("/")));
        }

        Ok(Self(segments.join("/")))
    }

    /// Whether the path names a document rather than a collection.
    pub fn is_document(&self) -> bool {
        self.0.split('/').count() % 2 == 0
    }

    /// The path of the document or collection `id` inside this path.
    ///
    /// # Errors
    /// Returns [Error::InvalidPath] if `id` is not a valid segment.
    pub fn child(&self, id: &str) -> Result<Self, Error> {
        let mut segments: Vec<&str> = self.0.split('/').collect();
        segments.push(id);
        Self::new(&segments)
    }

    /// The last segment of the path.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The path of the collection that contains this document.
    pub fn parent(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(parent, _)| parent)
    }

    /// The path as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn expect_document(&self) -> Result<(), Error> {
        if self.is_document() {
            Ok(())
        } else {
            Err(Error::InvalidPath(self.0.clone()))
        }
    }

    pub(crate) fn expect_collection(&self) -> Result<(), Error> {
        if self.is_document() {
            Err(Error::InvalidPath(self.0.clone()))
        } else {
            Ok(())
        }
    }
}

impl Display for DocumentPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A store of JSON documents.
///
/// Implementations must be cheap to clone; clones share the same storage.
pub trait DocumentStore: Clone + Send + Sync + 'static {
    /// Read the document at `path`, or `None` if there is no such document.
    fn get(&self, path: &DocumentPath) -> Result<Option<Document>, Error>;

    /// Write `document` to `path`, replacing any existing document.
    fn set(&self, path: &DocumentPath, document: Document) -> Result<(), Error>;

    /// Write `fields` into the existing document at `path`.
    ///
    /// Fields not in `fields` keep their current values.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if there is no document at `path`.
    fn merge(&self, path: &DocumentPath, fields: Document) -> Result<(), Error>;

    /// Write `document` into `collection` under a newly generated ID and
    /// return the path of the new document.
    fn add(&self, collection: &DocumentPath, document: Document) -> Result<DocumentPath, Error>;

    /// Every document directly inside `collection`, in the order they were
    /// first written.
    fn list(&self, collection: &DocumentPath) -> Result<Vec<(DocumentPath, Document)>, Error>;
}

/// Convert a serializable struct into document fields.
///
/// # Errors
/// Returns [Error::JSONSerializationError] if `value` does not serialize to
/// a JSON object.
pub fn to_document<T: Serialize>(value: &T) -> Result<Document, Error> {
    match serde_json::to_value(value)? {
        Value::Object(document) => Ok(document),
        other => Err(Error::JSONSerializationError(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Convert document fields back into a struct.
pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T, Error> {
    serde_json::from_value(Value::Object(document)).map_err(Error::from)
}
