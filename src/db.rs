//! Creates the tables the application stores its data in.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{identity::create_identity_tables, store::create_document_table};

/// Create all the tables for accounts, action codes and documents.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_identity_tables(&transaction)?;
    create_document_table(&transaction)?;

    transaction.commit()
}
