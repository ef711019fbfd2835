//! Transactions: the data model, the entry form and its endpoints.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the builder that validates new transactions
//! - Store functions for adding and listing a user's transactions
//! - The entry form state with its validation and submit logic
//! - The dialog markup and the endpoints it talks to

mod core;
mod create_endpoint;
mod entry_form;
mod form;

pub use core::{Transaction, TransactionType, create_transaction, list_transactions};
pub use create_endpoint::{
    TRANSACTION_CREATED_EVENT, create_transaction_endpoint, get_amount_preview,
    get_category_field,
};
pub use entry_form::{TransactionEntryForm, TransactionFormData};
pub use form::{add_transaction_button, transaction_dialog};
