//! Defines the core data model and store queries for transactions.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    store::{DocumentPath, DocumentStore, from_document, to_document},
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    #[default]
    Expense,
}

impl TransactionType {
    /// The categories a transaction of this type may be filed under, in the
    /// order they are offered to the user.
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            TransactionType::Income => INCOME_CATEGORIES,
            TransactionType::Expense => EXPENSE_CATEGORIES,
        }
    }

    /// Whether `category` is one of [TransactionType::categories].
    pub fn has_category(self, category: &str) -> bool {
        self.categories().contains(&category)
    }

    /// The capitalised name, e.g. "Income".
    pub fn title(self) -> &'static str {
        match self {
            TransactionType::Income => "Income",
            TransactionType::Expense => "Expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Income => f.write_str("income"),
            TransactionType::Expense => f.write_str("expense"),
        }
    }
}

const EXPENSE_CATEGORIES: &[&str] = &[
    "Food & Dining",
    "Shopping",
    "Transportation",
    "Bills & Utilities",
    "Entertainment",
    "Healthcare",
    "Education",
    "Travel",
    "Personal Care",
    "Other",
];

const INCOME_CATEGORIES: &[&str] = &[
    "Salary",
    "Freelance",
    "Business",
    "Investments",
    "Rental Income",
    "Gifts",
    "Other",
];

/// An income or expense recorded by a user.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// How much money was earned or spent, always greater than zero.
    pub amount: f64,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// One of the categories of `transaction_type`.
    pub category: String,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
    /// The ISO 4217 code of the currency `amount` is in.
    pub currency: String,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// The ID of the account that owns the transaction.
    pub user_id: String,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: f64,
        transaction_type: TransactionType,
        category: &str,
        date: Date,
    ) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            transaction_type,
            category: category.to_owned(),
            description: String::new(),
            date,
            currency: "USD".to_owned(),
        }
    }
}

/// A builder for creating [Transaction] instances.
///
/// Call `finalize()` with the owner and creation time to validate the
/// builder and create the actual [Transaction].
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    amount: f64,
    transaction_type: TransactionType,
    category: String,
    description: String,
    date: Date,
    currency: String,
}

impl TransactionBuilder {
    /// Set the description for the transaction.
    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_owned();
        self
    }

    /// Set the currency code, e.g. "NZD".
    pub fn currency(mut self, currency: &str) -> Self {
        self.currency = currency.to_owned();
        self
    }

    /// Check the amount and category and create the transaction.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] if the amount is not a finite number
    /// greater than zero, or [Error::InvalidCategory] if the category does
    /// not belong to the transaction type.
    pub fn finalize(self, user_id: &str, created_at: OffsetDateTime) -> Result<Transaction, Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount.to_string()));
        }

        if !self.transaction_type.has_category(&self.category) {
            return Err(Error::InvalidCategory {
                category: self.category,
                transaction_type: self.transaction_type,
            });
        }

        Ok(Transaction {
            amount: self.amount,
            transaction_type: self.transaction_type,
            category: self.category,
            description: self.description,
            date: self.date,
            currency: self.currency,
            created_at,
            user_id: user_id.to_owned(),
        })
    }
}

// ============================================================================
// QUERIES
// ============================================================================

/// The collection that holds the transactions of the account `user_id`.
pub fn transactions_path(user_id: &str) -> Result<DocumentPath, Error> {
    DocumentPath::new(&["users", user_id, "transactions"])
}

/// Write `transaction` into its owner's transactions and return its path.
///
/// # Errors
/// Returns an error if the store rejects the write.
pub fn create_transaction<S: DocumentStore>(
    transaction: &Transaction,
    store: &S,
) -> Result<DocumentPath, Error> {
    store.add(
        &transactions_path(&transaction.user_id)?,
        to_document(transaction)?,
    )
}

/// Every transaction of `user_id`, newest date first.
pub fn list_transactions<S: DocumentStore>(
    user_id: &str,
    store: &S,
) -> Result<Vec<Transaction>, Error> {
    let mut transactions = store
        .list(&transactions_path(user_id)?)?
        .into_iter()
        .map(|(_, document)| from_document::<Transaction>(document))
        .collect::<Result<Vec<_>, _>>()?;

    transactions.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    Ok(transactions)
}
