//! The state and submit logic of the transaction entry form.

use serde::Deserialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    alert::{Alert, Notifier},
    currency::CurrencyFormatter,
    identity::Identity,
    store::{DocumentPath, DocumentStore},
    transaction::{Transaction, TransactionType, create_transaction},
};

/// The form data for creating a transaction, as posted by the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionFormData {
    /// The amount as typed, parsed on submit.
    #[serde(default)]
    pub amount: String,
    #[serde(rename = "type_", default)]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub date: Date,
}

/// One transaction being entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEntryForm {
    /// The amount as typed.
    pub amount: String,
    pub transaction_type: TransactionType,
    /// Empty until the user picks one of the categories of `transaction_type`.
    pub category: String,
    pub description: String,
    pub date: Date,
    /// Whether a submit is in progress.
    pub submitting: bool,
    /// Whether the form is shown.
    pub is_open: bool,
}

impl TransactionEntryForm {
    /// An empty, open form for an expense dated `today`.
    pub fn new(today: Date) -> Self {
        Self {
            amount: String::new(),
            transaction_type: TransactionType::Expense,
            category: String::new(),
            description: String::new(),
            date: today,
            submitting: false,
            is_open: true,
        }
    }

    /// An open form filled in with what the browser posted.
    pub fn from_data(data: TransactionFormData) -> Self {
        Self {
            amount: data.amount,
            transaction_type: data.transaction_type,
            category: data.category,
            description: data.description,
            date: data.date,
            submitting: false,
            is_open: true,
        }
    }

    /// Change the transaction type, clearing the category if the type changed.
    pub fn set_transaction_type(&mut self, transaction_type: TransactionType) {
        if self.transaction_type != transaction_type {
            self.transaction_type = transaction_type;
            self.category.clear();
        }
    }

    /// Clear every field back to its default.
    pub fn reset(&mut self, today: Date) {
        *self = Self {
            is_open: self.is_open,
            ..Self::new(today)
        };
    }

    /// The formatted amount shown beside the amount field.
    ///
    /// Returns `None` while the amount is empty. An amount that does not parse
    /// previews as not-a-number rather than failing.
    pub fn preview(&self, formatter: &CurrencyFormatter) -> Option<String> {
        preview_amount(&self.amount, formatter)
    }

    /// Validate the form and write the transaction for `user`.
    ///
    /// Does nothing and returns `Ok(None)` if nobody is signed in. Otherwise
    /// exactly one alert is sent to `notifier`. On success the form is reset
    /// and closed and the path of the new transaction is returned. On failure
    /// the fields are kept so the user can try again.
    ///
    /// # Errors
    /// Returns [Error::InvalidAmount] or [Error::InvalidCategory] without
    /// writing anything, or the store's error if the write failed.
    pub fn submit<S: DocumentStore, N: Notifier>(
        &mut self,
        user: Option<&Identity>,
        currency_code: &str,
        store: &S,
        notifier: &mut N,
        now: OffsetDateTime,
    ) -> Result<Option<DocumentPath>, Error> {
        let Some(user) = user else {
            return Ok(None);
        };

        self.submitting = true;
        let result = self.try_submit(user, currency_code, store, notifier, now);
        self.submitting = false;

        result.map(Some)
    }

    fn try_submit<S: DocumentStore, N: Notifier>(
        &mut self,
        user: &Identity,
        currency_code: &str,
        store: &S,
        notifier: &mut N,
        now: OffsetDateTime,
    ) -> Result<DocumentPath, Error> {
        let transaction = parse_amount(&self.amount)
            .and_then(|amount| {
                Transaction::build(amount, self.transaction_type, &self.category, self.date)
                    .description(&self.description)
                    .currency(currency_code)
                    .finalize(&user.uid, now)
            })
            .inspect_err(|error| notifier.notify(error.to_alert()))?;

        match create_transaction(&transaction, store) {
            Ok(path) => {
                tracing::info!("Created {} transaction {path}", transaction.transaction_type);
                notifier.notify(Alert::success(
                    &format!("{} added successfully", transaction.transaction_type.title()),
                    "",
                ));
                self.reset(now.date());
                self.is_open = false;

                Ok(path)
            }
            Err(error) => {
                tracing::error!(
                    "Could not add {} transaction: {error}",
                    transaction.transaction_type
                );
                notifier.notify(Alert::error(
                    &format!("Failed to add {}", transaction.transaction_type),
                    "Please try again.",
                ));

                Err(error)
            }
        }
    }
}

/// Parse the amount typed into the form.
///
/// # Errors
/// Returns [Error::InvalidAmount] if `raw` is not a number greater than zero.
pub fn parse_amount(raw: &str) -> Result<f64, Error> {
    match raw.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(Error::InvalidAmount(raw.to_owned())),
    }
}

/// Format a typed amount for the live preview, see
/// [TransactionEntryForm::preview].
pub fn preview_amount(raw: &str, formatter: &CurrencyFormatter) -> Option<String> {
    let raw = raw.trim();

    if raw.is_empty() {
        return None;
    }

    Some(formatter.format(raw.parse().unwrap_or(f64::NAN)))
}
