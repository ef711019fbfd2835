//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    alert::Alert, identity::AuthError, internal_server_error::InternalServerError,
    not_found::NotFoundError, transaction::TransactionType,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered account.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The account exists but its email address has not been verified yet.
    ///
    /// Unverified accounts are signed back out immediately after signing in.
    #[error("the email address has not been verified")]
    UnverifiedEmail,

    /// Tried to register an email address that already belongs to an account.
    #[error("an account with this email address already exists")]
    EmailAlreadyInUse,

    /// There is no account registered with the given email address.
    #[error("no account found with this email address")]
    NoAccountFound,

    /// The identity service rejected the request because too many requests
    /// were made in a short period.
    #[error("too many requests, try again later")]
    RateLimited,

    /// The operation requires a signed in user but there is none.
    #[error("no user is signed in")]
    NotAuthenticated,

    /// The amount entered for a transaction is not a number greater than zero.
    #[error("\"{0}\" is not a valid amount, enter a number greater than zero")]
    InvalidAmount(String),

    /// The category does not belong to the category list of the transaction type.
    #[error("\"{category}\" is not a valid {transaction_type} category")]
    InvalidCategory {
        /// The rejected category.
        category: String,
        /// The type of the transaction being created.
        transaction_type: TransactionType,
    },

    /// The email address is not formatted correctly.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// A verification or password reset link was invalid, already used, or expired.
    #[error("the link is invalid or has expired")]
    InvalidActionCode,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows or when
    /// merging fields into a document that does not exist.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A document path was malformed or pointed at the wrong kind of node,
    /// e.g. a collection where a document was expected.
    #[error("invalid document path \"{0}\"")]
    InvalidPath(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while serializing or deserializing a document as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error reported by the identity service that has no specific meaning
    /// to the application. The message is passed through unchanged.
    #[error("{0}")]
    Underlying(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl From<AuthError> for Error {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::InvalidCredential => Error::InvalidCredentials,
            AuthError::EmailAlreadyInUse => Error::EmailAlreadyInUse,
            AuthError::UserNotFound => Error::NoAccountFound,
            AuthError::TooManyRequests => Error::RateLimited,
            AuthError::InvalidEmail(email) => Error::InvalidEmail(email),
            AuthError::WeakPassword(feedback) => Error::TooWeak(feedback),
            AuthError::InvalidActionCode => Error::InvalidActionCode,
            AuthError::Internal(message) => Error::Underlying(message),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        (self.alert_status_code(), self.to_alert().into_html()).into_response()
    }

    /// The status code of an alert response for this error.
    pub fn alert_status_code(&self) -> StatusCode {
        match self {
            Error::InvalidAmount(_)
            | Error::InvalidCategory { .. }
            | Error::InvalidEmail(_)
            | Error::TooWeak(_)
            | Error::InvalidActionCode => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::UnverifiedEmail | Error::NotAuthenticated => {
                StatusCode::UNAUTHORIZED
            }
            Error::EmailAlreadyInUse => StatusCode::CONFLICT,
            Error::NoAccountFound | Error::NotFound => StatusCode::NOT_FOUND,
            Error::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The alert shown to the user for this error.
    ///
    /// Errors that are not meant for the client are replaced with a generic message.
    pub fn to_alert(&self) -> Alert {
        match self {
            Error::InvalidCredentials => Alert::error(
                "Could not log in",
                "The email or password is incorrect.",
            ),
            Error::UnverifiedEmail => Alert::error(
                "Email not verified",
                "Please verify your email address before logging in. \
                Check your inbox for the verification link.",
            ),
            Error::EmailAlreadyInUse => Alert::error(
                "Email already in use",
                "An account with this email address already exists. Try logging in instead.",
            ),
            Error::NoAccountFound => Alert::error(
                "No account found",
                "There is no account registered with this email address.",
            ),
            Error::RateLimited => Alert::error(
                "Too many requests",
                "Too many requests were made. Please wait a minute and try again.",
            ),
            Error::NotAuthenticated => Alert::error(
                "Not logged in",
                "Your session has ended, please log in again.",
            ),
            Error::InvalidAmount(_) => Alert::error(
                "Invalid amount",
                "Please enter a valid amount greater than zero.",
            ),
            Error::InvalidCategory {
                category,
                transaction_type,
            } => Alert::error(
                "Invalid category",
                &format!("\"{category}\" is not a {transaction_type} category."),
            ),
            Error::InvalidEmail(email) => Alert::error(
                "Invalid email",
                &format!("\"{email}\" is not a valid email address."),
            ),
            Error::TooWeak(feedback) => Alert::error("Password is too weak", feedback),
            Error::InvalidActionCode => Alert::error(
                "Invalid link",
                "The link is invalid, has already been used, or has expired.",
            ),
            Error::InvalidTimezoneError(timezone) => Alert::error(
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                Alert::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                )
            }
        }
    }
}
