//! An [IdentityService] backed by the application's SQLite database.
//!
//! Accounts are shared by every client, the signed in account is not: each
//! [SqliteIdentityService] value (and its clones) is one client with its own
//! current user and listeners.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use email_address::{EmailAddress, Options};
use rusqlite::{Connection, OptionalExtension};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::endpoints;

use super::{
    ActionKind, AuthEmail, AuthError, AuthStateListener, Identity, IdentityService, Listeners,
    Mailer, PasswordHash, Subscription, ValidatedPassword,
};

/// How long an account must wait before another verification email is sent.
const VERIFICATION_EMAIL_COOLDOWN: Duration = Duration::seconds(60);

/// How long verification and password reset links stay valid.
const ACTION_CODE_LIFETIME: Duration = Duration::hours(24);

/// Settings shared by every identity client.
#[derive(Clone)]
pub struct IdentityConfig {
    /// The URL the server is reachable at, used to build links in emails,
    /// e.g. "https://spendwise.example.com".
    pub public_url: String,
    /// The bcrypt cost used when hashing passwords.
    pub password_cost: u32,
    /// Where verification and password reset emails are sent.
    pub mailer: Arc<dyn Mailer>,
}

/// One client's view of the accounts stored in SQLite.
#[derive(Clone)]
pub struct SqliteIdentityService {
    db_connection: Arc<Mutex<Connection>>,
    config: IdentityConfig,
    current_user: Arc<Mutex<Option<Identity>>>,
    listeners: Listeners,
}

impl From<rusqlite::Error> for AuthError {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an unhandled SQL error occurred in the identity service: {value}");
        AuthError::Internal(value.to_string())
    }
}

struct Account {
    id: String,
    email: String,
    password_hash: PasswordHash,
    email_verified: bool,
}

impl Account {
    fn into_identity(self) -> Identity {
        Identity {
            uid: self.id,
            email: self.email,
            email_verified: self.email_verified,
        }
    }
}

impl SqliteIdentityService {
    /// Create a new client with no signed in user.
    ///
    /// The tables must already exist, see [create_identity_tables].
    pub fn new(db_connection: Arc<Mutex<Connection>>, config: IdentityConfig) -> Self {
        Self {
            db_connection,
            config,
            current_user: Arc::new(Mutex::new(None)),
            listeners: Listeners::default(),
        }
    }

    /// Mark the email address of the account `code` was issued for as verified.
    ///
    /// # Errors
    /// Returns [AuthError::InvalidActionCode] if the code is unknown, was
    /// already used, or has expired.
    pub fn apply_action_code(&self, code: &str) -> Result<(), AuthError> {
        let now = OffsetDateTime::now_utc();
        let account_id = {
            let connection = self.lock()?;
            let account = find_account_for_code(&connection, code, ActionKind::VerifyEmail, now)?;
            consume_action_code(&connection, code)?;
            connection.execute(
                "UPDATE account SET email_verified = 1 WHERE id = ?1",
                (&account.id,),
            )?;
            account.id
        };

        let verified_user = {
            let mut current_user = self
                .current_user
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            current_user
                .as_mut()
                .filter(|user| user.uid == account_id)
                .map(|user| {
                    user.email_verified = true;
                    user.clone()
                })
        };

        if let Some(user) = verified_user {
            self.listeners.notify(Some(&user));
        }

        Ok(())
    }

    /// Replace the password of the account `code` was issued for.
    ///
    /// The code is only used up once the new password has been accepted.
    ///
    /// # Errors
    /// Returns [AuthError::InvalidActionCode] if the code is not a valid
    /// password reset code, or [AuthError::WeakPassword] if `new_password`
    /// is too easy to guess.
    pub fn confirm_password_reset(&self, code: &str, new_password: &str) -> Result<(), AuthError> {
        let now = OffsetDateTime::now_utc();
        let account = {
            let connection = self.lock()?;
            find_account_for_code(&connection, code, ActionKind::ResetPassword, now)?
        };

        let password = ValidatedPassword::new(new_password, &[&account.email])?;
        let password_hash = PasswordHash::new(password, self.config.password_cost)?;

        let connection = self.lock()?;
        consume_action_code(&connection, code)?;
        connection.execute(
            "UPDATE account SET password = ?1 WHERE id = ?2",
            (password_hash.as_ref(), &account.id),
        )?;

        tracing::info!("Password reset for account {}", account.id);

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, AuthError> {
        self.db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            AuthError::Internal("could not acquire the database lock".to_owned())
        })
    }

    fn set_current_user(&self, identity: Option<Identity>) {
        *self
            .current_user
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = identity.clone();

        self.listeners.notify(identity.as_ref());
    }

    fn send_action_email(
        &self,
        connection: MutexGuard<'_, Connection>,
        account_id: &str,
        email: &str,
        kind: ActionKind,
        now: OffsetDateTime,
    ) -> Result<(), AuthError> {
        let code = Uuid::new_v4().simple().to_string();
        connection.execute(
            "INSERT INTO action_code (code, account_id, kind, created_at) VALUES (?1, ?2, ?3, ?4)",
            (&code, account_id, kind.as_str(), now),
        )?;
        drop(connection);

        let path = match kind {
            ActionKind::VerifyEmail => endpoints::VERIFY_EMAIL_VIEW,
            ActionKind::ResetPassword => endpoints::RESET_PASSWORD_VIEW,
        };
        let link = format!(
            "{}{path}?code={code}",
            self.config.public_url.trim_end_matches('/')
        );

        self.config.mailer.send(AuthEmail {
            to: email.to_owned(),
            kind,
            code,
            link,
        });

        Ok(())
    }
}

impl IdentityService for SqliteIdentityService {
    fn current_user(&self) -> Option<Identity> {
        self.current_user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let email = normalize_email(email)?;
        let account = {
            let connection = self.lock()?;
            find_account_by_email(&connection, &email)?
        }
        .ok_or(AuthError::InvalidCredential)?;

        let is_password_valid = account.password_hash.verify(password).map_err(|error| {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            AuthError::Internal(error.to_string())
        })?;

        if !is_password_valid {
            return Err(AuthError::InvalidCredential);
        }

        let identity = account.into_identity();
        self.set_current_user(Some(identity.clone()));

        Ok(identity)
    }

    fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Identity, AuthError> {
        let email = normalize_email(email)?;

        if find_account_by_email(&*self.lock()?, &email)?.is_some() {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let password = ValidatedPassword::new(password, &[&email])?;
        let password_hash = PasswordHash::new(password, self.config.password_cost)?;
        let identity = Identity {
            uid: Uuid::new_v4().to_string(),
            email,
            email_verified: false,
        };

        self.lock()?
            .execute(
                "INSERT INTO account (id, email, password, email_verified, created_at)
                 VALUES (?1, ?2, ?3, 0, ?4)",
                (
                    &identity.uid,
                    &identity.email,
                    password_hash.as_ref(),
                    OffsetDateTime::now_utc(),
                ),
            )
            .map_err(|error| match error {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error {
                        code: _,
                        extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                    },
                    _,
                ) => AuthError::EmailAlreadyInUse,
                error => error.into(),
            })?;

        tracing::info!("Created account {}", identity.uid);
        self.set_current_user(Some(identity.clone()));

        Ok(identity)
    }

    fn sign_out(&self) -> Result<(), AuthError> {
        self.set_current_user(None);
        Ok(())
    }

    fn send_email_verification(&self, identity: &Identity) -> Result<(), AuthError> {
        let now = OffsetDateTime::now_utc();
        let connection = self.lock()?;

        let last_sent: Option<OffsetDateTime> = connection
            .query_row(
                "SELECT created_at FROM action_code
                 WHERE account_id = ?1 AND kind = ?2
                 ORDER BY created_at DESC LIMIT 1",
                (&identity.uid, ActionKind::VerifyEmail.as_str()),
                |row| row.get(0),
            )
            .optional()?;

        if last_sent.is_some_and(|sent_at| now - sent_at < VERIFICATION_EMAIL_COOLDOWN) {
            return Err(AuthError::TooManyRequests);
        }

        self.send_action_email(
            connection,
            &identity.uid,
            &identity.email,
            ActionKind::VerifyEmail,
            now,
        )
    }

    fn send_password_reset_email(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email)?;
        let connection = self.lock()?;
        let account = find_account_by_email(&connection, &email)?.ok_or(AuthError::UserNotFound)?;

        self.send_action_email(
            connection,
            &account.id,
            &account.email,
            ActionKind::ResetPassword,
            OffsetDateTime::now_utc(),
        )
    }

    fn on_auth_state_changed(&self, listener: AuthStateListener) -> Subscription {
        let subscription = self.listeners.add(listener.clone());
        listener(self.current_user().as_ref());

        subscription
    }
}

/// Create the tables for accounts and action codes.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_identity_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                email_verified INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE TABLE IF NOT EXISTS action_code (
                code TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                created_at TEXT NOT NULL,
                used INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(account_id) REFERENCES account(id) ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

/// Trim and lowercase `email` and check that it is a plain email address
/// with a top level domain.
fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    let options = Options::default()
        .with_required_tld()
        .without_display_text();

    match EmailAddress::parse_with_options(&email, options) {
        Ok(_) => Ok(email),
        Err(error) => {
            tracing::debug!("Rejected email address {email:?}: {error}");
            Err(AuthError::InvalidEmail(email))
        }
    }
}

fn find_account_by_email(
    connection: &Connection,
    email: &str,
) -> Result<Option<Account>, rusqlite::Error> {
    connection
        .query_row(
            "SELECT id, email, password, email_verified FROM account WHERE email = ?1",
            (email,),
            map_account_row,
        )
        .optional()
}

/// Get the account that an unused, unexpired `code` of `kind` was issued for.
fn find_account_for_code(
    connection: &Connection,
    code: &str,
    kind: ActionKind,
    now: OffsetDateTime,
) -> Result<Account, AuthError> {
    let row: Option<(OffsetDateTime, bool, Account)> = connection
        .query_row(
            "SELECT action_code.created_at, action_code.used,
                    account.id, account.email, account.password, account.email_verified
             FROM action_code
             INNER JOIN account ON account.id = action_code.account_id
             WHERE action_code.code = ?1 AND action_code.kind = ?2",
            (code, kind.as_str()),
            |row| {
                let created_at = row.get(0)?;
                let used = row.get(1)?;
                let account = Account {
                    id: row.get(2)?,
                    email: row.get(3)?,
                    password_hash: PasswordHash::new_unchecked(&row.get::<_, String>(4)?),
                    email_verified: row.get(5)?,
                };

                Ok((created_at, used, account))
            },
        )
        .optional()?;

    match row {
        Some((created_at, false, account)) if now - created_at <= ACTION_CODE_LIFETIME => {
            Ok(account)
        }
        _ => Err(AuthError::InvalidActionCode),
    }
}

fn consume_action_code(connection: &Connection, code: &str) -> Result<(), AuthError> {
    let rows_affected = connection.execute(
        "UPDATE action_code SET used = 1 WHERE code = ?1 AND used = 0",
        (code,),
    )?;

    if rows_affected == 0 {
        return Err(AuthError::InvalidActionCode);
    }

    Ok(())
}

fn map_account_row(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    let raw_password_hash: String = row.get(2)?;

    Ok(Account {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        email_verified: row.get(3)?,
    })
}
