//! Delivery of the emails the identity service sends to account owners.

use std::fmt::Display;

/// What following the link in an [AuthEmail] does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Confirms that the account owner controls the email address.
    VerifyEmail,
    /// Lets the account owner choose a new password.
    ResetPassword,
}

impl ActionKind {
    /// The value stored in the database for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::VerifyEmail => "verify_email",
            ActionKind::ResetPassword => "reset_password",
        }
    }
}

impl Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An email containing a single-use action link.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEmail {
    /// The recipient's email address.
    pub to: String,
    /// What the link does.
    pub kind: ActionKind,
    /// The single-use code embedded in the link.
    pub code: String,
    /// The full URL the recipient should open.
    pub link: String,
}

/// Sends [AuthEmail]s.
pub trait Mailer: Send + Sync {
    /// Deliver `email`. Delivery is fire-and-forget.
    fn send(&self, email: AuthEmail);
}

/// A mailer that writes emails to the application log instead of sending them.
///
/// Useful for self-hosting without an SMTP server: the server operator can
/// copy the link from the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: AuthEmail) {
        tracing::info!("Sending {} email to {}: {}", email.kind, email.to, email.link);
    }
}
