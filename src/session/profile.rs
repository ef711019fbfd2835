//! The user profile and settings documents kept for each account.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    store::{Document, DocumentPath, to_document},
};

/// Personal details stored alongside an account.
///
/// The email is copied from the account at sign-up and never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// The email address the account was registered with.
    pub email: String,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The user's date of birth, if given.
    #[serde(default)]
    pub date_of_birth: Option<Date>,
    /// A contact phone number.
    #[serde(default)]
    pub phone: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// City of residence.
    #[serde(default)]
    pub city: String,
    /// Country of residence.
    #[serde(default)]
    pub country: String,
    /// The security question chosen at sign-up.
    #[serde(default)]
    pub security_question: String,
    /// The answer to the security question.
    #[serde(default)]
    pub security_answer: String,
    /// When the profile was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the profile was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl UserProfile {
    /// Create the profile for a newly registered account.
    pub fn new(email: &str, details: NewProfile, now: OffsetDateTime) -> Self {
        Self {
            email: email.to_owned(),
            first_name: details.first_name,
            last_name: details.last_name,
            date_of_birth: details.date_of_birth,
            phone: details.phone,
            address: details.address,
            city: details.city,
            country: details.country,
            security_question: details.security_question,
            security_answer: details.security_answer,
            created_at: now,
            updated_at: now,
        }
    }

    /// The name to greet the user with.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// The profile details collected by the registration form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewProfile {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<Date>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub security_question: String,
    #[serde(default)]
    pub security_answer: String,
}

/// A partial change to a [UserProfile].
///
/// Fields set to `None` are left unchanged. There is deliberately no email
/// field: the profile email never changes after sign-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_answer: Option<String>,
}

#[derive(Serialize)]
struct UpdatedAt {
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl ProfileUpdate {
    /// The fields to merge into the profile document, including the new
    /// update timestamp.
    pub fn into_fields(self, now: OffsetDateTime) -> Result<Document, Error> {
        let mut fields = to_document(&self)?;
        fields.extend(to_document(&UpdatedAt { updated_at: now })?);

        Ok(fields)
    }
}

/// The colour scheme of the web interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Per-user preferences, created with defaults at sign-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    /// The ISO 4217 code of the currency amounts are entered and shown in.
    pub currency: String,
    pub theme: Theme,
    pub email_notifications: bool,
    pub push_notifications: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            currency: "USD".to_owned(),
            theme: Theme::Light,
            email_notifications: true,
            push_notifications: false,
        }
    }
}

/// The path of the profile document for the account `uid`.
pub fn profile_path(uid: &str) -> Result<DocumentPath, Error> {
    DocumentPath::new(&["users", uid])
}

/// The path of the settings document for the account `uid`.
pub fn settings_path(uid: &str) -> Result<DocumentPath, Error> {
    DocumentPath::new(&["users", uid, "settings", "preferences"])
}
