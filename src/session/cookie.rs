//! The private cookie that ties a browser to its session.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub(crate) const COOKIE_CLIENT_ID: &str = "client_id";
/// How long a client cookie stays valid without being used.
pub(crate) const DEFAULT_COOKIE_DURATION: Duration = Duration::hours(1);

/// Identifies one browser, each browser is its own client of the identity
/// service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Create a new random client ID.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Get the client ID from `jar`, if the cookie is present and well formed.
pub(crate) fn get_client_id(jar: &PrivateCookieJar) -> Option<ClientId> {
    let cookie = jar.get(COOKIE_CLIENT_ID)?;
    let value = cookie.value_trimmed();

    Uuid::try_parse(value)
        .ok()
        .map(|uuid| ClientId(uuid.simple().to_string()))
}

/// Add the client cookie to `jar`, expiring `duration` from now.
pub(crate) fn set_client_cookie(
    jar: PrivateCookieJar,
    client_id: &ClientId,
    duration: Duration,
) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_CLIENT_ID, client_id.as_str().to_owned()))
            .expires(OffsetDateTime::now_utc() + duration)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the client cookie to an invalid value that expires immediately, which
/// deletes the cookie on the client side.
pub(crate) fn invalidate_client_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_CLIENT_ID, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}
