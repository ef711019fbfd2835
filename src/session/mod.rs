//! Session state for each client: who is signed in, their cached profile,
//! and the operations that change either.

mod cookie;
mod manager;
mod middleware;
mod profile;
mod registry;

pub use cookie::ClientId;
pub use manager::SessionManager;
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use profile::{NewProfile, ProfileUpdate, UserProfile};
pub use registry::{AppSession, SessionRegistry};

pub(crate) use cookie::{
    DEFAULT_COOKIE_DURATION, get_client_id, invalidate_client_cookie, set_client_cookie,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_CLIENT_ID;
#[cfg(test)]
pub(crate) use profile::{profile_path, settings_path};
