//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The session module handles who is signed in for each client.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error, endpoints,
    html::{base, email_input, link, log_in_register, password_input, submit_button},
    session::{AuthState, ClientId, get_client_id, set_client_cookie},
};

fn log_in_form(email: &str, email_error: Option<&str>, password_error: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, email_error))
            (password_input("", 0, password_error))
            (submit_button("Log in"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Forgot your password? "
                (link(endpoints::FORGOT_PASSWORD_VIEW, "Reset it here"))
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                (link(endpoints::REGISTER_VIEW, "Register here"))
            }
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page() -> Response {
    let log_in_form = log_in_form("", None, None);
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &[], &content).into_response()
}

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect email or password.";
pub const UNVERIFIED_EMAIL_ERROR_MSG: &str = "Please verify your email address before logging \
    in. Check your inbox for the verification link.";

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in the client's session is signed in, kept in the
/// session registry and the client is redirected to the dashboard page.
/// Otherwise, the form is returned with an error message explaining the
/// problem and no session is kept for a client that did not have one.
pub async fn post_log_in(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let client_id = get_client_id(&jar);
    let session = client_id
        .as_ref()
        .and_then(|client_id| state.sessions.get(client_id))
        .unwrap_or_else(|| state.sessions.new_session());
    let email = user_data.email.trim();

    let (email_error, password_error) = match session.sign_in(email, &user_data.password) {
        Ok(identity) => {
            tracing::info!("Account {} logged in", identity.uid);
            let client_id = client_id.unwrap_or_else(ClientId::new_random);
            state.sessions.insert(&client_id, session);
            let jar = set_client_cookie(jar, &client_id, state.cookie_duration);

            return (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
                jar,
            )
                .into_response();
        }
        Err(Error::InvalidCredentials) => (None, Some(INVALID_CREDENTIALS_ERROR_MSG.to_owned())),
        Err(Error::UnverifiedEmail) => (Some(UNVERIFIED_EMAIL_ERROR_MSG.to_owned()), None),
        Err(error @ Error::InvalidEmail(_)) => (Some(error.to_string()), None),
        Err(Error::RateLimited) => (
            None,
            Some("Too many attempts, please wait a minute and try again.".to_owned()),
        ),
        Err(error) => {
            tracing::error!("Unhandled error while logging in: {error}");
            (
                None,
                Some("An internal error occurred. Please try again later.".to_owned()),
            )
        }
    };

    log_in_form(email, email_error.as_deref(), password_error.as_deref()).into_response()
}
