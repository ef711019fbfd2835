//! The page for requesting a password reset email.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error, endpoints,
    html::{base, email_input, link, log_in_register, submit_button},
    session::AuthState,
};

fn forgot_password_form(email: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::FORGOT_PASSWORD_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                "Enter the email address of your account and we will send you a link to reset your password."
            }

            (email_input(email, error_message))
            (submit_button("Send reset link"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Remembered it? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Renders the page for requesting a password reset email.
pub async fn get_forgot_password_page() -> Response {
    let form = forgot_password_form("", None);
    let content = log_in_register("Forgot your password?", &form);
    base("Forgot Password", &[], &content).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Sends a password reset email to the address in the form.
pub async fn post_forgot_password(
    State(state): State<AuthState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Response {
    let email = form.email.trim();

    let error_message = match state.sessions.new_session().reset_password(email) {
        Ok(()) => {
            let sent = html! {
                div id="reset-link-sent" class="space-y-4 text-gray-900 dark:text-white"
                {
                    p { "We sent a password reset link to " strong { (email) } "." }
                    p { (link(endpoints::LOG_IN_VIEW, "Back to log in")) }
                }
            };

            return sent.into_response();
        }
        Err(Error::NoAccountFound) => "No account found with this email address.".to_owned(),
        Err(error @ Error::InvalidEmail(_)) => error.to_string(),
        Err(Error::RateLimited) => {
            "Too many requests, please wait a minute and try again.".to_owned()
        }
        Err(error) => {
            tracing::error!("Unhandled error while sending password reset email: {error}");
            "An internal error occurred. Please try again later.".to_owned()
        }
    };

    forgot_password_form(email, Some(&error_message)).into_response()
}

#[cfg(test)]
mod forgot_password_tests {
    use axum::{
        extract::{FromRef, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;

    use crate::{
        endpoints,
        identity::ActionKind,
        session::{AuthState, NewProfile},
        test_utils::{
            RecordingMailer, assert_hx_endpoint, assert_valid_html, create_verified_account,
            form_error_messages, get_test_app_state, must_get_form, must_select,
            parse_html_document, parse_html_fragment,
        },
    };

    use super::{ForgotPasswordForm, get_forgot_password_page, post_forgot_password};

    async fn request_reset(state: &AuthState, email: &str) -> axum::response::Response {
        post_forgot_password(
            State(state.clone()),
            Form(ForgotPasswordForm {
                email: email.to_owned(),
            }),
        )
        .await
    }

    #[tokio::test]
    async fn page_displays_form() {
        let response = get_forgot_password_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_hx_endpoint(
            &must_get_form(&document),
            endpoints::FORGOT_PASSWORD_API,
            "hx-post",
        );
    }

    #[tokio::test]
    async fn sends_reset_email() {
        let mailer = RecordingMailer::default();
        let state = AuthState::from_ref(&get_test_app_state(&mailer));
        create_verified_account(
            &state.sessions,
            &mailer,
            "jane@example.com",
            NewProfile::default(),
        );

        let response = request_reset(&state, "jane@example.com").await;

        let html = parse_html_fragment(response).await;
        must_select(&html, "#reset-link-sent");
        assert!(mailer.last_code(ActionKind::ResetPassword).is_some());
    }

    #[tokio::test]
    async fn unknown_email_shows_error() {
        let mailer = RecordingMailer::default();
        let state = AuthState::from_ref(&get_test_app_state(&mailer));

        let response = request_reset(&state, "nobody@example.com").await;

        let html = parse_html_fragment(response).await;
        assert_eq!(
            form_error_messages(&must_get_form(&html)),
            ["No account found with this email address."]
        );
        assert!(mailer.emails().is_empty());
    }
}
