//! Email verification: the page opened from the verification email and the
//! endpoint for sending another email.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;
use serde::Deserialize;

use crate::{
    Error,
    alert::Alert,
    endpoints,
    html::{base, error_view, link, log_in_register},
    session::{AppSession, AuthState},
};

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    #[serde(default)]
    pub code: String,
}

/// Verify the email address of the account the code in the link was sent to.
pub async fn get_verify_email_page(
    State(state): State<AuthState>,
    Query(query): Query<VerifyEmailQuery>,
) -> Response {
    match state.sessions.identity_client().apply_action_code(&query.code) {
        Ok(()) => {
            let content = html! {
                div id="email-verified" class="space-y-4 text-gray-900 dark:text-white"
                {
                    p { "Thanks, your email address has been verified." }
                    p { (link(endpoints::LOG_IN_VIEW, "Log in to your account")) }
                }
            };
            let content = log_in_register("Email verified", &content);

            base("Email Verified", &[], &content).into_response()
        }
        Err(error) => {
            let error = Error::from(error);
            if error != Error::InvalidActionCode {
                tracing::error!("Could not verify email: {error}");
            }

            (
                error.alert_status_code(),
                error_view(
                    "Invalid Link",
                    "Oops!",
                    "This verification link is invalid.",
                    "It may have already been used or expired. Log in to request a new one.",
                ),
            )
                .into_response()
        }
    }
}

/// Send another verification email to the signed in user.
pub async fn resend_verification_email(
    Extension(session): Extension<Arc<AppSession>>,
) -> Response {
    match session.verify_email() {
        Ok(true) => (
            StatusCode::OK,
            Alert::success(
                "Verification email sent",
                "Check your inbox for the verification link.",
            )
            .into_html(),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::OK,
            Alert::success("Email already verified", "There is nothing more to do.").into_html(),
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
