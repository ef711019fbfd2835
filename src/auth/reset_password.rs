//! The page linked from password reset emails for choosing a new password.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    auth::{PASSWORD_INPUT_MIN_LENGTH, register::confirm_password_input},
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, link, log_in_register, submit_button,
    },
    session::AuthState,
};

fn reset_password_form(
    code: &str,
    password_error: Option<&str>,
    confirm_password_error: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::RESET_PASSWORD_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            input type="hidden" name="code" value=(code);

            div
            {
                label for="new-password" class=(FORM_LABEL_STYLE) { "New Password" }

                input
                    type="password"
                    name="new_password"
                    id="new-password"
                    placeholder="••••••••"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus
                    minlength=(PASSWORD_INPUT_MIN_LENGTH);

                @if let Some(error_message) = password_error
                {
                    p class="text-red-500 text-base" { (error_message) }
                }
            }

            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, confirm_password_error))
            (submit_button("Reset password"))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordQuery {
    #[serde(default)]
    pub code: String,
}

/// Display the form for choosing a new password with the code from a reset email.
pub async fn get_reset_password_page(Query(query): Query<ResetPasswordQuery>) -> Response {
    let form = reset_password_form(&query.code, None, None);
    let content = log_in_register("Choose a new password", &form);
    base("Reset Password", &[], &content).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub code: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Replace the password of the account the reset code was issued for.
pub async fn post_reset_password(
    State(state): State<AuthState>,
    Form(form): Form<ResetPasswordForm>,
) -> Response {
    if form.new_password != form.confirm_password {
        return reset_password_form(&form.code, None, Some("Passwords do not match"))
            .into_response();
    }

    let result = state
        .sessions
        .identity_client()
        .confirm_password_reset(&form.code, &form.new_password)
        .map_err(Error::from);

    let password_error = match result {
        Ok(()) => {
            return html! {
                div id="password-reset" class="space-y-4 text-gray-900 dark:text-white"
                {
                    p { "Your password has been reset." }
                    p { (link(endpoints::LOG_IN_VIEW, "Log in with your new password")) }
                }
            }
            .into_response();
        }
        Err(Error::TooWeak(feedback)) => format!("Password is too weak: {feedback}"),
        Err(Error::InvalidActionCode) => {
            "This reset link is invalid, has already been used, or has expired. \
            Request a new one from the forgot password page."
                .to_owned()
        }
        Err(error) => {
            tracing::error!("Unhandled error while resetting password: {error}");
            "An internal error occurred. Please try again later.".to_owned()
        }
    };

    reset_password_form(&form.code, Some(&password_error), None).into_response()
}
