//! The registration page for creating a new account with a profile.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    auth::PASSWORD_INPUT_MIN_LENGTH,
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, email_input, link, log_in_register,
        password_input, submit_button, text_input,
    },
    session::{AuthState, NewProfile},
};

pub(super) fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

/// The messages shown next to the fields of the registration form.
#[derive(Debug, Default)]
struct RegistrationErrors {
    email: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
    form: Option<String>,
}

fn registration_form(data: &RegisterForm, errors: &RegistrationErrors) -> Markup {
    let date_of_birth = data
        .date_of_birth
        .map(|date| date.to_string())
        .unwrap_or_default();

    html! {
        form
            hx-post=(endpoints::USERS)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            div class="grid grid-cols-2 gap-4"
            {
                (required_text_input("first_name", "First Name", &data.first_name))
                (required_text_input("last_name", "Last Name", &data.last_name))
            }

            (email_input(&data.email, errors.email.as_deref()))
            (password_input("", PASSWORD_INPUT_MIN_LENGTH, errors.password.as_deref()))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, errors.confirm_password.as_deref()))

            details class="space-y-4"
            {
                summary class="cursor-pointer text-sm font-medium text-gray-900 dark:text-white"
                {
                    "More details (optional)"
                }

                div
                {
                    label for="date_of_birth" class=(FORM_LABEL_STYLE) { "Date of Birth" }
                    input
                        type="date"
                        name="date_of_birth"
                        id="date_of_birth"
                        value=(date_of_birth)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (text_input("phone", "Phone", &data.phone))
                (text_input("address", "Address", &data.address))

                div class="grid grid-cols-2 gap-4"
                {
                    (text_input("city", "City", &data.city))
                    (text_input("country", "Country", &data.country))
                }

                (text_input("security_question", "Security Question", &data.security_question))
                (text_input("security_answer", "Security Answer", ""))
            }

            @if let Some(message) = &errors.form {
                p class="text-red-500 text-base" { (message) }
            }

            (submit_button("Create Account"))

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

fn required_text_input(name: &str, label: &str, value: &str) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type="text"
                name=(name)
                id=(name)
                value=(value)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

/// Shown in place of the form once the account has been created.
fn check_inbox_view(email: &str) -> Markup {
    html! {
        div id="registration-complete" class="space-y-4 text-gray-900 dark:text-white"
        {
            p class="text-lg font-semibold" { "Check your inbox" }

            p
            {
                "We sent a verification link to " strong { (email) } ". "
                "Follow the link to verify your email address, then log in."
            }

            p { (link(endpoints::LOG_IN_VIEW, "Go to the log-in page")) }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form(&RegisterForm::default(), &Default::default());
    let content = log_in_register("Create an account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The data entered in the registration form.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
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

impl RegisterForm {
    fn profile(&self) -> NewProfile {
        NewProfile {
            first_name: self.first_name.trim().to_owned(),
            last_name: self.last_name.trim().to_owned(),
            date_of_birth: self.date_of_birth,
            phone: self.phone.trim().to_owned(),
            address: self.address.trim().to_owned(),
            city: self.city.trim().to_owned(),
            country: self.country.trim().to_owned(),
            security_question: self.security_question.trim().to_owned(),
            security_answer: self.security_answer.trim().to_owned(),
        }
    }
}

pub const EMAIL_IN_USE_ERROR_MSG: &str =
    "An account with this email address already exists. Try logging in instead.";

/// Handler for registration requests.
///
/// Creates the account with its profile and sends a verification email. The
/// user is not logged in, they have to verify their email first.
pub async fn register_user(
    State(state): State<AuthState>,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    if user_data.password != user_data.confirm_password {
        let errors = RegistrationErrors {
            confirm_password: Some("Passwords do not match".to_owned()),
            ..Default::default()
        };
        return registration_form(&user_data, &errors).into_response();
    }

    let session = state.sessions.new_session();
    let email = user_data.email.trim();

    let errors = match session.sign_up(email, &user_data.password, user_data.profile()) {
        Ok(()) => {
            tracing::info!("Registered a new account for {email}");
            return check_inbox_view(email).into_response();
        }
        Err(Error::EmailAlreadyInUse) => RegistrationErrors {
            email: Some(EMAIL_IN_USE_ERROR_MSG.to_owned()),
            ..Default::default()
        },
        Err(error @ Error::InvalidEmail(_)) => RegistrationErrors {
            email: Some(error.to_string()),
            ..Default::default()
        },
        Err(Error::TooWeak(feedback)) => RegistrationErrors {
            password: Some(format!("Password is too weak: {feedback}")),
            ..Default::default()
        },
        Err(error) => {
            tracing::error!("Unhandled error while registering: {error}");
            RegistrationErrors {
                form: Some(error.to_alert().message().to_owned()),
                ..Default::default()
            }
        }
    };

    registration_form(&user_data, &errors).into_response()
}
