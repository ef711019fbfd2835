//! The profile page where signed in users can review and update their
//! personal details and request another verification email.

use std::sync::Arc;

use axum::{
    Extension,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
// Must use axum_extra's Form so empty fields parse as None.
use axum_extra::extract::Form;
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    alert::Alert,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE, base, loading_spinner, text_input,
    },
    identity::Identity,
    navigation::NavBar,
    session::{AppSession, ProfileUpdate, UserProfile},
};

/// Display the signed in user's profile.
pub async fn get_profile_page(Extension(session): Extension<Arc<AppSession>>) -> Response {
    let snapshot = session.session();
    let Some(identity) = snapshot.identity else {
        return Redirect::to(endpoints::LOG_IN_VIEW).into_response();
    };

    profile_view(&identity, snapshot.profile.as_ref()).into_response()
}

fn profile_view(identity: &Identity, profile: Option<&UserProfile>) -> Markup {
    let nav_bar = NavBar::new(endpoints::PROFILE_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class={(PAGE_CONTAINER_STYLE) " max-w-screen-md gap-8"}
        {
            div class=(FORM_CONTAINER_STYLE)
            {
                h2 class="text-2xl font-bold mb-4" { "Profile" }

                (account_section(identity))

                @match profile {
                    Some(profile) => (profile_form(profile)),
                    None => p id="profile-missing" class="text-gray-600 dark:text-gray-400"
                    {
                        "Your profile could not be loaded. Try refreshing the page."
                    }
                }
            }
        }
    };

    base("Profile", &[], &content)
}

fn account_section(identity: &Identity) -> Markup {
    html! {
        div id="account" class="w-full mb-6 space-y-2"
        {
            p
            {
                span class="font-medium" { "Email: " }
                span id="account-email" { (identity.email) }
            }

            @if identity.email_verified {
                p id="email-status" class="text-green-700 dark:text-green-400" { "Email verified" }
            } @else {
                p id="email-status" class="text-red-700 dark:text-red-400" { "Email not verified" }

                button
                    type="button"
                    id="resend-verification"
                    hx-post=(endpoints::VERIFY_EMAIL_API)
                    hx-swap="none"
                    hx-target-error="#alert-container"
                    class=(BUTTON_SECONDARY_STYLE)
                {
                    "Resend verification email"
                }
            }
        }
    }
}

fn profile_form(profile: &UserProfile) -> Markup {
    let date_of_birth = profile
        .date_of_birth
        .map(|date| date.to_string())
        .unwrap_or_default();

    html! {
        form
            hx-post=(endpoints::PROFILE_API)
            hx-swap="none"
            hx-target-error="#alert-container"
            hx-disabled-elt="find button[type='submit']"
            class="w-full space-y-4"
        {
            div class="grid grid-cols-2 gap-4"
            {
                (text_input("first_name", "First Name", &profile.first_name))
                (text_input("last_name", "Last Name", &profile.last_name))
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

            (text_input("phone", "Phone", &profile.phone))
            (text_input("address", "Address", &profile.address))

            div class="grid grid-cols-2 gap-4"
            {
                (text_input("city", "City", &profile.city))
                (text_input("country", "Country", &profile.country))
            }

            (text_input("security_question", "Security Question", &profile.security_question))
            (text_input("security_answer", "Security Answer", ""))

            button type="submit" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" { (loading_spinner()) }
                "Save Profile"
            }
        }
    }
}

/// The fields of the profile form. Empty fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<Date>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub security_question: Option<String>,
    pub security_answer: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

impl From<ProfileForm> for ProfileUpdate {
    fn from(form: ProfileForm) -> Self {
        Self {
            first_name: non_blank(form.first_name),
            last_name: non_blank(form.last_name),
            date_of_birth: form.date_of_birth,
            phone: non_blank(form.phone),
            address: non_blank(form.address),
            city: non_blank(form.city),
            country: non_blank(form.country),
            security_question: non_blank(form.security_question),
            security_answer: non_blank(form.security_answer),
        }
    }
}

/// Merge the submitted fields into the signed in user's profile.
pub async fn update_profile_endpoint(
    Extension(session): Extension<Arc<AppSession>>,
    Form(form): Form<ProfileForm>,
) -> Response {
    match session.update_user_profile(form.into()) {
        Ok(()) => (
            StatusCode::OK,
            Alert::success("Profile updated", "Your changes have been saved.").into_html(),
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Could not update profile: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{Extension, http::StatusCode};
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        endpoints,
        session::{NewProfile, ProfileUpdate},
        test_utils::{
            RecordingMailer, TEST_PASSWORD, assert_hx_endpoint, assert_valid_html,
            create_verified_account, get_test_app_state, must_get_form, must_select,
            parse_html_document, parse_html_fragment, select_text,
        },
    };

    use super::{ProfileForm, get_profile_page, update_profile_endpoint};

    fn signed_in_jane() -> std::sync::Arc<crate::session::AppSession> {
        let mailer = RecordingMailer::default();
        let state = get_test_app_state(&mailer);
        create_verified_account(
            &state.sessions,
            &mailer,
            "jane@example.com",
            NewProfile {
                first_name: "Jane".to_owned(),
                last_name: "Doe".to_owned(),
                city: "Auckland".to_owned(),
                ..Default::default()
            },
        );
        let session = state.sessions.new_session();
        session.sign_in("jane@example.com", TEST_PASSWORD).unwrap();

        session
    }

    #[tokio::test]
    async fn profile_page_shows_details() {
        let session = signed_in_jane();

        let response = get_profile_page(Extension(session)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(select_text(&html, "#account-email"), "jane@example.com");
        assert_eq!(select_text(&html, "#email-status"), "Email verified");
        assert_hx_endpoint(&must_get_form(&html), endpoints::PROFILE_API, "hx-post");
        assert_eq!(
            must_select(&html, "input#first_name").value().attr("value"),
            Some("Jane")
        );
    }

    #[tokio::test]
    async fn update_keeps_fields_left_empty() {
        let session = signed_in_jane();

        let response = update_profile_endpoint(
            Extension(session.clone()),
            Form(ProfileForm {
                first_name: Some("".to_owned()),
                city: Some(" Wellington ".to_owned()),
                date_of_birth: Some(date!(1990 - 05 - 20)),
                ..Default::default()
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_eq!(select_text(&html, "#alert-container p"), "Profile updated");

        let profile = session.session().profile.unwrap();
        assert_eq!(profile.first_name, "Jane");
        assert_eq!(profile.last_name, "Doe");
        assert_eq!(profile.city, "Wellington");
        assert_eq!(profile.date_of_birth, Some(date!(1990 - 05 - 20)));
        assert_eq!(profile.email, "jane@example.com");
        assert!(profile.updated_at >= profile.created_at);
    }

    #[tokio::test]
    async fn update_without_user_is_rejected() {
        let mailer = RecordingMailer::default();
        let state = get_test_app_state(&mailer);
        let session = state.sessions.new_session();

        let response = update_profile_endpoint(
            Extension(session),
            Form(ProfileForm {
                city: Some("Wellington".to_owned()),
                ..Default::default()
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let html = parse_html_fragment(response).await;
        assert_eq!(select_text(&html, "#alert-container p"), "Not logged in");
    }

    #[test]
    fn blank_fields_become_none() {
        let update = ProfileUpdate::from(ProfileForm {
            phone: Some("   ".to_owned()),
            country: Some("New Zealand".to_owned()),
            ..Default::default()
        });

        assert_eq!(
            update,
            ProfileUpdate {
                country: Some("New Zealand".to_owned()),
                ..Default::default()
            }
        );
    }
}
