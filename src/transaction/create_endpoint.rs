//! Defines the endpoints behind the transaction form: creating a transaction,
//! the category options of a type, and the amount preview.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    AppState,
    alert::AlertBuffer,
    endpoints,
    session::AppSession,
    timezone::local_now,
    transaction::{
        TransactionEntryForm, TransactionFormData, TransactionType,
        form::{amount_preview, category_field, transaction_form},
    },
};

/// The event sent to the browser with the HX-Trigger header after a
/// transaction is created.
pub const TRANSACTION_CREATED_EVENT: &str = "transaction-created";

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for creating a new transaction.
///
/// On success responds with an empty form, a success alert and the
/// [TRANSACTION_CREATED_EVENT] trigger. On failure responds with an error
/// alert and an error status so the form keeps what the user entered.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(session): Extension<Arc<AppSession>>,
    Form(data): Form<TransactionFormData>,
) -> Response {
    let now = match local_now(&state.local_timezone) {
        Ok(now) => now,
        Err(error) => return error.into_alert_response(),
    };

    let formatter = session.currency_formatter();
    let user = session.session().identity;
    let mut form = TransactionEntryForm::from_data(data);
    let mut alerts = AlertBuffer::default();

    let result = form.submit(
        user.as_ref(),
        formatter.currency_code(),
        session.store(),
        &mut alerts,
        now,
    );

    match result {
        Ok(Some(_)) => (
            [("HX-Trigger", TRANSACTION_CREATED_EVENT)],
            html! {
                (transaction_form(&form, &formatter))
                (alerts.into_html())
            },
        )
            .into_response(),
        Ok(None) => {
            (HxRedirect(endpoints::LOG_IN_VIEW.to_owned()), StatusCode::OK).into_response()
        }
        Err(error) => (error.alert_status_code(), alerts.into_html()).into_response(),
    }
}

/// The query for [get_category_field].
#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    /// The newly selected transaction type.
    pub type_: TransactionType,
    /// The type the current category options belong to.
    pub category_type: Option<TransactionType>,
    /// The currently selected category.
    #[serde(default)]
    pub category: String,
}

/// A route handler that renders the category select for a transaction type.
///
/// The selected category is kept only if the type did not change.
pub async fn get_category_field(Query(query): Query<CategoryQuery>) -> Markup {
    let mut form = TransactionEntryForm::new(time::Date::MIN);
    form.transaction_type = query.category_type.unwrap_or(query.type_);
    form.category = query.category;
    form.set_transaction_type(query.type_);

    category_field(form.transaction_type, &form.category)
}

/// The query for [get_amount_preview].
#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub amount: String,
}

/// A route handler that renders the amount as formatted in the user's currency.
pub async fn get_amount_preview(
    Extension(session): Extension<Arc<AppSession>>,
    Query(query): Query<PreviewQuery>,
) -> Markup {
    let formatter = session.currency_formatter();
    let form = TransactionEntryForm {
        amount: query.amount,
        ..TransactionEntryForm::new(time::Date::MIN)
    };

    amount_preview(form.preview(&formatter).as_deref())
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        endpoints,
        session::SessionRegistry,
        store::{DocumentStore, to_document},
        test_utils::{
            RecordingMailer, assert_hx_redirect, get_header, get_test_app_state, must_select,
            parse_html_fragment, parse_markup, select_text, signed_in_session,
        },
        transaction::{TransactionFormData, TransactionType, list_transactions},
    };

    use super::{
        CategoryQuery, CreateTransactionState, PreviewQuery, TRANSACTION_CREATED_EVENT,
        create_transaction_endpoint, get_amount_preview, get_category_field,
    };

    fn get_test_state() -> (CreateTransactionState, SessionRegistry, RecordingMailer) {
        let mailer = RecordingMailer::default();
        let app_state = get_test_app_state(&mailer);
        let state = CreateTransactionState {
            local_timezone: "Etc/UTC".to_owned(),
        };

        (state, app_state.sessions, mailer)
    }

    fn lunch() -> TransactionFormData {
        TransactionFormData {
            amount: "25.50".to_owned(),
            transaction_type: TransactionType::Expense,
            category: "Food & Dining".to_owned(),
            description: "Lunch".to_owned(),
            date: date!(2024 - 01 - 15),
        }
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, sessions, mailer) = get_test_state();
        let (_, session) = signed_in_session(&sessions, &mailer, "jane@example.com");

        let response =
            create_transaction_endpoint(State(state), Extension(session.clone()), Form(lunch()))
                .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(get_header(&response, "hx-trigger"), TRANSACTION_CREATED_EVENT);

        let html = parse_html_fragment(response).await;
        assert_eq!(must_select(&html, "input#amount").value().attr("value"), Some(""));
        assert_eq!(select_text(&html, "#alert-container p"), "Expense added successfully");

        let uid = session.session().identity.unwrap().uid;
        let transactions = list_transactions(&uid, session.store()).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount, 25.5);
        assert_eq!(transactions[0].description, "Lunch");
        assert_eq!(transactions[0].currency, "USD");
    }

    #[tokio::test]
    async fn uses_currency_from_user_settings() {
        let (state, sessions, mailer) = get_test_state();
        let (_, session) = signed_in_session(&sessions, &mailer, "jane@example.com");
        let uid = session.session().identity.unwrap().uid;
        let mut settings = session.user_settings().unwrap();
        settings.currency = "NZD".to_owned();
        session
            .store()
            .set(
                &crate::session::settings_path(&uid).unwrap(),
                to_document(&settings).unwrap(),
            )
            .unwrap();

        create_transaction_endpoint(State(state), Extension(session.clone()), Form(lunch())).await;

        let transactions = list_transactions(&uid, session.store()).unwrap();
        assert_eq!(transactions[0].currency, "NZD");
    }

    #[tokio::test]
    async fn invalid_amount_is_rejected_with_alert() {
        let (state, sessions, mailer) = get_test_state();
        let (_, session) = signed_in_session(&sessions, &mailer, "jane@example.com");
        let form = TransactionFormData {
            amount: "-5".to_owned(),
            ..lunch()
        };

        let response =
            create_transaction_endpoint(State(state), Extension(session.clone()), Form(form))
                .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get("hx-trigger").is_none());
        let html = parse_html_fragment(response).await;
        assert_eq!(select_text(&html, "#alert-container p"), "Invalid amount");

        let uid = session.session().identity.unwrap().uid;
        assert!(list_transactions(&uid, session.store()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn category_of_other_type_is_rejected() {
        let (state, sessions, mailer) = get_test_state();
        let (_, session) = signed_in_session(&sessions, &mailer, "jane@example.com");
        let form = TransactionFormData {
            transaction_type: TransactionType::Income,
            ..lunch()
        };

        let response =
            create_transaction_endpoint(State(state), Extension(session), Form(form)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        assert_eq!(select_text(&html, "#alert-container p"), "Invalid category");
    }

    #[tokio::test]
    async fn signed_out_session_redirects_to_log_in() {
        let (state, sessions, mailer) = get_test_state();
        let (_, session) = signed_in_session(&sessions, &mailer, "jane@example.com");
        session.logout().unwrap();

        let response =
            create_transaction_endpoint(State(state), Extension(session), Form(lunch())).await;

        assert_hx_redirect(&response, endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn invalid_timezone_is_an_error() {
        let (_, sessions, mailer) = get_test_state();
        let (_, session) = signed_in_session(&sessions, &mailer, "jane@example.com");
        let state = CreateTransactionState {
            local_timezone: "Not/A_Timezone".to_owned(),
        };

        let response =
            create_transaction_endpoint(State(state), Extension(session), Form(lunch())).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn changing_type_clears_category() {
        let markup = get_category_field(Query(CategoryQuery {
            type_: TransactionType::Income,
            category_type: Some(TransactionType::Expense),
            category: "Shopping".to_owned(),
        }))
        .await;

        let html = parse_markup(markup);
        assert_eq!(
            must_select(&html, "input[name=category_type]").value().attr("value"),
            Some("income")
        );
        assert_eq!(
            must_select(&html, "option[selected]").value().attr("value"),
            Some("")
        );
    }

    #[tokio::test]
    async fn same_type_keeps_category() {
        let markup = get_category_field(Query(CategoryQuery {
            type_: TransactionType::Expense,
            category_type: Some(TransactionType::Expense),
            category: "Shopping".to_owned(),
        }))
        .await;

        let html = parse_markup(markup);
        assert_eq!(
            must_select(&html, "option[selected]").value().attr("value"),
            Some("Shopping")
        );
    }

    #[tokio::test]
    async fn preview_formats_amount_in_user_currency() {
        let (_, sessions, mailer) = get_test_state();
        let (_, session) = signed_in_session(&sessions, &mailer, "jane@example.com");

        let markup = get_amount_preview(
            Extension(session.clone()),
            Query(PreviewQuery {
                amount: "1234.5".to_owned(),
            }),
        )
        .await;
        assert_eq!(select_text(&parse_markup(markup), "#amount-preview"), "$1,234.50");

        let markup = get_amount_preview(
            Extension(session),
            Query(PreviewQuery {
                amount: String::new(),
            }),
        )
        .await;
        assert_eq!(select_text(&parse_markup(markup), "#amount-preview"), "");
    }
}
