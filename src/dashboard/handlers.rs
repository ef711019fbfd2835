//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for displaying the dashboard and refreshing its summary
//! - HTML view functions for rendering the dashboard UI
//! - The state used by the handlers

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};

use crate::{
    AppState, Error,
    currency::CurrencyFormatter,
    dashboard::{
        aggregation::{calculate_totals, summarize_by_category},
        cards::totals_cards,
        tables::{category_summary_table, transactions_table},
    },
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
    navigation::NavBar,
    session::AppSession,
    timezone::local_now,
    transaction::{
        TRANSACTION_CREATED_EVENT, Transaction, TransactionEntryForm, add_transaction_button,
        list_transactions, transaction_dialog,
    },
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display a page with an overview of the user's finances and the form for
/// adding transactions.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(session): Extension<Arc<AppSession>>,
) -> Result<Response, Error> {
    let snapshot = session.session();
    let Some(identity) = snapshot.identity else {
        return Ok(Redirect::to(endpoints::LOG_IN_VIEW).into_response());
    };

    let today = local_now(&state.local_timezone)?.date();
    let formatter = session.currency_formatter();
    let transactions = list_transactions(&identity.uid, session.store())
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    let name = snapshot
        .profile
        .map(|profile| profile.display_name())
        .filter(|name| !name.is_empty())
        .unwrap_or(identity.email);

    let form = TransactionEntryForm {
        is_open: false,
        ..TransactionEntryForm::new(today)
    };

    Ok(dashboard_view(
        NavBar::new(endpoints::DASHBOARD_VIEW),
        &name,
        &dashboard_summary(&transactions, &formatter),
        &transaction_dialog(&form, &formatter),
    )
    .into_response())
}

/// The dashboard summary on its own, requested by the page whenever a
/// transaction is created.
pub async fn get_dashboard_summary(
    Extension(session): Extension<Arc<AppSession>>,
) -> Result<Markup, Error> {
    let identity = session.session().identity.ok_or(Error::NotAuthenticated)?;
    let transactions = list_transactions(&identity.uid, session.store())
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    Ok(dashboard_summary(
        &transactions,
        &session.currency_formatter(),
    ))
}

fn dashboard_view(nav_bar: NavBar, name: &str, summary: &Markup, dialog: &Markup) -> Markup {
    let content = html! {
        (nav_bar.into_html())

        div class={(PAGE_CONTAINER_STYLE) " max-w-screen-lg gap-8 pb-24 lg:pb-8"}
        {
            div class="flex flex-row flex-wrap items-center justify-between gap-4 w-full"
            {
                h2 class="text-2xl font-bold" { "Welcome, " (name) }

                (add_transaction_button())
            }

            (summary)
        }

        (dialog)
    };

    base("Dashboard", &[], &content)
}

fn dashboard_summary(transactions: &[Transaction], formatter: &CurrencyFormatter) -> Markup {
    let trigger = format!("{TRANSACTION_CREATED_EVENT} from:body");

    html! {
        div
            id="dashboard-summary"
            class="flex flex-col gap-8 w-full"
            hx-get=(endpoints::DASHBOARD_SUMMARY)
            hx-trigger=(trigger)
            hx-swap="outerHTML"
        {
            (totals_cards(&calculate_totals(transactions), formatter))

            @if transactions.is_empty() {
                p id="no-transactions" class="text-center text-gray-600 dark:text-gray-400"
                {
                    "No transactions yet. Use the Add Transaction button to record your first one."
                }
            } @else {
                (category_summary_table(&summarize_by_category(transactions), formatter))
                (transactions_table(transactions))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use time::{OffsetDateTime, macros::date};

    use crate::{
        session::{NewProfile, SessionRegistry},
        test_utils::{
            RecordingMailer, TEST_PASSWORD, assert_valid_html, create_verified_account,
            get_test_app_state, must_select, parse_html_document, parse_markup, select_text,
            signed_in_session,
        },
        transaction::{Transaction, TransactionType, create_transaction},
    };

    use super::{DashboardState, get_dashboard_page, get_dashboard_summary};

    fn get_test_state() -> (DashboardState, SessionRegistry, RecordingMailer) {
        let mailer = RecordingMailer::default();
        let app_state = get_test_app_state(&mailer);

        (
            DashboardState {
                local_timezone: "Etc/UTC".to_owned(),
            },
            app_state.sessions,
            mailer,
        )
    }

    fn add(
        session: &crate::session::AppSession,
        amount: f64,
        transaction_type: TransactionType,
        category: &str,
    ) {
        let uid = session.session().identity.unwrap().uid;
        let transaction =
            Transaction::build(amount, transaction_type, category, date!(2024 - 01 - 15))
                .description("test")
                .finalize(&uid, OffsetDateTime::now_utc())
                .unwrap();

        create_transaction(&transaction, session.store()).unwrap();
    }

    #[tokio::test]
    async fn dashboard_shows_totals_and_transactions() {
        let (state, sessions, mailer) = get_test_state();
        let (_, session) = signed_in_session(&sessions, &mailer, "jane@example.com");
        add(&session, 3000.0, TransactionType::Income, "Salary");
        add(&session, 25.5, TransactionType::Expense, "Food & Dining");

        let response = get_dashboard_page(State(state), Extension(session))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(select_text(&html, "#total-income p"), "$3,000.00");
        assert_eq!(select_text(&html, "#total-expenses p"), "$25.50");
        assert_eq!(select_text(&html, "#balance p"), "$2,974.50");

        let rows = scraper::Selector::parse("#transactions tbody tr").unwrap();
        assert_eq!(html.select(&rows).count(), 2);
        must_select(&html, "dialog#transaction-dialog");
    }

    #[tokio::test]
    async fn dashboard_greets_user_by_name() {
        let (state, sessions, mailer) = get_test_state();
        create_verified_account(
            &sessions,
            &mailer,
            "jane@example.com",
            NewProfile {
                first_name: "Jane".to_owned(),
                last_name: "Doe".to_owned(),
                ..Default::default()
            },
        );
        let session = sessions.new_session();
        session.sign_in("jane@example.com", TEST_PASSWORD).unwrap();

        let response = get_dashboard_page(State(state), Extension(session))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(select_text(&html, "h2"), "Welcome, Jane Doe");
    }

    #[tokio::test]
    async fn empty_dashboard_explains_what_to_do() {
        let (state, sessions, mailer) = get_test_state();
        let (_, session) = signed_in_session(&sessions, &mailer, "jane@example.com");

        let response = get_dashboard_page(State(state), Extension(session))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        must_select(&html, "#no-transactions");
        assert_eq!(select_text(&html, "#balance p"), "$0.00");
    }

    #[tokio::test]
    async fn summary_refreshes_on_transaction_created() {
        let (_, sessions, mailer) = get_test_state();
        let (_, session) = signed_in_session(&sessions, &mailer, "jane@example.com");
        add(&session, 10.0, TransactionType::Expense, "Shopping");

        let markup = get_dashboard_summary(Extension(session)).await.unwrap();

        let html = parse_markup(markup);
        let summary = must_select(&html, "#dashboard-summary");
        assert_eq!(
            summary.value().attr("hx-trigger"),
            Some("transaction-created from:body")
        );
        assert_eq!(select_text(&html, "#category-summary tbody th"), "Shopping");
    }
}
