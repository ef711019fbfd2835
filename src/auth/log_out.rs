//! Log-out route handler that ends the client's session and redirects to the log-in page.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    endpoints,
    session::{AuthState, get_client_id, invalidate_client_cookie},
};

/// Sign the client out, drop its session and cookie, and redirect to the log-in page.
pub async fn get_log_out(State(state): State<AuthState>, jar: PrivateCookieJar) -> Response {
    if let Some(client_id) = get_client_id(&jar) {
        if let Some(session) = state.sessions.get(&client_id)
            && let Err(error) = session.logout()
        {
            tracing::error!("Could not sign out client {}: {error}", client_id.as_str());
        }

        state.sessions.remove(&client_id);
    }

    let jar = invalidate_client_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
