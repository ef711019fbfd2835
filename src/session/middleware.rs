//! Middleware that only lets requests from signed in clients through.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::Duration;

use crate::{AppState, endpoints};

use super::{AppSession, SessionRegistry, get_client_id, set_client_cookie};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long the client cookie lasts after the latest request.
    pub cookie_duration: Duration,
    /// The sessions of every client.
    pub sessions: SessionRegistry,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            sessions: state.sessions.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

#[inline]
async fn auth_guard_internal(
    state: AuthState,
    request: Request,
    next: Next,
    get_redirect: impl Fn() -> Response,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}. Redirecting to log in page.");
            return get_redirect();
        }
    };

    let Some(client_id) = get_client_id(&jar) else {
        return get_redirect();
    };

    let session: Arc<AppSession> = match state.sessions.get(&client_id) {
        Some(session) => session,
        None => return get_redirect(),
    };

    if !session.wait_until_ready().await.is_authenticated() {
        return get_redirect();
    }

    parts.extensions.insert(session);
    let request = Request::from_parts(parts, body);
    let response = next.run(request).await;

    let (mut parts, body) = response.into_parts();
    let jar = set_client_cookie(jar, &client_id, state.cookie_duration);
    for (key, val) in jar.into_response().headers().iter() {
        if key != SET_COOKIE {
            continue;
        }

        parts.headers.append(key, val.to_owned());
    }

    Response::from_parts(parts, body)
}

/// Middleware function that checks the client has a signed in session.
///
/// The client's session is placed into the request and the request executed
/// normally, otherwise the client is redirected to the log-in page.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(session): Extension<Arc<AppSession>>` to receive the session.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    auth_guard_internal(state, request, next, || {
        Redirect::to(endpoints::LOG_IN_VIEW).into_response()
    })
    .await
}

/// Same as [auth_guard] but redirects with the HX-Redirect header, for routes
/// called by HTMX.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    auth_guard_internal(state, request, next, || {
        (HxRedirect(endpoints::LOG_IN_VIEW.to_owned()), StatusCode::OK).into_response()
    })
    .await
}

#[cfg(test)]
mod auth_guard_tests {
    use std::sync::Arc;

    use axum::{
        Extension, Router,
        extract::State,
        middleware,
        response::Html,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use axum_test::TestServer;
    use sha2::Digest;

    use crate::{
        endpoints,
        identity::ActionKind,
        session::{
            AppSession, ClientId, DEFAULT_COOKIE_DURATION, NewProfile, SessionRegistry,
            cookie::COOKIE_CLIENT_ID, set_client_cookie,
        },
        test_utils::{RecordingMailer, TEST_PASSWORD, get_test_connection, test_identity_config},
    };

    use super::{AuthState, auth_guard, auth_guard_hx};

    async fn test_handler(Extension(session): Extension<Arc<AppSession>>) -> Html<String> {
        let email = session
            .session()
            .identity
            .map(|identity| identity.email)
            .unwrap_or_default();

        Html(format!("<h1>Hello, {email}!</h1>"))
    }

    /// Starts a session for a new client without signing in.
    async fn stub_anonymous_route(
        State(state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> PrivateCookieJar {
        let client_id = ClientId::new_random();
        state.sessions.insert(&client_id, state.sessions.new_session());

        set_client_cookie(jar, &client_id, DEFAULT_COOKIE_DURATION)
    }

    /// Starts a session for a new client and signs in as a verified user.
    fn sign_in_new_client(
        state: &AuthState,
        mailer: &RecordingMailer,
        jar: PrivateCookieJar,
    ) -> PrivateCookieJar {
        let client_id = ClientId::new_random();
        let session = state.sessions.new_session();
        state.sessions.insert(&client_id, session.clone());
        session
            .sign_up("jane@example.com", TEST_PASSWORD, NewProfile::default())
            .unwrap();
        let code = mailer.last_code(ActionKind::VerifyEmail).unwrap();
        session.identity().apply_action_code(&code).unwrap();
        session.sign_in("jane@example.com", TEST_PASSWORD).unwrap();

        set_client_cookie(jar, &client_id, DEFAULT_COOKIE_DURATION)
    }

    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_API_ROUTE: &str = "/api/protected";

    fn get_test_server() -> TestServer {
        let hash = sha2::Sha512::digest("nafstenoas");
        let mailer = RecordingMailer::default();
        let state = AuthState {
            cookie_key: Key::from(&hash),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            sessions: SessionRegistry::new(
                get_test_connection(),
                test_identity_config(&mailer),
                DEFAULT_COOKIE_DURATION,
            ),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .merge(
                Router::new()
                    .route(TEST_API_ROUTE, get(test_handler))
                    .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
            )
            .route("/anonymous", post(stub_anonymous_route))
            .route(
                "/sign_in",
                post(move |State(state): State<AuthState>, jar: PrivateCookieJar| {
                    let mailer = mailer.clone();
                    async move { sign_in_new_client(&state, &mailer, jar) }
                }),
            )
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn get_protected_route_with_signed_in_session() {
        let server = get_test_server();
        let jar = server.post("/sign_in").await.cookies();

        let response = server.get(TEST_PROTECTED_ROUTE).add_cookies(jar).await;

        response.assert_status_ok();
        response.assert_text("<h1>Hello, jane@example.com!</h1>");
    }

    #[tokio::test]
    async fn auth_guard_refreshes_client_cookie() {
        let server = get_test_server();
        let jar = server.post("/sign_in").await.cookies();

        let response = server.get(TEST_PROTECTED_ROUTE).add_cookies(jar).await;

        let jar = response.cookies();
        assert!(
            jar.get(COOKIE_CLIENT_ID).is_some(),
            "expected client cookie to be set by auth guard"
        );
    }

    #[tokio::test]
    async fn no_cookie_redirects_to_log_in() {
        let server = get_test_server();

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn invalid_cookie_redirects_to_log_in() {
        let server = get_test_server();

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::build((COOKIE_CLIENT_ID, "FOOBAR")).build())
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn anonymous_session_redirects_to_log_in() {
        let server = get_test_server();
        let jar = server.post("/anonymous").await.cookies();

        let response = server.get(TEST_PROTECTED_ROUTE).add_cookies(jar).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }

    #[tokio::test]
    async fn api_route_uses_hx_redirect() {
        let server = get_test_server();

        let response = server
            .get(TEST_API_ROUTE)
            .add_header("HX-Request", "true")
            .await;

        response.assert_status_ok();
        assert_eq!(response.header("hx-redirect"), endpoints::LOG_IN_VIEW);
    }
}
