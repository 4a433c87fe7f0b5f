//! Middleware that only lets requests with a valid auth cookie through.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{StatusCode, header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::{Duration, UtcOffset};

use crate::{
    AppState,
    auth::{
        UserID, build_log_in_redirect_url,
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
    },
    timezone::get_local_offset,
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// How long an auth cookie stays valid after the user's latest request.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// How a rejected request is sent to the log-in page.
#[derive(Debug, Clone, Copy)]
enum LogInRedirect {
    /// A normal `303 See Other` for full page loads.
    Page,
    /// An `HX-Redirect` header so HTMX loads the page instead of swapping it in.
    Htmx,
}

impl LogInRedirect {
    fn to(self, url: String) -> Response {
        match self {
            LogInRedirect::Page => Redirect::to(&url).into_response(),
            LogInRedirect::Htmx => (HxRedirect(url), StatusCode::OK).into_response(),
        }
    }
}

/// Read the user out of the auth cookie, or explain why there is none.
async fn authenticate(
    parts: &mut Parts,
    state: &AuthState,
) -> Result<(PrivateCookieJar, UserID), String> {
    let jar = PrivateCookieJar::from_request_parts(parts, state)
        .await
        .map_err(|error| format!("could not read cookie jar: {error:?}"))?;

    let token = get_token_from_cookies(&jar).map_err(|error| error.to_string())?;

    Ok((jar, token.user_id))
}

fn refresh_auth_cookie(
    jar: PrivateCookieJar,
    duration: Duration,
    local_offset: UtcOffset,
) -> PrivateCookieJar {
    match extend_auth_cookie_duration_if_needed(jar.clone(), duration, local_offset) {
        Ok(refreshed_jar) => refreshed_jar,
        Err(error) => {
            tracing::error!("Could not extend the auth cookie: {error}. Keeping the old cookie.");
            jar
        }
    }
}

/// Add the `Set-Cookie` headers from `jar` to `response`.
///
/// Handlers set their own cookies (e.g. the active wallet), so the headers are
/// appended rather than replaced.
fn append_cookies(response: Response, jar: PrivateCookieJar) -> Response {
    let (mut parts, body) = response.into_parts();

    let jar_response = jar.into_response();
    for value in jar_response.headers().get_all(SET_COOKIE) {
        parts.headers.append(SET_COOKIE, value.to_owned());
    }

    Response::from_parts(parts, body)
}

async fn guard(
    state: AuthState,
    request: Request,
    next: Next,
    redirect: LogInRedirect,
) -> Response {
    let log_in_url = build_log_in_redirect_url(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!(
            "Could not get the local offset for the timezone {}, redirecting to the log-in page.",
            state.local_timezone
        );
        return redirect.to(log_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let (jar, user_id) = match authenticate(&mut parts, &state).await {
        Ok(authenticated) => authenticated,
        Err(reason) => {
            tracing::debug!("Rejected request to {}: {reason}", parts.uri.path());
            return redirect.to(log_in_url);
        }
    };

    parts.extensions.insert(user_id);
    let response = next.run(Request::from_parts(parts, body)).await;

    let jar = refresh_auth_cookie(jar, state.cookie_duration, local_offset);
    append_cookies(response, jar)
}

/// Middleware function that checks for a valid authorization cookie.
///
/// If the cookie is valid, the [UserID] is added to the request extensions,
/// the request runs as normal and the cookie's expiry is pushed back.
/// Otherwise the client is redirected to the log-in page.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, LogInRedirect::Page).await
}

/// The same as [auth_guard], but for the `/api` routes called by HTMX.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, LogInRedirect::Htmx).await
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router, middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key, SameSite},
    };
    use axum_test::TestServer;
    use sha2::Digest;
    use time::{Duration, OffsetDateTime, UtcOffset};

    use crate::{
        auth::{
            AuthState, COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, UserID, auth_guard, auth_guard_hx,
            set_auth_cookie,
        },
        endpoints,
        wallet::{ACTIVE_WALLET_COOKIE, WalletId, set_active_wallet},
    };

    const TEST_LOG_IN_ROUTE: &str = "/log_in_stub";
    const TEST_PROTECTED_ROUTE: &str = "/protected";
    const TEST_API_ROUTE: &str = "/api/protected";
    const TEST_WALLET_ROUTE: &str = "/api/wallet_stub";

    async fn greet_user(Extension(user_id): Extension<UserID>) -> String {
        format!("Hello, user {user_id}!")
    }

    async fn activate_wallet(jar: PrivateCookieJar) -> PrivateCookieJar {
        set_active_wallet(jar, WalletId::new(7))
    }

    fn get_state() -> AuthState {
        AuthState {
            cookie_key: Key::from(&sha2::Sha512::digest("nafstenoas")),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    /// A server whose log-in stub issues cookies valid for `log_in_duration`.
    fn get_test_server(log_in_duration: Duration) -> TestServer {
        let state = get_state();
        let log_in = move |jar: PrivateCookieJar| async move {
            set_auth_cookie(jar, UserID::new(1), log_in_duration, UtcOffset::UTC)
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(greet_user))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .merge(
                Router::new()
                    .route(TEST_API_ROUTE, get(greet_user))
                    .route(TEST_WALLET_ROUTE, post(activate_wallet))
                    .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
            )
            .route(TEST_LOG_IN_ROUTE, post(log_in))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn want_log_in_location(redirect_url: &str) -> String {
        let query = serde_urlencoded::to_string([("redirect_url", redirect_url)]).unwrap();
        format!("{}?{}", endpoints::LOG_IN_VIEW, query)
    }

    #[track_caller]
    fn assert_date_time_close(left: OffsetDateTime, right: OffsetDateTime) {
        assert!(
            (left - right).abs() < Duration::seconds(2),
            "got date time {left:?}, want {right:?}"
        );
    }

    #[tokio::test]
    async fn valid_cookie_passes_user_id_to_handler() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let token_cookie = server.post(TEST_LOG_IN_ROUTE).await.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status_ok();
        response.assert_text("Hello, user 1!");
    }

    #[tokio::test]
    async fn request_pushes_back_cookie_expiry() {
        let server = get_test_server(Duration::seconds(5));
        let jar = server.post(TEST_LOG_IN_ROUTE).await.cookies();

        let response = server.get(TEST_PROTECTED_ROUTE).add_cookies(jar).await;

        let auth_cookie = response.cookie(COOKIE_TOKEN);
        assert_date_time_close(
            auth_cookie.expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION,
        );
        assert_eq!(auth_cookie.secure(), Some(true));
        assert_eq!(auth_cookie.http_only(), Some(true));
        assert_eq!(auth_cookie.same_site(), Some(SameSite::Strict));
    }

    #[tokio::test]
    async fn handler_cookies_survive_cookie_refresh() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let jar = server.post(TEST_LOG_IN_ROUTE).await.cookies();

        let response = server.post(TEST_WALLET_ROUTE).add_cookies(jar).await;

        response.assert_status_ok();
        let set_cookies: Vec<String> = response
            .headers()
            .get_all("set-cookie")
            .iter()
            .map(|value| value.to_str().unwrap().to_owned())
            .collect();
        assert!(
            set_cookies
                .iter()
                .any(|cookie| cookie.starts_with(ACTIVE_WALLET_COOKIE)),
            "active wallet cookie missing from {set_cookies:?}"
        );
        assert!(
            set_cookies
                .iter()
                .any(|cookie| cookie.starts_with(COOKIE_TOKEN)),
            "auth cookie missing from {set_cookies:?}"
        );
    }

    #[tokio::test]
    async fn missing_or_garbled_cookie_redirects_to_log_in() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);

        let without_cookie = server.get(TEST_PROTECTED_ROUTE).await;
        let with_garbage = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(Cookie::build((COOKIE_TOKEN, "FOOBAR")).build())
            .await;

        for response in [without_cookie, with_garbage] {
            response.assert_status_see_other();
            assert_eq!(
                response.header("location"),
                want_log_in_location(TEST_PROTECTED_ROUTE)
            );
        }
    }

    #[tokio::test]
    async fn expired_cookie_redirects_to_log_in() {
        let server = get_test_server(Duration::seconds(-10));
        let token_cookie = server.post(TEST_LOG_IN_ROUTE).await.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            want_log_in_location(TEST_PROTECTED_ROUTE)
        );
    }

    #[tokio::test]
    async fn api_route_redirects_back_to_current_page() {
        let server = get_test_server(DEFAULT_COOKIE_DURATION);
        let current_url = "/chart";

        let response = server
            .get(TEST_API_ROUTE)
            .add_header("HX-Request", "true")
            .add_header("HX-Current-URL", current_url)
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header("hx-redirect"),
            want_log_in_location(current_url)
        );
    }
}
