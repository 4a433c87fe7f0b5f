//! Log-out route handler that invalidates the session cookies and redirects to the log-in page.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth::invalidate_auth_cookie, endpoints, wallet::clear_active_wallet};

/// Invalidate the auth and active wallet cookies and redirect the client to the log-in page.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    let jar = clear_active_wallet(invalidate_auth_cookie(jar));

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}
