//! Account deletion endpoint.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;

use crate::{
    Error, UserID, endpoints,
    chart::{AccountId, ChartState, delete_node},
    wallet::resolve_wallet_context,
};

/// Delete an account and every account below it, then reload the chart.
pub async fn delete_account_endpoint(
    Path(account_id): Path<AccountId>,
    State(state): State<ChartState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let context = match resolve_wallet_context(user_id, &jar, &connection) {
        Ok(context) => context,
        Err(error) => return error.into_alert_response(),
    };

    match delete_node(&context, account_id, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::CHART_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::NotFound | Error::ProtectedAccount(_))) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting account {account_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
