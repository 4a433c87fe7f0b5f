//! Account creation endpoint.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar};
use axum_htmx::HxRedirect;

use crate::{
    Error, UserID, endpoints,
    chart::{ChartState, create_node, domain::AccountFormData},
    wallet::resolve_wallet_context,
};

/// Add an account to the chart of the active wallet.
pub async fn create_account_endpoint(
    State(state): State<ChartState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Form(form): Form<AccountFormData>,
) -> Response {
    let new_node = match form.into_new_node() {
        Ok(new_node) => new_node,
        Err(error) => return error.into_alert_response(),
    };

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

    match create_node(&context, new_node, &connection) {
        Ok(node) => {
            tracing::info!(
                "User {user_id} created account {} {} in wallet {}",
                node.code,
                node.name,
                node.wallet_id
            );

            (
                HxRedirect(endpoints::CHART_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(
            error @ (Error::MissingCategory
            | Error::NotFound
            | Error::DuplicateAccountCode(_)),
        ) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating an account: {error}");
            error.into_alert_response()
        }
    }
}
