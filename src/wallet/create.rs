//! Wallet creation endpoint.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use axum_htmx::HxRedirect;

use crate::{
    Error, UserID, endpoints,
    wallet::{WalletName, WalletState, create_wallet, domain::WalletFormData, set_active_wallet},
};

/// Create a wallet with the default chart of accounts and make it the active wallet.
pub async fn create_wallet_endpoint(
    State(state): State<WalletState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Form(form): Form<WalletFormData>,
) -> Response {
    let name = match WalletName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_wallet(user_id, name, &connection) {
        Ok(wallet) => {
            tracing::info!("User {user_id} created wallet {} ({})", wallet.id, wallet.name);

            (
                StatusCode::SEE_OTHER,
                HxRedirect(endpoints::CHART_VIEW.to_owned()),
                set_active_wallet(jar, wallet.id),
            )
                .into_response()
        }
        Err(error @ Error::DuplicateWalletName(_)) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a wallet: {error}");
            error.into_alert_response()
        }
    }
}
