//! Wallet deletion endpoint.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use rusqlite::Connection;

use crate::{
    Error, UserID,
    alert::Alert,
    wallet::{
        WalletId, WalletState, clear_active_wallet, delete_wallet, get_active_wallet_id,
        get_first_wallet, set_active_wallet,
    },
};

/// Delete one of the user's wallets along with its chart of accounts.
///
/// If the deleted wallet was the active wallet, the user's oldest remaining
/// wallet becomes active instead.
pub async fn delete_wallet_endpoint(
    Path(wallet_id): Path<i64>,
    State(state): State<WalletState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
) -> Response {
    let wallet_id = WalletId::new(wallet_id);

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = delete_wallet(user_id, wallet_id, &connection) {
        if error != Error::NotFound {
            tracing::error!("An unexpected error occurred while deleting wallet {wallet_id}: {error}");
        }

        return error.into_alert_response();
    }

    let jar = if get_active_wallet_id(&jar) == Some(wallet_id) {
        match reassign_active_wallet(user_id, jar, &connection) {
            Ok(jar) => jar,
            Err(error) => {
                tracing::error!("Could not choose a new active wallet: {error}");
                return error.into_alert_response();
            }
        }
    } else {
        jar
    };

    (
        jar,
        Alert::SuccessSimple {
            message: "Wallet deleted successfully".to_owned(),
        },
    )
        .into_response()
}

fn reassign_active_wallet(
    user_id: UserID,
    jar: PrivateCookieJar,
    connection: &Connection,
) -> Result<PrivateCookieJar, Error> {
    let jar = match get_first_wallet(user_id, connection)? {
        Some(wallet) => set_active_wallet(jar, wallet.id),
        None => clear_active_wallet(jar),
    };

    Ok(jar)
}
