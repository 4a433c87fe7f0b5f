//! Tracking which of the user's wallets is active.
//!
//! The active wallet's ID is kept in a private cookie. It is only trusted
//! after checking that the wallet belongs to the logged in user.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key, SameSite},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{
    AppState, Error, UserID, endpoints,
    wallet::{Wallet, WalletId, get_first_wallet, get_wallet},
};

/// The name of the cookie holding the active wallet's ID.
pub const ACTIVE_WALLET_COOKIE: &str = "active_wallet";

/// Store `wallet_id` as the active wallet.
///
/// The caller must check that the wallet belongs to the user first.
pub fn set_active_wallet(jar: PrivateCookieJar, wallet_id: WalletId) -> PrivateCookieJar {
    jar.add(
        Cookie::build((ACTIVE_WALLET_COOKIE, wallet_id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Remove the active wallet from the session.
pub fn clear_active_wallet(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((ACTIVE_WALLET_COOKIE, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// The wallet ID stored in the session, if any.
pub fn get_active_wallet_id(jar: &PrivateCookieJar) -> Option<WalletId> {
    jar.get(ACTIVE_WALLET_COOKIE)?
        .value_trimmed()
        .parse()
        .ok()
        .map(WalletId::new)
}

/// The logged in user together with the wallet their request applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletContext {
    pub user_id: UserID,
    pub wallet: Wallet,
}

/// Work out which wallet a request from `user_id` applies to.
///
/// The wallet in the session is used if it belongs to the user, otherwise
/// the user's oldest wallet is used.
///
/// # Errors
///
/// Returns [Error::NoWallet] if the user does not have any wallets.
pub fn resolve_wallet_context(
    user_id: UserID,
    jar: &PrivateCookieJar,
    connection: &Connection,
) -> Result<WalletContext, Error> {
    if let Some(wallet_id) = get_active_wallet_id(jar) {
        match get_wallet(user_id, wallet_id, connection) {
            Ok(wallet) => return Ok(WalletContext { user_id, wallet }),
            Err(Error::NotFound) => {
                tracing::debug!(
                    "Ignoring active wallet {wallet_id} which does not belong to user {user_id}"
                );
            }
            Err(error) => return Err(error),
        }
    }

    get_first_wallet(user_id, connection)?
        .map(|wallet| WalletContext { user_id, wallet })
        .ok_or(Error::NoWallet)
}

/// The state needed by handlers that read or change the active wallet.
#[derive(Debug, Clone)]
pub struct WalletState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for WalletState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<WalletState> for Key {
    fn from_ref(state: &WalletState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveWalletForm {
    pub wallet_id: i64,
}

/// Make one of the user's wallets the active wallet and go to its chart of accounts.
pub async fn set_active_wallet_endpoint(
    State(state): State<WalletState>,
    Extension(user_id): Extension<UserID>,
    jar: PrivateCookieJar,
    Form(form): Form<ActiveWalletForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match get_wallet(user_id, WalletId::new(form.wallet_id), &connection) {
        Ok(wallet) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::CHART_VIEW.to_owned()),
            set_active_wallet(jar, wallet.id),
        )
            .into_response(),
        Err(Error::NotFound) => Error::NotFound.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while activating wallet {}: {error}",
                form.wallet_id
            );
            error.into_alert_response()
        }
    }
}
