//! Carteira is a web app for organising personal finances into wallets.
//!
//! Every wallet carries its own chart of accounts: a tree of asset,
//! liability, equity, revenue and expense accounts. New wallets start with a
//! standard chart that users extend with their own accounts.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod chart;
mod db;
mod endpoints;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod timezone;
mod wallet;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{Email, PasswordHash, User, UserID, ValidatedPassword, create_user};
pub use chart::{AccountCategory, AccountCode, ChartNode, default_chart_size};
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use routing::build_router;
pub use wallet::{Wallet, WalletId, WalletName, create_wallet};

use crate::{
    alert::Alert,
    internal_server_error::InternalServerError,
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string used as an email address does not look like one.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email address is already used by another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An empty string was used as a wallet or account name.
    #[error("Name cannot be empty")]
    EmptyName,

    /// A wallet or account name was longer than the limit.
    #[error("Name cannot be longer than {0} characters")]
    NameTooLong(usize),

    /// A root account was created without choosing its category.
    ///
    /// Child accounts inherit the category of their parent, so only root
    /// accounts need one.
    #[error("A category must be chosen for a top-level account")]
    MissingCategory,

    /// The string does not name one of the account categories.
    #[error("\"{0}\" is not a valid account category")]
    InvalidCategory(String),

    /// The string is not a dotted account code such as "1.2.3".
    #[error("\"{0}\" is not a valid account code")]
    InvalidAccountCode(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The user does not have any wallets yet, so there is no active wallet.
    #[error("the user does not have a wallet")]
    NoWallet,

    /// Tried to rename or delete an account that was created with the wallet.
    #[error("the account \"{0}\" is protected and cannot be changed")]
    ProtectedAccount(String),

    /// The user already has a wallet with the same name.
    #[error("the wallet \"{0}\" already exists")]
    DuplicateWalletName(String),

    /// Another account in the wallet already uses the code.
    #[error("the account code \"{0}\" is already in use")]
    DuplicateAccountCode(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The auth cookie could not be created, read or extended.
    #[error("cookie error: {0}")]
    CookieError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::NoWallet => Redirect::to(endpoints::WALLETS_VIEW).into_response(),
            Error::ProtectedAccount(name) => InternalServerError {
                status: StatusCode::FORBIDDEN,
                header: "403",
                description: "Protected Account",
                fix: &format!(
                    "The account \"{name}\" is part of the standard chart of accounts \
                    and cannot be renamed or deleted."
                ),
            }
            .into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
                ..Default::default()
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as an alert fragment for HTMX requests.
    fn into_alert_response(self) -> Response {
        match self {
            Error::EmptyName
            | Error::NameTooLong(_)
            | Error::MissingCategory
            | Error::InvalidCategory(_)
            | Error::InvalidAccountCode(_) => Alert::Error {
                message: "Invalid input".to_owned(),
                details: self.to_string(),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::NotFound => Alert::Error {
                message: "Not found".to_owned(),
                details: "The wallet or account could not be found. \
                    Try refreshing the page to see if it has been deleted."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::NoWallet => Alert::Error {
                message: "No wallet".to_owned(),
                details: "Create a wallet before adding accounts.".to_owned(),
            }
            .into_response_with_status(StatusCode::NOT_FOUND),
            Error::ProtectedAccount(name) => Alert::Error {
                message: "Protected account".to_owned(),
                details: format!(
                    "The account \"{name}\" is part of the standard chart of accounts \
                    and cannot be renamed or deleted."
                ),
            }
            .into_response_with_status(StatusCode::FORBIDDEN),
            Error::DuplicateWalletName(name) => Alert::Error {
                message: "Duplicate wallet name".to_owned(),
                details: format!(
                    "You already have a wallet called \"{name}\". Choose a different name."
                ),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::DuplicateAccountCode(code) => Alert::Error {
                message: "Duplicate account code".to_owned(),
                details: format!(
                    "Another account was created with the code {code} at the same time. \
                    Try again."
                ),
            }
            .into_response_with_status(StatusCode::BAD_REQUEST),
            Error::InvalidTimezoneError(timezone) => Alert::Error {
                message: "Invalid Timezone Settings".to_owned(),
                details: format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
            _ => Alert::Error {
                message: "Something went wrong".to_owned(),
                details: "An unexpected error occurred, check the server logs for more details."
                    .to_owned(),
            }
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}
