//! The state shared by every request handler.
//!
//! Handlers do not take [AppState] directly. Each family of handlers declares
//! a smaller state struct next to its handlers (e.g. `ChartState`) with a
//! `FromRef<AppState>` impl, so the router only needs this one value.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize, timezone::get_local_offset};

/// Settings and resources for the whole app.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Signs and encrypts the auth and active wallet cookies.
    pub cookie_key: Key,

    /// How long an auth cookie stays valid after the user's latest request.
    pub cookie_duration: Duration,

    /// The canonical name of the timezone used for cookie expiry times.
    pub local_timezone: String,

    /// The single connection to the app database.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Set up the database behind `db_connection` and build the app state.
    ///
    /// `cookie_secret` is hashed into the cookie key, so the same secret keeps
    /// existing sessions valid across restarts.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidTimezoneError] if `local_timezone` is not a
    /// canonical timezone name such as "Pacific/Auckland", or an SQL error if
    /// the tables could not be created.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the cookie key from `secret` with SHA-512.
pub fn create_cookie_key(secret: &str) -> Key {
    Key::from(&Sha512::digest(secret))
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::Error;

    use super::{AppState, create_cookie_key};

    #[test]
    fn cookie_key_depends_only_on_secret() {
        assert_eq!(
            create_cookie_key("foobar").master(),
            create_cookie_key("foobar").master()
        );
        assert_ne!(
            create_cookie_key("foobar").master(),
            create_cookie_key("barfoo").master()
        );
    }

    #[test]
    fn new_creates_tables() {
        let connection = Connection::open_in_memory().unwrap();

        let state = AppState::new(connection, "secret", "Etc/UTC").expect("Could not create state");

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' \
                AND name IN ('user', 'wallet', 'chart_account')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 3);
    }

    #[test]
    fn new_rejects_unknown_timezone() {
        let connection = Connection::open_in_memory().unwrap();

        let result = AppState::new(connection, "secret", "Middle/Earth");

        assert_eq!(
            result.map(|_| ()),
            Err(Error::InvalidTimezoneError("Middle/Earth".to_owned()))
        );
    }
}
