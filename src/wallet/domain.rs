//! Core wallet domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{Error, UserID};

/// The longest name, in characters, that wallets and accounts may have.
pub const MAX_NAME_LENGTH: usize = 255;

/// Trim `name` and check that it is not empty or too long.
pub(crate) fn validate_name(name: &str) -> Result<&str, Error> {
    let name = name.trim();

    if name.is_empty() {
        Err(Error::EmptyName)
    } else if name.chars().count() > MAX_NAME_LENGTH {
        Err(Error::NameTooLong(MAX_NAME_LENGTH))
    } else {
        Ok(name)
    }
}

/// Database identifier for a wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct WalletId(i64);

impl WalletId {
    /// Create a new wallet ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the wallet ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A validated wallet name: trimmed, non-empty and at most
/// [MAX_NAME_LENGTH] characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct WalletName(String);

impl WalletName {
    /// Create a wallet name.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyName] if `name` is empty or only whitespace, or
    /// [Error::NameTooLong] if it is longer than [MAX_NAME_LENGTH] characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        validate_name(name).map(|name| Self(name.to_owned()))
    }

    /// Create a wallet name without validation.
    ///
    /// The caller should ensure that the name is trimmed, non-empty and not
    /// too long.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for WalletName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for WalletName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A collection of accounts owned by one user, e.g. "Household" or "Business".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub user_id: UserID,
    pub name: WalletName,
}

/// Form data for wallet creation and renaming.
#[derive(Debug, Serialize, Deserialize)]
pub struct WalletFormData {
    pub name: String,
}
