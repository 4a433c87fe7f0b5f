//! Database operations for wallets.

use rusqlite::{Connection, Row, Transaction, TransactionBehavior};

use crate::{
    Error, UserID,
    chart::seed_default_chart,
    wallet::{Wallet, WalletId, WalletName},
};

/// Initialize the wallet table.
///
/// Deleting a user deletes their wallets, and deleting a wallet deletes its
/// chart of accounts.
pub fn create_wallet_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS wallet (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_wallet_user_id ON wallet(user_id);",
    )?;

    Ok(())
}

/// Create a wallet for `user_id` together with its default chart of accounts.
///
/// The wallet and its chart are written in one transaction, so either both
/// exist afterwards or neither does.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateWalletName] if the user already has a wallet called `name`,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_wallet(
    user_id: UserID,
    name: WalletName,
    connection: &Connection,
) -> Result<Wallet, Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    transaction
        .execute(
            "INSERT INTO wallet (user_id, name) VALUES (?1, ?2);",
            (user_id.as_i64(), name.as_ref()),
        )
        .map_err(|error| map_duplicate_name_error(error, &name))?;

    let id = WalletId::new(transaction.last_insert_rowid());
    seed_default_chart(id, &transaction)?;

    transaction.commit()?;

    tracing::debug!("Created wallet {id} for user {user_id}");

    Ok(Wallet { id, user_id, name })
}

/// Retrieve the wallet `wallet_id` if it belongs to `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the wallet does not exist or belongs to another user.
pub fn get_wallet(
    user_id: UserID,
    wallet_id: WalletId,
    connection: &Connection,
) -> Result<Wallet, Error> {
    connection
        .prepare("SELECT id, user_id, name FROM wallet WHERE id = ?1 AND user_id = ?2;")?
        .query_row((wallet_id.as_i64(), user_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve all of the user's wallets, oldest first.
pub fn get_wallets(user_id: UserID, connection: &Connection) -> Result<Vec<Wallet>, Error> {
    connection
        .prepare("SELECT id, user_id, name FROM wallet WHERE user_id = ?1 ORDER BY id ASC;")?
        .query_map([user_id.as_i64()], map_row)?
        .map(|maybe_wallet| maybe_wallet.map_err(|error| error.into()))
        .collect()
}

/// Retrieve the user's oldest wallet, if they have any.
pub fn get_first_wallet(user_id: UserID, connection: &Connection) -> Result<Option<Wallet>, Error> {
    match connection
        .prepare("SELECT id, user_id, name FROM wallet WHERE user_id = ?1 ORDER BY id ASC LIMIT 1;")?
        .query_row([user_id.as_i64()], map_row)
    {
        Ok(wallet) => Ok(Some(wallet)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Change the name of one of the user's wallets.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if the wallet does not exist or belongs to another user,
/// - [Error::DuplicateWalletName] if the user already has another wallet called `name`,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn rename_wallet(
    user_id: UserID,
    wallet_id: WalletId,
    name: WalletName,
    connection: &Connection,
) -> Result<Wallet, Error> {
    let rows_affected = connection
        .execute(
            "UPDATE wallet SET name = ?1 WHERE id = ?2 AND user_id = ?3;",
            (name.as_ref(), wallet_id.as_i64(), user_id.as_i64()),
        )
        .map_err(|error| map_duplicate_name_error(error, &name))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(Wallet {
        id: wallet_id,
        user_id,
        name,
    })
}

/// Delete one of the user's wallets and, through the foreign keys, its chart of accounts.
///
/// # Errors
///
/// Returns [Error::NotFound] if the wallet does not exist or belongs to another user.
pub fn delete_wallet(
    user_id: UserID,
    wallet_id: WalletId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM wallet WHERE id = ?1 AND user_id = ?2;",
        (wallet_id.as_i64(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    tracing::debug!("Deleted wallet {wallet_id} of user {user_id}");

    Ok(())
}

fn map_duplicate_name_error(error: rusqlite::Error, name: &WalletName) -> Error {
    match error {
        // Code 2067 occurs when a UNIQUE constraint failed.
        rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
            if sql_error.extended_code == 2067 && desc.ends_with("wallet.name") =>
        {
            Error::DuplicateWalletName(name.to_string())
        }
        error => error.into(),
    }
}

fn map_row(row: &Row) -> Result<Wallet, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id = row.get(1)?;
    let raw_name: String = row.get(2)?;

    Ok(Wallet {
        id: WalletId::new(id),
        user_id: UserID::new(user_id),
        name: WalletName::new_unchecked(&raw_name),
    })
}
