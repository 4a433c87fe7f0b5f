//! Database set up for the application's SQLite database.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, auth::create_user_table, chart::create_chart_table, wallet::create_wallet_table};

/// Create the tables for the domain models if they do not exist yet.
///
/// Also turns on foreign key enforcement for `connection`, which the cascading
/// deletes of wallets and accounts rely on.
///
/// # Errors
/// Returns an error if an SQL error occurred.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Has no effect inside a transaction, so it must come first.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_wallet_table(&transaction)?;
    create_chart_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
