//! Database operations for the chart of accounts.

use rusqlite::{Connection, Row, Transaction, TransactionBehavior};

use crate::{
    Error,
    chart::{AccountCategory, AccountCode, AccountId, AccountName, ChartNode, NewChartNode},
    wallet::{WalletContext, WalletId},
};

/// Initialize the chart of accounts table.
///
/// Deleting a wallet deletes its accounts, and deleting an account deletes
/// every account below it.
pub fn create_chart_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS chart_account (
            id INTEGER PRIMARY KEY,
            wallet_id INTEGER NOT NULL,
            parent_id INTEGER,
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            category TEXT NOT NULL
                CHECK (category IN ('asset', 'liability', 'equity', 'revenue', 'expense')),
            is_protected INTEGER NOT NULL DEFAULT 0,
            UNIQUE(wallet_id, code),
            FOREIGN KEY(wallet_id) REFERENCES wallet(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(parent_id) REFERENCES chart_account(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_chart_account_parent_id ON chart_account(parent_id);",
    )?;

    Ok(())
}

/// Insert one account row and return its ID.
///
/// # Errors
///
/// Returns [Error::DuplicateAccountCode] if the wallet already has an account
/// with `code`.
pub(crate) fn insert_node(
    wallet_id: WalletId,
    parent_id: Option<AccountId>,
    code: &AccountCode,
    name: &str,
    category: AccountCategory,
    is_protected: bool,
    connection: &Connection,
) -> Result<AccountId, Error> {
    connection
        .execute(
            "INSERT INTO chart_account (wallet_id, parent_id, code, name, category, is_protected)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            (
                wallet_id.as_i64(),
                parent_id,
                code.to_string(),
                name,
                category,
                is_protected,
            ),
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("chart_account.code") =>
            {
                Error::DuplicateAccountCode(code.to_string())
            }
            error => error.into(),
        })?;

    Ok(connection.last_insert_rowid())
}

/// Add an account to the chart of the context's wallet.
///
/// A child account gets the next code below its parent and the parent's
/// category. A root account gets the next root code and must have a
/// category. The next code is one past the highest code among the new
/// account's siblings, so codes freed by deleting accounts are not reused.
/// Until a sibling is deleted this is the same as one past the number of
/// siblings; after a deletion the count would repeat a code still in use.
///
/// # Errors
///
/// Returns a:
/// - [Error::MissingCategory] if a root account has no category,
/// - [Error::NotFound] if the parent is not an account in the context's wallet,
/// - [Error::DuplicateAccountCode] if another account took the code first,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn create_node(
    context: &WalletContext,
    new_node: NewChartNode,
    connection: &Connection,
) -> Result<ChartNode, Error> {
    let wallet_id = context.wallet.id;

    if new_node.parent_id.is_none() && new_node.category.is_none() {
        return Err(Error::MissingCategory);
    }

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let (code, category) = match new_node.parent_id {
        Some(parent_id) => {
            let parent = get_node(wallet_id, parent_id, &transaction)?;
            let index = next_child_index(wallet_id, Some(parent_id), &transaction)?;

            (parent.code.child(index), parent.category)
        }
        None => {
            let category = new_node.category.ok_or(Error::MissingCategory)?;
            let index = next_child_index(wallet_id, None, &transaction)?;

            (AccountCode::root(index), category)
        }
    };

    let id = insert_node(
        wallet_id,
        new_node.parent_id,
        &code,
        new_node.name.as_ref(),
        category,
        false,
        &transaction,
    )?;

    transaction.commit()?;

    tracing::debug!("Created account {code} in wallet {wallet_id}");

    Ok(ChartNode {
        id,
        wallet_id,
        parent_id: new_node.parent_id,
        code,
        name: new_node.name,
        category,
        is_protected: false,
    })
}

/// One past the highest sibling position under `parent_id`, or under the
/// roots when `parent_id` is `None`.
fn next_child_index(
    wallet_id: WalletId,
    parent_id: Option<AccountId>,
    connection: &Connection,
) -> Result<u32, Error> {
    let codes = connection
        .prepare("SELECT code FROM chart_account WHERE wallet_id = ?1 AND parent_id IS ?2;")?
        .query_map((wallet_id.as_i64(), parent_id), |row| {
            row.get::<_, AccountCode>(0)
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let highest = codes
        .iter()
        .map(AccountCode::last_segment)
        .max()
        .unwrap_or(0);

    Ok(highest + 1)
}

/// Retrieve the account `node_id` if it is in the chart of `wallet_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if the account does not exist or belongs to another wallet.
pub fn get_node(
    wallet_id: WalletId,
    node_id: AccountId,
    connection: &Connection,
) -> Result<ChartNode, Error> {
    connection
        .prepare(
            "SELECT id, wallet_id, parent_id, code, name, category, is_protected
            FROM chart_account WHERE id = ?1 AND wallet_id = ?2;",
        )?
        .query_row((node_id, wallet_id.as_i64()), map_row)
        .map_err(|error| error.into())
}

/// Retrieve every account in the chart of `wallet_id`, sorted by code.
pub fn get_chart_nodes(wallet_id: WalletId, connection: &Connection) -> Result<Vec<ChartNode>, Error> {
    let mut nodes = connection
        .prepare(
            "SELECT id, wallet_id, parent_id, code, name, category, is_protected
            FROM chart_account WHERE wallet_id = ?1;",
        )?
        .query_map([wallet_id.as_i64()], map_row)?
        .collect::<Result<Vec<_>, _>>()?;

    // Codes are text in the database, so SQL would put "1.10" before "1.2".
    nodes.sort_by(|a, b| a.code.cmp(&b.code));

    Ok(nodes)
}

/// Change the name of an account in the context's wallet.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if the account is not in the context's wallet,
/// - [Error::ProtectedAccount] if the account is part of the default chart,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn rename_node(
    context: &WalletContext,
    node_id: AccountId,
    name: AccountName,
    connection: &Connection,
) -> Result<ChartNode, Error> {
    let node = get_unprotected_node(context.wallet.id, node_id, connection)?;

    connection.execute(
        "UPDATE chart_account SET name = ?1 WHERE id = ?2;",
        (name.as_ref(), node_id),
    )?;

    Ok(ChartNode { name, ..node })
}

/// Delete an account in the context's wallet together with every account below it.
///
/// Accounts below the deleted account are removed even if they are protected.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if the account is not in the context's wallet,
/// - [Error::ProtectedAccount] if the account is part of the default chart,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn delete_node(
    context: &WalletContext,
    node_id: AccountId,
    connection: &Connection,
) -> Result<(), Error> {
    let node = get_unprotected_node(context.wallet.id, node_id, connection)?;

    connection.execute("DELETE FROM chart_account WHERE id = ?1;", [node_id])?;

    tracing::debug!("Deleted account {} in wallet {}", node.code, node.wallet_id);

    Ok(())
}

fn get_unprotected_node(
    wallet_id: WalletId,
    node_id: AccountId,
    connection: &Connection,
) -> Result<ChartNode, Error> {
    let node = get_node(wallet_id, node_id, connection)?;

    if node.is_protected {
        return Err(Error::ProtectedAccount(node.name.to_string()));
    }

    Ok(node)
}

fn map_row(row: &Row) -> Result<ChartNode, rusqlite::Error> {
    let raw_name: String = row.get(4)?;

    Ok(ChartNode {
        id: row.get(0)?,
        wallet_id: WalletId::new(row.get(1)?),
        parent_id: row.get(2)?,
        code: row.get(3)?,
        name: AccountName::new_unchecked(&raw_name),
        category: row.get(5)?,
        is_protected: row.get(6)?,
    })
}
