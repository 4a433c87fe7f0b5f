//! The standard chart of accounts every new wallet starts with.

use rusqlite::Connection;

use crate::{
    Error,
    chart::{AccountCategory, AccountCode, AccountId, db::insert_node},
    wallet::WalletId,
};

/// An account in the default chart. Codes follow from the position in the tree.
struct DefaultAccount {
    name: &'static str,
    children: &'static [DefaultAccount],
}

const fn leaf(name: &'static str) -> DefaultAccount {
    DefaultAccount {
        name,
        children: &[],
    }
}

/// The root accounts in code order, each with the category its subtree uses.
static DEFAULT_CHART: [(AccountCategory, DefaultAccount); 5] = [
    (
        AccountCategory::Asset,
        DefaultAccount {
            name: "Assets",
            children: &[
                DefaultAccount {
                    name: "Current Assets",
                    children: &[DefaultAccount {
                        name: "Available",
                        children: &[leaf("Cash"), leaf("Checking Account")],
                    }],
                },
                leaf("Non-Current Assets"),
            ],
        },
    ),
    (
        AccountCategory::Liability,
        DefaultAccount {
            name: "Liabilities",
            children: &[
                DefaultAccount {
                    name: "Current Liabilities",
                    children: &[leaf("Suppliers"), leaf("Tax Obligations")],
                },
                leaf("Non-Current Liabilities"),
            ],
        },
    ),
    (
        AccountCategory::Equity,
        DefaultAccount {
            name: "Equity",
            children: &[leaf("Share Capital"), leaf("Reserves")],
        },
    ),
    (
        AccountCategory::Revenue,
        DefaultAccount {
            name: "Revenue",
            children: &[leaf("Operating Revenue")],
        },
    ),
    (
        AccountCategory::Expense,
        DefaultAccount {
            name: "Expenses",
            children: &[leaf("Operating Expenses"), leaf("Financial Expenses")],
        },
    ),
];

/// The number of accounts a new wallet starts with.
pub fn default_chart_size() -> usize {
    fn count(account: &DefaultAccount) -> usize {
        1 + account.children.iter().map(count).sum::<usize>()
    }

    DEFAULT_CHART
        .iter()
        .map(|(_, account)| count(account))
        .sum()
}

/// Insert the default chart of accounts for `wallet_id`.
///
/// All accounts are protected. Parents are inserted before their children so
/// that each child can refer to its parent's ID. The caller is expected to
/// run this inside the transaction that created the wallet.
///
/// # Errors
///
/// Returns an [Error::SqlError] if an insert fails, e.g. because the wallet
/// already has accounts.
pub fn seed_default_chart(wallet_id: WalletId, connection: &Connection) -> Result<(), Error> {
    struct Pending {
        account: &'static DefaultAccount,
        code: AccountCode,
        category: AccountCategory,
        parent_id: Option<AccountId>,
    }

    // Pushed in reverse so that accounts are popped, and inserted, in code order.
    let mut stack: Vec<Pending> = DEFAULT_CHART
        .iter()
        .enumerate()
        .rev()
        .map(|(index, (category, account))| Pending {
            account,
            code: AccountCode::root(index as u32 + 1),
            category: *category,
            parent_id: None,
        })
        .collect();

    while let Some(Pending {
        account,
        code,
        category,
        parent_id,
    }) = stack.pop()
    {
        let id = insert_node(
            wallet_id,
            parent_id,
            &code,
            account.name,
            category,
            true,
            connection,
        )?;

        stack.extend(
            account
                .children
                .iter()
                .enumerate()
                .rev()
                .map(|(index, child)| Pending {
                    account: child,
                    code: code.child(index as u32 + 1),
                    category,
                    parent_id: Some(id),
                }),
        );
    }

    tracing::debug!("Seeded the default chart of accounts for wallet {wallet_id}");

    Ok(())
}
