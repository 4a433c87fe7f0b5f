//! Wallets group a user's accounts. Each wallet has its own chart of accounts.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;
mod session;

pub use create::create_wallet_endpoint;
pub use db::{
    create_wallet, create_wallet_table, delete_wallet, get_first_wallet, get_wallet, get_wallets,
    rename_wallet,
};
pub use delete::delete_wallet_endpoint;
pub(crate) use domain::validate_name;
pub use domain::{MAX_NAME_LENGTH, Wallet, WalletId, WalletName};
pub use edit::{get_edit_wallet_page, update_wallet_endpoint};
pub use list::get_wallets_page;
pub use session::{
    ACTIVE_WALLET_COOKIE, WalletContext, WalletState, clear_active_wallet, get_active_wallet_id,
    resolve_wallet_context, set_active_wallet, set_active_wallet_endpoint,
};

#[cfg(test)]
pub(crate) use db::test_utils;
