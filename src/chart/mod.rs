//! The chart of accounts of each wallet.
//!
//! Accounts form a tree. Each account has a dotted code that shows its
//! position, e.g. "1.1.2" is the second child of "1.1". Codes are derived
//! when an account is created and never change.

mod api;
mod create;
mod db;
mod default_chart;
mod delete;
mod domain;
mod edit;
mod page;
mod tree;

pub use api::{ChartResponse, get_chart_json};
pub use create::create_account_endpoint;
pub use db::{
    create_chart_table, create_node, delete_node, get_chart_nodes, get_node, rename_node,
};
pub use default_chart::{default_chart_size, seed_default_chart};
pub use delete::delete_account_endpoint;
pub use domain::{AccountCategory, AccountCode, AccountId, AccountName, ChartNode, NewChartNode};
pub use edit::{get_edit_account_page, update_account_endpoint};
pub use page::{ChartState, get_chart_page};
pub use tree::{ChartTreeNode, build_tree, walk_tree};

#[cfg(test)]
pub(crate) use db::test_utils;
