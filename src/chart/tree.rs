//! Reassembling the flat list of stored accounts into a tree.

use std::collections::HashMap;

use serde::Serialize;

use crate::chart::{AccountCategory, AccountCode, AccountId, AccountName, ChartNode};

/// An account together with the accounts directly below it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartTreeNode {
    pub id: AccountId,
    pub code: AccountCode,
    pub name: AccountName,
    #[serde(rename = "type")]
    pub category: AccountCategory,
    pub is_protected: bool,
    pub parent_id: Option<AccountId>,
    pub children: Vec<ChartTreeNode>,
}

impl ChartTreeNode {
    fn new(node: &ChartNode, children: Vec<ChartTreeNode>) -> Self {
        Self {
            id: node.id,
            code: node.code.clone(),
            name: node.name.clone(),
            category: node.category,
            is_protected: node.is_protected,
            parent_id: node.parent_id,
            children,
        }
    }
}

/// Build the tree of accounts below `parent_id`, or the whole chart when
/// `parent_id` is `None`.
///
/// Siblings keep their order from `nodes`. Accounts whose parent is not in
/// `nodes` cannot be reached and are left out, along with their descendants.
pub fn build_tree(nodes: &[ChartNode], parent_id: Option<AccountId>) -> Vec<ChartTreeNode> {
    let mut children_of: HashMap<Option<AccountId>, Vec<&ChartNode>> = HashMap::new();

    for node in nodes {
        children_of.entry(node.parent_id).or_default().push(node);
    }

    build_level(&children_of, parent_id)
}

fn build_level(
    children_of: &HashMap<Option<AccountId>, Vec<&ChartNode>>,
    parent_id: Option<AccountId>,
) -> Vec<ChartTreeNode> {
    children_of
        .get(&parent_id)
        .map(|children| {
            children
                .iter()
                .map(|node| ChartTreeNode::new(node, build_level(children_of, Some(node.id))))
                .collect()
        })
        .unwrap_or_default()
}

/// Walk `tree` in pre-order, pairing each account with its depth below the
/// top of `tree`.
pub fn walk_tree(tree: &[ChartTreeNode]) -> Vec<(usize, &ChartTreeNode)> {
    let mut visited = Vec::new();
    let mut stack: Vec<(usize, &ChartTreeNode)> = tree.iter().rev().map(|node| (0, node)).collect();

    while let Some((depth, node)) = stack.pop() {
        visited.push((depth, node));
        stack.extend(node.children.iter().rev().map(|child| (depth + 1, child)));
    }

    visited
}
