//! Core chart of accounts domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize, Serializer};

use crate::{
    Error,
    wallet::{WalletId, validate_name},
};

/// The top-level classification of an account.
///
/// Every account in a subtree shares the category of its root account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountCategory {
    /// Resources owned, e.g. cash or a checking account.
    Asset,
    /// Amounts owed to others.
    Liability,
    /// The owner's stake.
    Equity,
    /// Income earned.
    Revenue,
    /// Costs incurred.
    Expense,
}

impl AccountCategory {
    /// All categories in the order they appear in the default chart.
    pub const ALL: [AccountCategory; 5] = [
        AccountCategory::Asset,
        AccountCategory::Liability,
        AccountCategory::Equity,
        AccountCategory::Revenue,
        AccountCategory::Expense,
    ];

    /// The lowercase name used in storage, forms and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountCategory::Asset => "asset",
            AccountCategory::Liability => "liability",
            AccountCategory::Equity => "equity",
            AccountCategory::Revenue => "revenue",
            AccountCategory::Expense => "expense",
        }
    }

    /// The capitalised name shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            AccountCategory::Asset => "Asset",
            AccountCategory::Liability => "Liability",
            AccountCategory::Equity => "Equity",
            AccountCategory::Revenue => "Revenue",
            AccountCategory::Expense => "Expense",
        }
    }
}

impl FromStr for AccountCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        AccountCategory::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::InvalidCategory(s.to_owned()))
    }
}

impl Display for AccountCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for AccountCategory {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AccountCategory {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A hierarchical account code such as "1.1.2".
///
/// Each segment is a positive integer. Codes order segment by segment,
/// numerically, so "1.2" comes before "1.10" and a parent comes before its
/// children.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountCode(Vec<u32>);

impl AccountCode {
    /// The code of the `index`-th root account, counting from one.
    pub fn root(index: u32) -> Self {
        Self(vec![index])
    }

    /// The code of the `index`-th child of this account, counting from one.
    pub fn child(&self, index: u32) -> Self {
        let mut segments = self.0.clone();
        segments.push(index);

        Self(segments)
    }

    /// The position of the account among its siblings.
    pub fn last_segment(&self) -> u32 {
        self.0.last().copied().unwrap_or_default()
    }

    /// How many levels below the roots the account sits, roots being depth zero.
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }
}

impl FromStr for AccountCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidAccountCode(s.to_owned());

        let segments = s
            .split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|byte| byte.is_ascii_digit()) {
                    return Err(invalid());
                }

                match segment.parse::<u32>() {
                    Ok(0) | Err(_) => Err(invalid()),
                    Ok(value) => Ok(value),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self(segments))
    }
}

impl Display for AccountCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }

            write!(f, "{segment}")?;
        }

        Ok(())
    }
}

impl Serialize for AccountCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromSql for AccountCode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// A validated account name: trimmed, non-empty and at most
/// [MAX_NAME_LENGTH](crate::wallet::MAX_NAME_LENGTH) characters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(transparent)]
pub struct AccountName(String);

impl AccountName {
    /// Create an account name.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyName] if `name` is empty or only whitespace, or
    /// [Error::NameTooLong] if it is too long.
    pub fn new(name: &str) -> Result<Self, Error> {
        validate_name(name).map(|name| Self(name.to_owned()))
    }

    /// Create an account name without validation.
    ///
    /// The caller should ensure that the name is trimmed, non-empty and not
    /// too long.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_owned())
    }
}

impl AsRef<str> for AccountName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for AccountName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier for an account in a chart of accounts.
pub type AccountId = i64;

/// One account in a wallet's chart of accounts, as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartNode {
    pub id: AccountId,
    pub wallet_id: WalletId,
    /// `None` for the root accounts.
    pub parent_id: Option<AccountId>,
    pub code: AccountCode,
    pub name: AccountName,
    pub category: AccountCategory,
    /// Accounts from the default chart cannot be renamed or deleted.
    pub is_protected: bool,
}

/// The details needed to add an account to a chart.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChartNode {
    pub name: AccountName,
    pub parent_id: Option<AccountId>,
    /// Only used for root accounts. Child accounts take their parent's category.
    pub category: Option<AccountCategory>,
}

/// Form data for creating an account.
///
/// Empty `parent_id` and `category` fields are read as `None`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountFormData {
    pub name: String,
    pub parent_id: Option<AccountId>,
    pub category: Option<String>,
}

impl AccountFormData {
    /// Validate the form.
    ///
    /// The category is only read for root accounts, so an invalid category
    /// on a child account is not an error.
    pub fn into_new_node(self) -> Result<NewChartNode, Error> {
        let name = AccountName::new(&self.name)?;

        let category = match (self.parent_id, self.category.as_deref()) {
            (None, Some(category)) if !category.trim().is_empty() => Some(category.parse()?),
            _ => None,
        };

        Ok(NewChartNode {
            name,
            parent_id: self.parent_id,
            category,
        })
    }
}

/// Form data for renaming an account.
#[derive(Debug, Serialize, Deserialize)]
pub struct RenameAccountFormData {
    pub name: String,
}
