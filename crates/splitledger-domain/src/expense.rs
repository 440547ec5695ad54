//! Domain models for shared expenses and their per-participant splits.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{ExpenseId, GroupId, UserId};
use crate::money::Money;

/// Upper bound on expense titles, in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Categorises a shared expense for filtering and reporting.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Food,
    Transport,
    Accommodation,
    Activity,
    Shopping,
    Utilities,
    #[default]
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 7] = [
        ExpenseCategory::Food,
        ExpenseCategory::Transport,
        ExpenseCategory::Accommodation,
        ExpenseCategory::Activity,
        ExpenseCategory::Shopping,
        ExpenseCategory::Utilities,
        ExpenseCategory::Other,
    ];

    /// Returns the stable storage key for the category.
    pub fn key(self) -> &'static str {
        match self {
            ExpenseCategory::Food => "food",
            ExpenseCategory::Transport => "transport",
            ExpenseCategory::Accommodation => "accommodation",
            ExpenseCategory::Activity => "activity",
            ExpenseCategory::Shopping => "shopping",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Other => "other",
        }
    }

    /// Resolves a storage key back to its category.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.key() == key)
    }

    /// Returns the human-readable label for the category.
    pub fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Food => "Food & Dining",
            ExpenseCategory::Transport => "Transportation",
            ExpenseCategory::Accommodation => "Accommodation",
            ExpenseCategory::Activity => "Activities",
            ExpenseCategory::Shopping => "Shopping",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A shared expense paid by one group member on behalf of several.
///
/// Immutable once recorded; the only lifecycle operation is deletion, which
/// removes the expense together with its splits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: ExpenseId,
    pub group: GroupId,
    pub paid_by: UserId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount: Money,
    pub date: NaiveDate,
    pub category: ExpenseCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        group: GroupId,
        paid_by: UserId,
        title: impl Into<String>,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: ExpenseId::new(),
            group,
            paid_by,
            title: title.into(),
            description: None,
            amount,
            date,
            category: ExpenseCategory::default(),
            receipt: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_category(mut self, category: ExpenseCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_receipt(mut self, receipt: impl Into<String>) -> Self {
        self.receipt = Some(receipt.into());
        self
    }
}

/// The portion of one expense owed by one participant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseSplit {
    pub expense: ExpenseId,
    pub user: UserId,
    pub amount_owed: Money,
    #[serde(default)]
    pub is_settled: bool,
}

impl ExpenseSplit {
    pub fn new(expense: ExpenseId, user: UserId, amount_owed: Money) -> Self {
        Self {
            expense,
            user,
            amount_owed,
            is_settled: false,
        }
    }
}
