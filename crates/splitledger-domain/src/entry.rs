//! Read model for a group's merged expense and settlement feed.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{GroupId, UserId};
use crate::expense::{Expense, ExpenseCategory};
use crate::settlement::Settlement;

/// An inclusive calendar-date range used by feed filters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if end < start {
            return Err(DateRangeError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Returns `true` when `date` falls within the range, bounds included.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Errors that can occur when constructing [`DateRange`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangeError {
    InvalidRange,
}

impl fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRangeError::InvalidRange => f.write_str("date range end must not precede start"),
        }
    }
}

impl std::error::Error for DateRangeError {}

/// One item in a group's ledger feed, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntry {
    Expense(Expense),
    Settlement(Settlement),
}

impl LedgerEntry {
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEntry::Expense(expense) => expense.created_at,
            LedgerEntry::Settlement(settlement) => settlement.created_at,
        }
    }

    pub fn group(&self) -> GroupId {
        match self {
            LedgerEntry::Expense(expense) => expense.group,
            LedgerEntry::Settlement(settlement) => settlement.group,
        }
    }

    /// The calendar date the entry is filtered on: the user-entered date for
    /// expenses, the recording date for settlements.
    pub fn effective_date(&self) -> NaiveDate {
        match self {
            LedgerEntry::Expense(expense) => expense.date,
            LedgerEntry::Settlement(settlement) => settlement.created_at.date_naive(),
        }
    }
}

/// Filters applied when listing a group's ledger feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payers: Vec<UserId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<ExpenseCategory>,
    #[serde(default = "include_settlements_default")]
    pub include_settlements: bool,
    /// Restricts the feed to entries the user paid, owes on, sent, or
    /// received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub involving: Option<UserId>,
}

impl Default for LedgerFilter {
    fn default() -> Self {
        Self {
            date_range: None,
            payers: Vec::new(),
            categories: Vec::new(),
            include_settlements: true,
            involving: None,
        }
    }
}

impl LedgerFilter {
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_payers(mut self, payers: impl IntoIterator<Item = UserId>) -> Self {
        self.payers = payers.into_iter().collect();
        self
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = ExpenseCategory>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn involving(mut self, user: UserId) -> Self {
        self.involving = Some(user);
        self
    }

    /// Drops settlements from the feed, leaving expenses only.
    pub fn expenses_only(mut self) -> Self {
        self.include_settlements = false;
        self
    }
}

fn include_settlements_default() -> bool {
    true
}
