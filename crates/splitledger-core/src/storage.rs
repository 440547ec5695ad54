//! Storage abstraction for durable ledger records.

use thiserror::Error;

use splitledger_domain::{Expense, ExpenseId, ExpenseSplit, GroupId, Settlement, UserId};

/// Errors surfaced by storage and membership backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage backend failure: {0}")]
    Backend(String),
    #[error("unknown group: {0}")]
    UnknownGroup(GroupId),
    #[error("unknown user: {0}")]
    UnknownUser(UserId),
}

/// Abstraction over persistence backends for expenses, splits, and
/// settlements.
///
/// Writes are atomic per call: `insert_expense` persists the expense and all
/// of its splits or nothing at all, and `delete_expense` removes the expense
/// together with all of its splits or nothing at all. Group-scoped queries
/// fail with [`StorageError::UnknownGroup`] when the group cannot be
/// resolved; an empty history for a known group is an empty result, not an
/// error.
pub trait LedgerStore: Send + Sync {
    fn insert_expense(&self, expense: &Expense, splits: &[ExpenseSplit])
        -> Result<(), StorageError>;
    fn delete_expense(&self, expense: ExpenseId) -> Result<(), StorageError>;
    fn expense(&self, expense: ExpenseId) -> Result<Option<Expense>, StorageError>;
    fn splits_for_expense(&self, expense: ExpenseId) -> Result<Vec<ExpenseSplit>, StorageError>;
    fn insert_settlement(&self, settlement: &Settlement) -> Result<(), StorageError>;
    fn expenses_in_group(&self, group: GroupId) -> Result<Vec<Expense>, StorageError>;
    fn splits_in_group(&self, group: GroupId) -> Result<Vec<ExpenseSplit>, StorageError>;
    fn settlements_in_group(&self, group: GroupId) -> Result<Vec<Settlement>, StorageError>;
}
