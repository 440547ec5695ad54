//! Typed errors for split computation, ledger mutations, and balance queries.

use thiserror::Error;

use splitledger_domain::{ExpenseId, GroupId, Money, Percent, UserId};

use crate::storage::StorageError;

/// Errors from pure split computation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SplitError {
    #[error("no participants to split between")]
    NoParticipants,
    #[error("expense total must be positive, got {0}")]
    NonPositiveTotal(Money),
    #[error("split amounts sum to {actual}, expense total is {expected}")]
    SumMismatch { expected: Money, actual: Money },
    #[error("percentages sum to {0}, outside the accepted band")]
    PercentageOutOfRange(Percent),
    #[error("participant {0} is not part of this expense")]
    UnknownParticipant(UserId),
    #[error("share for participant {0} would be negative")]
    NegativeShare(UserId),
}

/// Errors from ledger mutations.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("group has no active members eligible for this split")]
    NoEligibleParticipants,
    #[error("sender and recipient of a settlement must differ")]
    SelfSettlement,
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Money),
    #[error("user {user} is not an active member of group {group}")]
    NotAMember { group: GroupId, user: UserId },
    #[error("expense title must be non-empty and at most 200 characters")]
    InvalidTitle,
    #[error("expense not found: {0}")]
    ExpenseNotFound(ExpenseId),
    #[error("user {user} did not pay expense {expense}")]
    NotExpenseOwner { expense: ExpenseId, user: UserId },
    #[error(transparent)]
    Split(#[from] SplitError),
    #[error("storage failure: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from balance queries.
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("unknown group or user: {0}")]
    UnknownEntity(String),
    #[error("storage failure: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for BalanceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnknownGroup(group) => BalanceError::UnknownEntity(format!("group {group}")),
            StorageError::UnknownUser(user) => BalanceError::UnknownEntity(format!("user {user}")),
            other => BalanceError::Storage(other),
        }
    }
}
