//! In-memory ledger store for tests and embedded use.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use splitledger_domain::{Expense, ExpenseId, ExpenseSplit, GroupId, Settlement, UserId};

use crate::membership::MembershipProvider;
use crate::storage::{LedgerStore, StorageError};

#[derive(Debug, Clone)]
struct MemberRecord {
    user: UserId,
    active: bool,
}

#[derive(Debug, Default)]
struct MemoryState {
    groups: BTreeMap<GroupId, Vec<MemberRecord>>,
    expenses: Vec<Expense>,
    splits: Vec<ExpenseSplit>,
    settlements: Vec<Settlement>,
}

/// Process-local [`LedgerStore`] and [`MembershipProvider`].
///
/// Cheap to clone; clones share the same state. Active members are listed in
/// the order they joined.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a group so membership and ledger queries can resolve it.
    pub fn create_group(&self) -> Result<GroupId, StorageError> {
        let group = GroupId::new();
        self.write()?.groups.insert(group, Vec::new());
        Ok(group)
    }

    /// Adds a member to the group, reactivating them if they left earlier.
    pub fn add_member(&self, group: GroupId, user: UserId) -> Result<(), StorageError> {
        let mut state = self.write()?;
        let members = state
            .groups
            .get_mut(&group)
            .ok_or(StorageError::UnknownGroup(group))?;
        match members.iter_mut().find(|record| record.user == user) {
            Some(record) => record.active = true,
            None => members.push(MemberRecord { user, active: true }),
        }
        Ok(())
    }

    /// Marks a member inactive without erasing their ledger history.
    pub fn deactivate_member(&self, group: GroupId, user: UserId) -> Result<(), StorageError> {
        let mut state = self.write()?;
        let members = state
            .groups
            .get_mut(&group)
            .ok_or(StorageError::UnknownGroup(group))?;
        let record = members
            .iter_mut()
            .find(|record| record.user == user)
            .ok_or(StorageError::UnknownUser(user))?;
        record.active = false;
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, StorageError> {
        self.state
            .read()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, StorageError> {
        self.state
            .write()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".into()))
    }
}

impl MemoryState {
    fn require_group(&self, group: GroupId) -> Result<&[MemberRecord], StorageError> {
        self.groups
            .get(&group)
            .map(Vec::as_slice)
            .ok_or(StorageError::UnknownGroup(group))
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn insert_expense(
        &self,
        expense: &Expense,
        splits: &[ExpenseSplit],
    ) -> Result<(), StorageError> {
        let mut state = self.write()?;
        state.require_group(expense.group)?;
        state.expenses.push(expense.clone());
        state.splits.extend_from_slice(splits);
        Ok(())
    }

    fn delete_expense(&self, expense: ExpenseId) -> Result<(), StorageError> {
        let mut state = self.write()?;
        state.expenses.retain(|record| record.id != expense);
        state.splits.retain(|split| split.expense != expense);
        Ok(())
    }

    fn expense(&self, expense: ExpenseId) -> Result<Option<Expense>, StorageError> {
        Ok(self
            .read()?
            .expenses
            .iter()
            .find(|record| record.id == expense)
            .cloned())
    }

    fn splits_for_expense(&self, expense: ExpenseId) -> Result<Vec<ExpenseSplit>, StorageError> {
        Ok(self
            .read()?
            .splits
            .iter()
            .filter(|split| split.expense == expense)
            .cloned()
            .collect())
    }

    fn insert_settlement(&self, settlement: &Settlement) -> Result<(), StorageError> {
        let mut state = self.write()?;
        state.require_group(settlement.group)?;
        state.settlements.push(settlement.clone());
        Ok(())
    }

    fn expenses_in_group(&self, group: GroupId) -> Result<Vec<Expense>, StorageError> {
        let state = self.read()?;
        state.require_group(group)?;
        Ok(state
            .expenses
            .iter()
            .filter(|expense| expense.group == group)
            .cloned()
            .collect())
    }

    fn splits_in_group(&self, group: GroupId) -> Result<Vec<ExpenseSplit>, StorageError> {
        let state = self.read()?;
        state.require_group(group)?;
        Ok(state
            .splits
            .iter()
            .filter(|split| {
                state
                    .expenses
                    .iter()
                    .any(|expense| expense.id == split.expense && expense.group == group)
            })
            .cloned()
            .collect())
    }

    fn settlements_in_group(&self, group: GroupId) -> Result<Vec<Settlement>, StorageError> {
        let state = self.read()?;
        state.require_group(group)?;
        Ok(state
            .settlements
            .iter()
            .filter(|settlement| settlement.group == group)
            .cloned()
            .collect())
    }
}

impl MembershipProvider for MemoryLedgerStore {
    fn is_active_member(&self, group: GroupId, user: UserId) -> Result<bool, StorageError> {
        let state = self.read()?;
        let members = state.require_group(group)?;
        Ok(members
            .iter()
            .any(|record| record.user == user && record.active))
    }

    fn active_members(&self, group: GroupId) -> Result<Vec<UserId>, StorageError> {
        let state = self.read()?;
        let members = state.require_group(group)?;
        Ok(members
            .iter()
            .filter(|record| record.active)
            .map(|record| record.user)
            .collect())
    }

    fn groups_for(&self, user: UserId) -> Result<Vec<GroupId>, StorageError> {
        let state = self.read()?;
        Ok(state
            .groups
            .iter()
            .filter(|(_, members)| {
                members
                    .iter()
                    .any(|record| record.user == user && record.active)
            })
            .map(|(&group, _)| group)
            .collect())
    }
}
