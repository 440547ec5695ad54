//! Expense ledger facade: mutations, feed queries, and balance queries.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use splitledger_domain::{
    Expense, ExpenseCategory, ExpenseId, ExpenseSplit, GroupId, LedgerEntry, LedgerFilter, Money,
    Settlement, SplitPolicy, UserId, MAX_TITLE_LEN,
};

use crate::balance;
use crate::config::LedgerConfig;
use crate::error::{BalanceError, LedgerError};
use crate::membership::MembershipProvider;
use crate::split::SplitCalculator;
use crate::storage::LedgerStore;

/// Input for recording a new expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub group: GroupId,
    pub paid_by: UserId,
    pub title: String,
    pub amount: Money,
    pub date: NaiveDate,
    pub category: Option<ExpenseCategory>,
    pub description: Option<String>,
    pub receipt: Option<String>,
    pub policy: SplitPolicy,
    /// Participant selection; empty means every active member.
    pub participants: Vec<UserId>,
}

impl NewExpense {
    pub fn new(
        group: GroupId,
        paid_by: UserId,
        title: impl Into<String>,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            group,
            paid_by,
            title: title.into(),
            amount,
            date,
            category: None,
            description: None,
            receipt: None,
            policy: SplitPolicy::Equal,
            participants: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: ExpenseCategory) -> Self {
        self.category = Some(category);
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

    pub fn with_policy(mut self, policy: SplitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_participants(mut self, participants: impl IntoIterator<Item = UserId>) -> Self {
        self.participants = participants.into_iter().collect();
        self
    }
}

/// Input for recording a settlement payment.
#[derive(Debug, Clone, Copy)]
pub struct NewSettlement {
    pub group: GroupId,
    pub from_user: UserId,
    pub to_user: UserId,
    pub amount: Money,
}

impl NewSettlement {
    pub fn new(group: GroupId, from_user: UserId, to_user: UserId, amount: Money) -> Self {
        Self {
            group,
            from_user,
            to_user,
            amount,
        }
    }
}

/// Storage-backed expense ledger for one deployment.
///
/// Owns its collaborators. Mutations go through the store atomically;
/// balance and feed queries re-aggregate stored records on every call, so
/// results are never stale.
pub struct ExpenseLedger<S, M> {
    store: S,
    membership: M,
    config: LedgerConfig,
}

impl<S: LedgerStore, M: MembershipProvider> ExpenseLedger<S, M> {
    pub fn new(store: S, membership: M) -> Self {
        Self::with_config(store, membership, LedgerConfig::default())
    }

    pub fn with_config(store: S, membership: M, config: LedgerConfig) -> Self {
        Self {
            store,
            membership,
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Records an expense and its splits as one atomic write.
    ///
    /// The effective participants are the draft's selection intersected with
    /// the group's active members, in selection order; an empty selection
    /// means every active member. Any split-computation failure aborts the
    /// operation before anything is written.
    pub fn create_expense(&self, draft: NewExpense) -> Result<Expense, LedgerError> {
        let title = draft.title.trim();
        if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
            return Err(LedgerError::InvalidTitle);
        }

        let participants = self.resolve_participants(draft.group, &draft.participants)?;
        if participants.is_empty() {
            return Err(LedgerError::NoEligibleParticipants);
        }
        if !self.membership.is_active_member(draft.group, draft.paid_by)? {
            return Err(LedgerError::NotAMember {
                group: draft.group,
                user: draft.paid_by,
            });
        }
        let shares =
            SplitCalculator::compute(draft.amount, &participants, &draft.policy, &self.config)?;

        let mut expense = Expense::new(draft.group, draft.paid_by, title, draft.amount, draft.date)
            .with_category(draft.category.unwrap_or(self.config.default_category));
        if let Some(description) = draft.description {
            expense = expense.with_description(description);
        }
        if let Some(receipt) = draft.receipt {
            expense = expense.with_receipt(receipt);
        }
        let splits: Vec<ExpenseSplit> = shares
            .iter()
            .map(|share| ExpenseSplit::new(expense.id, share.user, share.amount))
            .collect();

        self.store.insert_expense(&expense, &splits)?;
        debug!(
            expense = %expense.id,
            group = %expense.group,
            amount = %expense.amount,
            policy = draft.policy.kind(),
            splits = splits.len(),
            "expense recorded"
        );
        Ok(expense)
    }

    /// Removes an expense and all of its splits. Only the payer may delete.
    pub fn delete_expense(&self, actor: UserId, expense: ExpenseId) -> Result<(), LedgerError> {
        let record = self
            .store
            .expense(expense)?
            .ok_or(LedgerError::ExpenseNotFound(expense))?;
        if record.paid_by != actor {
            return Err(LedgerError::NotExpenseOwner {
                expense,
                user: actor,
            });
        }
        self.store.delete_expense(expense)?;
        debug!(expense = %expense, group = %record.group, "expense deleted");
        Ok(())
    }

    /// Records a settlement payment between two active members.
    pub fn create_settlement(&self, draft: NewSettlement) -> Result<Settlement, LedgerError> {
        if draft.from_user == draft.to_user {
            return Err(LedgerError::SelfSettlement);
        }
        if !draft.amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(draft.amount));
        }
        for user in [draft.from_user, draft.to_user] {
            if !self.membership.is_active_member(draft.group, user)? {
                return Err(LedgerError::NotAMember {
                    group: draft.group,
                    user,
                });
            }
        }

        let settlement = Settlement::new(draft.group, draft.from_user, draft.to_user, draft.amount);
        self.store.insert_settlement(&settlement)?;
        debug!(
            settlement = %settlement.id,
            group = %settlement.group,
            amount = %settlement.amount,
            "settlement recorded"
        );
        Ok(settlement)
    }

    /// Looks up one expense, payer included, so callers can gate deletion.
    pub fn expense(&self, expense: ExpenseId) -> Result<Option<Expense>, LedgerError> {
        Ok(self.store.expense(expense)?)
    }

    /// Lists the splits recorded for one expense.
    pub fn expense_splits(&self, expense: ExpenseId) -> Result<Vec<ExpenseSplit>, LedgerError> {
        Ok(self.store.splits_for_expense(expense)?)
    }

    /// Net balance of `user` within `group`; positive means the group owes
    /// the user. Settlements are netted in.
    pub fn group_balance(&self, group: GroupId, user: UserId) -> Result<Money, BalanceError> {
        let expenses = self.store.expenses_in_group(group)?;
        let splits = self.store.splits_in_group(group)?;
        let settlements = self.store.settlements_in_group(group)?;
        Ok(balance::group_balance_of(
            user,
            &expenses,
            &splits,
            &settlements,
        ))
    }

    /// Net balance between two users in a group, from `user_a`'s
    /// perspective.
    pub fn pairwise_balance(
        &self,
        group: GroupId,
        user_a: UserId,
        user_b: UserId,
    ) -> Result<Money, BalanceError> {
        let expenses = self.store.expenses_in_group(group)?;
        let splits = self.store.splits_in_group(group)?;
        let settlements = self.store.settlements_in_group(group)?;
        Ok(balance::pairwise_balance_of(
            user_a,
            user_b,
            &expenses,
            &splits,
            &settlements,
        ))
    }

    /// Sum of the user's group balances across their active memberships.
    pub fn aggregate_balance(&self, user: UserId) -> Result<Money, BalanceError> {
        let mut total = Money::ZERO;
        for group in self.membership.groups_for(user)? {
            total += self.group_balance(group, user)?;
        }
        Ok(total)
    }

    /// The group's merged expense and settlement feed, newest first.
    pub fn group_ledger(
        &self,
        group: GroupId,
        filter: &LedgerFilter,
    ) -> Result<Vec<LedgerEntry>, BalanceError> {
        let expenses = self.store.expenses_in_group(group)?;
        let involved_expenses: HashSet<ExpenseId> = match filter.involving {
            Some(user) => self
                .store
                .splits_in_group(group)?
                .into_iter()
                .filter(|split| split.user == user)
                .map(|split| split.expense)
                .collect(),
            None => HashSet::new(),
        };

        let mut entries: Vec<LedgerEntry> = expenses
            .into_iter()
            .filter(|expense| expense_matches(expense, filter, &involved_expenses))
            .map(LedgerEntry::Expense)
            .collect();

        if filter.include_settlements && filter.categories.is_empty() {
            entries.extend(
                self.store
                    .settlements_in_group(group)?
                    .into_iter()
                    .filter(|settlement| settlement_matches(settlement, filter))
                    .map(LedgerEntry::Settlement),
            );
        }

        entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(entries)
    }

    /// Total of all expense amounts recorded in the group.
    pub fn total_group_spend(&self, group: GroupId) -> Result<Money, BalanceError> {
        let expenses = self.store.expenses_in_group(group)?;
        Ok(expenses.iter().map(|expense| expense.amount).sum())
    }

    fn resolve_participants(
        &self,
        group: GroupId,
        selection: &[UserId],
    ) -> Result<Vec<UserId>, LedgerError> {
        let active = self.membership.active_members(group)?;
        if selection.is_empty() {
            return Ok(active);
        }
        let active: HashSet<UserId> = active.into_iter().collect();
        let mut seen = HashSet::new();
        Ok(selection
            .iter()
            .copied()
            .filter(|user| active.contains(user) && seen.insert(*user))
            .collect())
    }
}

fn expense_matches(
    expense: &Expense,
    filter: &LedgerFilter,
    involved_expenses: &HashSet<ExpenseId>,
) -> bool {
    if let Some(range) = &filter.date_range {
        if !range.contains(expense.date) {
            return false;
        }
    }
    if !filter.payers.is_empty() && !filter.payers.contains(&expense.paid_by) {
        return false;
    }
    if !filter.categories.is_empty() && !filter.categories.contains(&expense.category) {
        return false;
    }
    if let Some(user) = filter.involving {
        if expense.paid_by != user && !involved_expenses.contains(&expense.id) {
            return false;
        }
    }
    true
}

fn settlement_matches(settlement: &Settlement, filter: &LedgerFilter) -> bool {
    if let Some(range) = &filter.date_range {
        if !range.contains(settlement.created_at.date_naive()) {
            return false;
        }
    }
    if !filter.payers.is_empty() && !filter.payers.contains(&settlement.from_user) {
        return false;
    }
    if let Some(user) = filter.involving {
        if settlement.from_user != user && settlement.to_user != user {
            return false;
        }
    }
    true
}
