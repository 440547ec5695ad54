//! Balance aggregation over fetched ledger records.
//!
//! These functions are pure: callers fetch a group's records once and
//! aggregate in memory, so every query sees one consistent snapshot.

use std::collections::HashMap;

use splitledger_domain::{Expense, ExpenseId, ExpenseSplit, Money, Settlement, UserId};

/// Net position of one user across a group's history: expenses they paid,
/// minus splits they owe, plus settlements they sent, minus settlements they
/// received. Positive means the group owes the user.
pub fn group_balance_of(
    user: UserId,
    expenses: &[Expense],
    splits: &[ExpenseSplit],
    settlements: &[Settlement],
) -> Money {
    let paid: Money = expenses
        .iter()
        .filter(|expense| expense.paid_by == user)
        .map(|expense| expense.amount)
        .sum();
    let owed: Money = splits
        .iter()
        .filter(|split| split.user == user)
        .map(|split| split.amount_owed)
        .sum();
    let sent: Money = settlements
        .iter()
        .filter(|settlement| settlement.from_user == user)
        .map(|settlement| settlement.amount)
        .sum();
    let received: Money = settlements
        .iter()
        .filter(|settlement| settlement.to_user == user)
        .map(|settlement| settlement.amount)
        .sum();
    paid - owed + sent - received
}

/// Net position between two users, from `user_a`'s perspective: what
/// `user_b` owes on expenses `user_a` paid, minus the reverse, adjusted by
/// settlements flowing between the two. Antisymmetric in its user arguments.
pub fn pairwise_balance_of(
    user_a: UserId,
    user_b: UserId,
    expenses: &[Expense],
    splits: &[ExpenseSplit],
    settlements: &[Settlement],
) -> Money {
    if user_a == user_b {
        return Money::ZERO;
    }

    let paid_by: HashMap<ExpenseId, UserId> = expenses
        .iter()
        .map(|expense| (expense.id, expense.paid_by))
        .collect();

    let mut net = Money::ZERO;
    for split in splits {
        match paid_by.get(&split.expense) {
            Some(&payer) if payer == user_a && split.user == user_b => net += split.amount_owed,
            Some(&payer) if payer == user_b && split.user == user_a => net -= split.amount_owed,
            _ => {}
        }
    }
    for settlement in settlements {
        if settlement.from_user == user_a && settlement.to_user == user_b {
            net += settlement.amount;
        } else if settlement.from_user == user_b && settlement.to_user == user_a {
            net -= settlement.amount;
        }
    }
    net
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use splitledger_domain::{Expense, GroupId};

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 14).expect("date")
    }

    fn expense_with_equal_splits(
        group: GroupId,
        payer: UserId,
        total: Money,
        owers: &[(UserId, i64)],
    ) -> (Expense, Vec<ExpenseSplit>) {
        let expense = Expense::new(group, payer, "fixture", total, date());
        let splits = owers
            .iter()
            .map(|&(user, minor)| ExpenseSplit::new(expense.id, user, Money::from_minor(minor)))
            .collect();
        (expense, splits)
    }

    #[test]
    fn empty_history_yields_zero() {
        let user = UserId::new();
        assert_eq!(group_balance_of(user, &[], &[], &[]), Money::ZERO);
        assert_eq!(
            pairwise_balance_of(user, UserId::new(), &[], &[], &[]),
            Money::ZERO
        );
    }

    #[test]
    fn payer_is_credited_and_owers_are_debited() {
        let group = GroupId::new();
        let (a, b) = (UserId::new(), UserId::new());
        let (expense, splits) =
            expense_with_equal_splits(group, a, Money::from_major(100), &[(a, 5_000), (b, 5_000)]);
        let expenses = vec![expense];

        assert_eq!(
            group_balance_of(a, &expenses, &splits, &[]),
            Money::from_major(50)
        );
        assert_eq!(
            group_balance_of(b, &expenses, &splits, &[]),
            Money::from_major(-50)
        );
    }

    #[test]
    fn settlement_discharges_the_senders_debt() {
        let group = GroupId::new();
        let (a, b) = (UserId::new(), UserId::new());
        let (expense, splits) =
            expense_with_equal_splits(group, a, Money::from_major(100), &[(a, 5_000), (b, 5_000)]);
        let expenses = vec![expense];
        let settlements = vec![Settlement::new(group, b, a, Money::from_major(50))];

        assert_eq!(
            group_balance_of(a, &expenses, &splits, &settlements),
            Money::ZERO
        );
        assert_eq!(
            group_balance_of(b, &expenses, &splits, &settlements),
            Money::ZERO
        );
    }

    #[test]
    fn pairwise_ignores_third_parties_and_own_share() {
        let group = GroupId::new();
        let (a, b, c) = (UserId::new(), UserId::new(), UserId::new());
        let (expense, splits) = expense_with_equal_splits(
            group,
            a,
            Money::from_minor(9_000),
            &[(a, 3_000), (b, 3_000), (c, 3_000)],
        );
        let expenses = vec![expense];

        assert_eq!(
            pairwise_balance_of(a, b, &expenses, &splits, &[]),
            Money::from_minor(3_000)
        );
        assert_eq!(
            pairwise_balance_of(b, c, &expenses, &splits, &[]),
            Money::ZERO
        );
    }

    #[test]
    fn pairwise_is_antisymmetric_with_settlements() {
        let group = GroupId::new();
        let (a, b) = (UserId::new(), UserId::new());
        let (expense, splits) =
            expense_with_equal_splits(group, a, Money::from_major(80), &[(a, 4_000), (b, 4_000)]);
        let expenses = vec![expense];
        let settlements = vec![Settlement::new(group, b, a, Money::from_minor(1_500))];

        let forward = pairwise_balance_of(a, b, &expenses, &splits, &settlements);
        let backward = pairwise_balance_of(b, a, &expenses, &splits, &settlements);
        assert_eq!(forward, Money::from_minor(2_500));
        assert_eq!(backward, -forward);
    }

    #[test]
    fn pairwise_of_a_user_with_themselves_is_zero() {
        let group = GroupId::new();
        let a = UserId::new();
        let (expense, splits) =
            expense_with_equal_splits(group, a, Money::from_major(10), &[(a, 1_000)]);

        assert_eq!(
            pairwise_balance_of(a, a, &[expense], &splits, &[]),
            Money::ZERO
        );
    }
}
