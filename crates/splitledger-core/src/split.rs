//! Split computation: turns an expense total and a policy into exact shares.

use std::collections::{HashMap, HashSet};

use splitledger_domain::{Money, Percent, SplitPolicy, UserId};

use crate::config::LedgerConfig;
use crate::error::SplitError;

/// One participant's computed share of an expense total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitShare {
    pub user: UserId,
    pub amount: Money,
}

/// Computes per-participant shares for an expense total.
///
/// Pure over its inputs; never reads or writes the ledger. `participants` is
/// the resolved, duplicate-free selection in its original order, and share
/// remainders are handed out in that order, so for a given input the result
/// is fully deterministic and `sum(shares) == total` holds exactly.
pub struct SplitCalculator;

impl SplitCalculator {
    pub fn compute(
        total: Money,
        participants: &[UserId],
        policy: &SplitPolicy,
        config: &LedgerConfig,
    ) -> Result<Vec<SplitShare>, SplitError> {
        if participants.is_empty() {
            return Err(SplitError::NoParticipants);
        }
        if !total.is_positive() {
            return Err(SplitError::NonPositiveTotal(total));
        }
        match policy {
            SplitPolicy::Equal => Ok(equal_shares(total, participants)),
            SplitPolicy::Custom(amounts) => custom_shares(total, participants, amounts, config),
            SplitPolicy::Percentage(percentages) => {
                percentage_shares(total, participants, percentages, config)
            }
        }
    }
}

/// Splits `total` evenly: every participant gets the floored base share and
/// the first `total mod n` participants one extra minor unit.
fn equal_shares(total: Money, participants: &[UserId]) -> Vec<SplitShare> {
    let count = participants.len() as i64;
    let base = total.minor_units().div_euclid(count);
    let leftover = total.minor_units().rem_euclid(count);
    participants
        .iter()
        .enumerate()
        .map(|(index, &user)| SplitShare {
            user,
            amount: Money::from_minor(base + i64::from((index as i64) < leftover)),
        })
        .collect()
}

fn custom_shares(
    total: Money,
    participants: &[UserId],
    amounts: &HashMap<UserId, Money>,
    config: &LedgerConfig,
) -> Result<Vec<SplitShare>, SplitError> {
    if amounts.is_empty() {
        return Err(SplitError::NoParticipants);
    }
    let eligible: HashSet<UserId> = participants.iter().copied().collect();
    for (&user, &amount) in amounts {
        if !eligible.contains(&user) {
            return Err(SplitError::UnknownParticipant(user));
        }
        if amount.is_negative() {
            return Err(SplitError::NegativeShare(user));
        }
    }

    let shares: Vec<SplitShare> = participants
        .iter()
        .filter_map(|&user| amounts.get(&user).map(|&amount| SplitShare { user, amount }))
        .collect();

    let supplied: Money = shares.iter().map(|share| share.amount).sum();
    if supplied != total && !config.allow_custom_sum_mismatch {
        return Err(SplitError::SumMismatch {
            expected: total,
            actual: supplied,
        });
    }
    Ok(shares)
}

/// Converts each percentage to a floored amount, then spreads the leftover
/// minor units with the equal-split rule so the shares sum exactly to
/// `total` even when the percentages drift within the tolerance band.
fn percentage_shares(
    total: Money,
    participants: &[UserId],
    percentages: &HashMap<UserId, Percent>,
    config: &LedgerConfig,
) -> Result<Vec<SplitShare>, SplitError> {
    if percentages.is_empty() {
        return Err(SplitError::NoParticipants);
    }
    let eligible: HashSet<UserId> = participants.iter().copied().collect();
    for (&user, &percent) in percentages {
        if !eligible.contains(&user) {
            return Err(SplitError::UnknownParticipant(user));
        }
        if percent.is_negative() {
            return Err(SplitError::NegativeShare(user));
        }
    }

    let total_percent: Percent = percentages.values().copied().sum();
    if !config.percentage_tolerance.contains(total_percent) {
        return Err(SplitError::PercentageOutOfRange(total_percent));
    }

    let mut shares: Vec<SplitShare> = participants
        .iter()
        .filter_map(|&user| {
            percentages.get(&user).map(|percent| SplitShare {
                user,
                amount: percent.of(total),
            })
        })
        .collect();

    let allocated: Money = shares.iter().map(|share| share.amount).sum();
    let leftover = (total - allocated).minor_units();
    let count = shares.len() as i64;
    let base = leftover.div_euclid(count);
    let extra = leftover.rem_euclid(count);
    for (index, share) in shares.iter_mut().enumerate() {
        share.amount += Money::from_minor(base + i64::from((index as i64) < extra));
        if share.amount.is_negative() {
            return Err(SplitError::NegativeShare(share.user));
        }
    }
    Ok(shares)
}
