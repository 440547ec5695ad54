//! Runtime configuration for ledger behavior.

use serde::{Deserialize, Serialize};

use splitledger_domain::{ExpenseCategory, Percent};

/// Inclusive band a percentage split's total must fall within.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PercentBand {
    pub min: Percent,
    pub max: Percent,
}

impl PercentBand {
    pub fn contains(&self, value: Percent) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for PercentBand {
    fn default() -> Self {
        Self {
            min: Percent::from_basis_points(9_950),
            max: Percent::from_basis_points(10_050),
        }
    }
}

/// Behavior knobs for the expense ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LedgerConfig {
    /// Accepts custom splits whose amounts do not sum to the expense total.
    /// Compatibility switch for ledgers imported from systems that never
    /// validated the sum; leave off for new data.
    #[serde(default)]
    pub allow_custom_sum_mismatch: bool,
    /// Tolerance applied to a percentage split's total.
    #[serde(default)]
    pub percentage_tolerance: PercentBand,
    /// Category assigned when an expense draft does not name one.
    #[serde(default)]
    pub default_category: ExpenseCategory,
}
