//! Splitting policies applied when recording a shared expense.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::common::UserId;
use crate::money::{Money, Percent};

/// Strategy for distributing an expense total among its participants.
///
/// The set of strategies is closed: callers match exhaustively and the
/// calculator is total over every variant. `Custom` and `Percentage` carry
/// their per-participant inputs; participants absent from the map receive no
/// split.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SplitPolicy {
    Equal,
    Custom(HashMap<UserId, Money>),
    Percentage(HashMap<UserId, Percent>),
}

impl SplitPolicy {
    /// Returns the stable name of the policy kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SplitPolicy::Equal => "equal",
            SplitPolicy::Custom(_) => "custom",
            SplitPolicy::Percentage(_) => "percentage",
        }
    }
}
