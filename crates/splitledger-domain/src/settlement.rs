//! Domain model for settlement payments between group members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{GroupId, SettlementId, UserId};
use crate::money::Money;

/// A directed payment that happened outside the app and discharges part of
/// the sender's debt to the recipient. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settlement {
    pub id: SettlementId,
    pub group: GroupId,
    pub from_user: UserId,
    pub to_user: UserId,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
}

impl Settlement {
    pub fn new(group: GroupId, from_user: UserId, to_user: UserId, amount: Money) -> Self {
        Self {
            id: SettlementId::new(),
            group,
            from_user,
            to_user,
            amount,
            created_at: Utc::now(),
        }
    }
}
