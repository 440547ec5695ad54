//! Membership lookup consumed by ledger mutations and balance queries.

use splitledger_domain::{GroupId, UserId};

use crate::storage::StorageError;

/// Resolves which users are active members of a group.
///
/// Membership lifecycle (invites, roles, departures) lives outside this
/// core; the ledger only ever asks who is active right now.
pub trait MembershipProvider: Send + Sync {
    /// Returns `true` when the user currently holds active membership.
    fn is_active_member(&self, group: GroupId, user: UserId) -> Result<bool, StorageError>;

    /// Lists a group's active members in a stable order.
    fn active_members(&self, group: GroupId) -> Result<Vec<UserId>, StorageError>;

    /// Lists the groups where the user currently holds active membership.
    fn groups_for(&self, user: UserId) -> Result<Vec<GroupId>, StorageError>;
}
