//! splitledger-domain
//!
//! Pure domain models for the shared-expense ledger (Money, Expense, Split,
//! Settlement, splitting policies, feed read model). No I/O, no services.

pub mod common;
pub mod entry;
pub mod expense;
pub mod money;
pub mod policy;
pub mod settlement;

pub use common::*;
pub use entry::*;
pub use expense::*;
pub use money::*;
pub use policy::*;
pub use settlement::*;
