//! splitledger-core
//!
//! Business logic for the shared-expense ledger: split computation, the
//! expense ledger facade, balance aggregation, and the storage/membership
//! collaborator traits. Depends on splitledger-domain. No I/O beyond the
//! injected collaborators.

pub mod balance;
pub mod config;
pub mod error;
pub mod ledger;
pub mod membership;
pub mod memory;
pub mod split;
pub mod storage;

pub use balance::*;
pub use config::*;
pub use error::*;
pub use ledger::*;
pub use membership::*;
pub use memory::*;
pub use split::*;
pub use storage::*;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log. Safe to call
/// more than once.
pub fn init() {
    INIT_TRACING.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("splitledger_core=info".parse().unwrap());

        fmt().with_env_filter(filter).init();
        tracing::info!("splitledger tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
