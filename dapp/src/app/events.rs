//! # Session Events
//!
//! Change notifications the wallet session broadcasts to its dependents (the contract read
//! cache). One event per field that actually changed.

use crate::app::state::WalletSession;

/// Which session field changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionField {
    Address,
    ChainId,
    BlockHeight,
}

/// Broadcast after a session field changed, carrying the session as of that change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChanged {
    pub field: SessionField,
    pub session: WalletSession,
}
