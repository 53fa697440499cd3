//! # Transaction Gate
//!
//! Sequences the two-phase ERC-20 purchase: approve an allowance on the input token, then
//! spend it through the sale contract. Both writes share one single-flight lock, modeled as
//! [`GateState`]: `Idle → Approving | Buying → Idle`.
//!
//! A request that cannot run is dropped, never queued, and reported as
//! [`GateOutcome::Dropped`] with the reason. Once a submission has been admitted the lock is
//! released and the cache refreshed whatever the outcome; a settled transaction is reported
//! as `Confirmed`, a failed one as the error.

use alloy_primitives::{Address, B256};
use tracing::{info, instrument, warn};

use crate::app::cache::ContractCache;
use crate::app::state::{AppState, GateState, StateHandle};
use crate::core::error::Result;
use crate::services::amount::Amount;

/// True when `amount` exceeds the known allowance, or the allowance is unknown.
pub fn needs_approval(approved: Option<Amount>, amount: Amount) -> bool {
    approved.map_or(true, |approved| approved < amount)
}

/// Why a request was dropped without submitting anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Another approve or buy is in flight.
    Busy,
    NotConnected,
    /// The input-token address has not been read yet.
    TokenUnknown,
    WrongChain { expected: u64, actual: u64 },
    InsufficientAllowance { approved: Amount, requested: Amount },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Submitted and mined successfully.
    Confirmed(B256),
    Dropped(DropReason),
}

/// Holds the lock for one admitted submission; releases it on drop.
struct GateGuard {
    state: StateHandle,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.state.update(|s| s.draft.gate = GateState::Idle);
    }
}

#[derive(Clone)]
pub struct TransactionGate {
    cache: ContractCache,
    state: StateHandle,
}

/// What an admitted request needs to submit.
struct Admission {
    owner: Address,
    token: Option<Address>,
}

impl TransactionGate {
    pub fn new(cache: ContractCache, state: StateHandle) -> Self {
        Self { cache, state }
    }

    pub fn needs_approval(&self, amount: Amount) -> bool {
        self.state
            .read(|s| needs_approval(s.contracts.approved_amount, amount))
    }

    /// Approve the sale contract to spend `amount` of the input token.
    ///
    /// Always finishes with `refresh_token_scoped`.
    #[instrument(skip_all, fields(amount = %amount))]
    pub async fn approve(&self, amount: Amount) -> Result<GateOutcome> {
        let (admission, guard) = match self.admit(GateState::Approving, amount) {
            Ok(admitted) => admitted,
            Err(reason) => return Ok(dropped(reason)),
        };
        let Some(token) = admission.token else {
            drop(guard);
            return Ok(dropped(DropReason::TokenUnknown));
        };

        info!(token = %token, "Submitting approval");
        let result = self
            .cache
            .token(token)
            .approve(admission.owner, self.cache.sale().address(), amount)
            .await
            .map_err(|e| e.into_write_failure("approve"));

        drop(guard);
        self.cache.refresh_token_scoped(None).await;
        settle("approve", result)
    }

    /// Buy with `amount` input tokens.
    ///
    /// Dropped when the known allowance is below `amount`; an unknown allowance does not
    /// block. Always finishes with a full `refresh`.
    #[instrument(skip_all, fields(amount = %amount))]
    pub async fn buy(&self, amount: Amount) -> Result<GateOutcome> {
        let (admission, guard) = match self.admit(GateState::Buying, amount) {
            Ok(admitted) => admitted,
            Err(reason) => return Ok(dropped(reason)),
        };

        info!("Submitting purchase");
        let result = self
            .cache
            .sale()
            .get_token(admission.owner, amount)
            .await
            .map_err(|e| e.into_write_failure("buy"));

        drop(guard);
        self.cache.refresh().await;
        settle("buy", result)
    }

    /// Check preconditions and take the lock in one step.
    fn admit(
        &self,
        op: GateState,
        amount: Amount,
    ) -> std::result::Result<(Admission, GateGuard), DropReason> {
        let chain_id = self.state.chain().chain_id;
        let mut admission = Err(DropReason::Busy);
        self.state.update_if(|s| {
            admission = check(s, op, amount, chain_id);
            if admission.is_ok() {
                s.draft.gate = op;
            }
            admission.is_ok()
        });
        admission.map(|a| {
            let guard = GateGuard {
                state: self.state.clone(),
            };
            (a, guard)
        })
    }
}

fn check(
    s: &AppState,
    op: GateState,
    amount: Amount,
    expected_chain: u64,
) -> std::result::Result<Admission, DropReason> {
    if s.draft.gate.is_busy() {
        return Err(DropReason::Busy);
    }
    let owner = s.session.address.ok_or(DropReason::NotConnected)?;
    if let Some(actual) = s.session.chain_id {
        if actual != expected_chain {
            return Err(DropReason::WrongChain {
                expected: expected_chain,
                actual,
            });
        }
    }
    if op == GateState::Buying {
        if let Some(approved) = s.contracts.approved_amount {
            if approved < amount {
                return Err(DropReason::InsufficientAllowance {
                    approved,
                    requested: amount,
                });
            }
        }
    }
    Ok(Admission {
        owner,
        token: s.contracts.input_token_address,
    })
}

fn dropped(reason: DropReason) -> GateOutcome {
    warn!(reason = ?reason, "Request dropped");
    GateOutcome::Dropped(reason)
}

fn settle(op: &str, result: Result<B256>) -> Result<GateOutcome> {
    match result {
        Ok(hash) => {
            info!(op, tx_hash = %hash, "Transaction confirmed");
            Ok(GateOutcome::Confirmed(hash))
        }
        Err(e) => {
            warn!(op, error = %e, "Transaction failed");
            Err(e)
        }
    }
}
