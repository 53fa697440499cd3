//! # Contract Read Cache
//!
//! Keeps [`ContractSnapshot`] eventually consistent with the chain. Reads are field-granular:
//! each one writes its own field the moment it resolves, a failed read keeps the previous
//! value and logs, and the last write for a field wins.
//!
//! ## Triggers
//!
//! | Session change | Action                                            |
//! |----------------|---------------------------------------------------|
//! | address        | clear token-scoped fields, `refresh_token_scoped` and `refresh` |
//! | chain id       | `refresh`                                         |
//! | block height   | `refresh`                                         |
//!
//! The transaction gate calls back into the cache when its submissions settle.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::app::events::{SessionChanged, SessionField};
use crate::app::state::{ContractSnapshot, StateHandle};
use crate::core::error::{AppError, Result};
use crate::core::service::WalletProvider;
use crate::services::amount::Amount;
use crate::services::contracts::{SaleContract, TokenContract};

#[derive(Clone)]
pub struct ContractCache {
    sale: SaleContract,
    provider: Arc<dyn WalletProvider>,
    receipt_poll: Duration,
    state: StateHandle,
}

impl ContractCache {
    pub fn new(
        sale: SaleContract,
        provider: Arc<dyn WalletProvider>,
        receipt_poll: Duration,
        state: StateHandle,
    ) -> Self {
        Self {
            sale,
            provider,
            receipt_poll,
            state,
        }
    }

    pub fn sale(&self) -> &SaleContract {
        &self.sale
    }

    /// Handle on an ERC-20 through the same provider.
    pub fn token(&self, address: Address) -> TokenContract {
        TokenContract::new(address, Arc::clone(&self.provider), self.receipt_poll)
    }

    /// Issue the six sale-contract reads concurrently.
    ///
    /// Resolving the input-token address chains into [`ContractCache::refresh_token_scoped`].
    pub async fn refresh(&self) {
        debug!("Refreshing sale contract reads");
        let remaining = async {
            let result = self.sale.remaining_supply().await;
            self.store("remainingSupply", result, |c, v| c.remaining_supply = Some(v));
        };
        let burned = async {
            let result = self.sale.burned_input().await;
            self.store("burnedInput", result, |c, v| c.burned_input = Some(v));
        };
        let to_lp = async {
            let result = self.sale.input_to_lp().await;
            self.store("inputToLP", result, |c, v| c.input_to_lp = Some(v));
        };
        let swapped = async {
            let result = self.sale.swapped_input().await;
            self.store("swappedInput", result, |c, v| c.swapped_input = Some(v));
        };
        let input_token = async {
            let result = self.sale.input_token().await;
            let token = result.as_ref().ok().copied();
            self.store("inputToken", result, |c, v| c.input_token_address = Some(v));
            if let Some(token) = token {
                self.refresh_token_scoped(Some(token)).await;
            }
        };
        let output_token = async {
            let result = self.sale.output_token().await;
            self.store("token", result, |c, v| c.output_token_address = Some(v));
        };

        tokio::join!(remaining, burned, to_lp, swapped, input_token, output_token);
    }

    /// Read the connected account's allowance to the sale contract and its balance.
    ///
    /// `token` falls back to the last known input-token address. Without an account or a
    /// token the fields are left as they are. A result is discarded if the account changed
    /// while the read was in flight.
    pub async fn refresh_token_scoped(&self, token: Option<Address>) {
        let (owner, token) = self.state.read(|s| {
            (
                s.session.address,
                token.or(s.contracts.input_token_address),
            )
        });

        let (allowance, balance) = tokio::join!(
            self.read_allowance(owner, token),
            self.read_balance(owner, token),
        );

        self.store_for(owner, "allowance", allowance, |c, v| {
            c.approved_amount = Some(v)
        });
        self.store_for(owner, "balanceOf", balance, |c, v| {
            c.balance_of_input_token = Some(v)
        });
    }

    /// Allowance `owner` granted the sale contract on `token`.
    pub async fn read_allowance(
        &self,
        owner: Option<Address>,
        token: Option<Address>,
    ) -> Result<Amount> {
        let (owner, token) = ready(owner, token)?;
        self.token(token)
            .allowance(owner, self.sale.address())
            .await
            .map_err(|e| e.into_read_failure("allowance"))
    }

    /// Balance of `owner` on `token`.
    pub async fn read_balance(
        &self,
        owner: Option<Address>,
        token: Option<Address>,
    ) -> Result<Amount> {
        let (owner, token) = ready(owner, token)?;
        self.token(token)
            .balance_of(owner)
            .await
            .map_err(|e| e.into_read_failure("balanceOf"))
    }

    fn store<T>(
        &self,
        field: &'static str,
        result: Result<T>,
        apply: impl FnOnce(&mut ContractSnapshot, T),
    ) {
        match result {
            Ok(value) => self.state.update(|s| apply(&mut s.contracts, value)),
            Err(e) => warn!(field, error = %e.into_read_failure(field), "Contract read failed"),
        }
    }

    fn store_for<T>(
        &self,
        owner: Option<Address>,
        field: &'static str,
        result: Result<T>,
        apply: impl FnOnce(&mut ContractSnapshot, T),
    ) {
        match result {
            Ok(value) => {
                let stored = self.state.update_if(|s| {
                    if s.session.address != owner {
                        return false;
                    }
                    apply(&mut s.contracts, value);
                    true
                });
                if !stored {
                    debug!(field, "Discarding read for a previous account");
                }
            }
            Err(AppError::NotReady(reason)) => debug!(field, reason = %reason, "Token read not ready"),
            Err(e) => warn!(field, error = %e, "Token read failed"),
        }
    }

    /// Re-run reads on session changes until the session is dropped.
    ///
    /// Every trigger spawns its own refresh so a slow read never delays the next block. The
    /// refreshes belong to the returned task: aborting it aborts the ones still running.
    pub fn spawn_refresh_triggers(
        &self,
        mut changes: broadcast::Receiver<SessionChanged>,
    ) -> JoinHandle<()> {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut refreshes = JoinSet::new();
            loop {
                tokio::select! {
                    change = changes.recv() => match change {
                        Ok(change) => cache.on_session_change(change, &mut refreshes),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Missed session changes, refreshing everything");
                            cache.spawn_refresh(&mut refreshes, true);
                        }
                        Err(RecvError::Closed) => {
                            info!("Session closed, stopping refresh triggers");
                            return;
                        }
                    },
                    Some(finished) = refreshes.join_next(), if !refreshes.is_empty() => {
                        if let Err(e) = finished {
                            if e.is_panic() {
                                error!(error = %e, "Refresh task panicked");
                            }
                        }
                    }
                }
            }
        })
    }

    fn on_session_change(&self, change: SessionChanged, refreshes: &mut JoinSet<()>) {
        debug!(field = ?change.field, block = ?change.session.block_height, "Session changed");
        let account_changed = change.field == SessionField::Address;
        if account_changed {
            self.state.update(|s| s.contracts.clear_token_scoped());
        }
        self.spawn_refresh(refreshes, account_changed);
    }

    fn spawn_refresh(&self, refreshes: &mut JoinSet<()>, token_scoped: bool) {
        let cache = self.clone();
        refreshes.spawn(async move {
            if token_scoped {
                tokio::join!(cache.refresh(), cache.refresh_token_scoped(None));
            } else {
                cache.refresh().await;
            }
        });
    }
}

fn ready(owner: Option<Address>, token: Option<Address>) -> Result<(Address, Address)> {
    let owner = owner.ok_or_else(|| AppError::NotReady("no wallet connected".to_string()))?;
    let token = token.ok_or_else(|| AppError::NotReady("input token not known yet".to_string()))?;
    Ok((owner, token))
}
