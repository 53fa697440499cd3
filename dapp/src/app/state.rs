//! # Application State Types
//!
//! Mutable state owned by the app (wallet session, contract snapshot, purchase draft), the
//! shared handle every component writes through, and the immutable [`SaleView`] snapshot that
//! is rebuilt and published after every change.

use std::sync::Arc;

use alloy_primitives::Address;
use parking_lot::RwLock;
use serde::Serialize;
use shared::chain::ChainDescriptor;
use tokio::sync::watch;

use crate::services::amount::Amount;
use crate::utils::validation::validate_purchase_amount;

/// Fixed total supply of the output token, in whole tokens.
pub const TOTAL_SUPPLY_TOKENS: u64 = 8_000_000;
/// Share of every input routed to burning, in basis points.
pub const BURN_SHARE_BPS: u32 = 6_667;
/// Share of every input routed to the liquidity pool, in basis points.
pub const LP_SHARE_BPS: u32 = 3_333;

/// Connection state of the wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSession {
    /// Checksum-normalized account, `None` when not connected.
    pub address: Option<Address>,
    pub chain_id: Option<u64>,
    pub block_height: Option<u64>,
}

impl WalletSession {
    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }
}

/// Last known on-chain values. Every field is refreshed on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractSnapshot {
    pub remaining_supply: Option<Amount>,
    pub burned_input: Option<Amount>,
    #[serde(rename = "inputToLP")]
    pub input_to_lp: Option<Amount>,
    pub swapped_input: Option<Amount>,
    pub input_token_address: Option<Address>,
    pub output_token_address: Option<Address>,
    pub approved_amount: Option<Amount>,
    pub balance_of_input_token: Option<Amount>,
}

impl ContractSnapshot {
    /// Drop values that belong to a specific account.
    pub fn clear_token_scoped(&mut self) {
        self.approved_amount = None;
        self.balance_of_input_token = None;
    }
}

/// Single-flight lock shared by approve and buy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum GateState {
    #[default]
    Idle,
    Approving,
    Buying,
}

impl GateState {
    pub fn is_busy(&self) -> bool {
        !matches!(self, GateState::Idle)
    }
}

/// What the user is about to buy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseDraft {
    pub amount_text: String,
    pub estimated_output: Option<Amount>,
    pub gate: GateState,
}

impl PurchaseDraft {
    pub fn is_submitting(&self) -> bool {
        self.gate.is_busy()
    }

    /// The typed amount, if it parses.
    pub fn amount(&self) -> Option<Amount> {
        self.amount_text.parse().ok()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub session: WalletSession,
    pub contracts: ContractSnapshot,
    pub draft: PurchaseDraft,
}

/// Immutable snapshot handed to consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleView {
    pub session: WalletSession,
    pub contracts: ContractSnapshot,
    pub draft: PurchaseDraft,
    pub is_installed: bool,
    pub is_connected: bool,
    pub supported_chain_id: u64,
    /// The wallet reported a chain other than the supported one; write paths are gated.
    pub needs_chain_change: bool,
    /// Whether the submit action would approve rather than buy for the drafted amount.
    pub needs_approval: bool,
    /// Why the drafted amount cannot be submitted, if it cannot.
    pub amount_error: Option<String>,
    /// Remaining supply as a share of [`TOTAL_SUPPLY_TOKENS`], 8 decimals.
    pub remaining_percent: Option<String>,
}

impl SaleView {
    fn build(state: &AppState, chain: &ChainDescriptor, is_installed: bool) -> Self {
        let requested = state.draft.amount().unwrap_or(Amount::ZERO);
        Self {
            session: state.session.clone(),
            contracts: state.contracts.clone(),
            draft: state.draft.clone(),
            is_installed,
            is_connected: state.session.is_connected(),
            supported_chain_id: chain.chain_id,
            needs_chain_change: crate::app::network::needs_chain_change(
                state.session.chain_id,
                chain,
            ),
            needs_approval: crate::app::gate::needs_approval(
                state.contracts.approved_amount,
                requested,
            ),
            amount_error: if state.draft.amount_text.trim().is_empty() {
                None
            } else {
                validate_purchase_amount(
                    &state.draft.amount_text,
                    state.contracts.balance_of_input_token,
                )
                .error
            },
            remaining_percent: state.contracts.remaining_supply.and_then(|remaining| {
                remaining.percent_of(&Amount::from_whole(TOTAL_SUPPLY_TOKENS), 8)
            }),
        }
    }
}

/// Shared, cloneable access to [`AppState`].
///
/// Every write republishes a fresh [`SaleView`] while the write lock is still held, so
/// subscribers never observe views out of order.
#[derive(Clone)]
pub struct StateHandle {
    state: Arc<RwLock<AppState>>,
    view_tx: Arc<watch::Sender<SaleView>>,
    chain: &'static ChainDescriptor,
    is_installed: bool,
}

impl StateHandle {
    pub fn new(chain: &'static ChainDescriptor, is_installed: bool) -> Self {
        let state = AppState::default();
        let (view_tx, _) = watch::channel(SaleView::build(&state, chain, is_installed));
        Self {
            state: Arc::new(RwLock::new(state)),
            view_tx: Arc::new(view_tx),
            chain,
            is_installed,
        }
    }

    pub fn chain(&self) -> &'static ChainDescriptor {
        self.chain
    }

    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.state.read())
    }

    /// Mutate and publish.
    pub fn update<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut state = self.state.write();
        let result = f(&mut state);
        self.publish(&state);
        result
    }

    /// Mutate and publish only when `f` reports a change.
    pub fn update_if(&self, f: impl FnOnce(&mut AppState) -> bool) -> bool {
        let mut state = self.state.write();
        let changed = f(&mut state);
        if changed {
            self.publish(&state);
        }
        changed
    }

    fn publish(&self, state: &AppState) {
        self.view_tx
            .send_replace(SaleView::build(state, self.chain, self.is_installed));
    }

    /// Latest published snapshot.
    pub fn view(&self) -> SaleView {
        self.view_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaleView> {
        self.view_tx.subscribe()
    }
}
