//! # Application Module
//!
//! The sale dApp core: wallet session, contract read cache, estimation and the transaction
//! gate, wired together behind [`App`].
//!
//! ## Module Structure
//!
//! ```text
//! app/
//! ├── mod.rs       - App orchestrator (this file)
//! ├── state.rs     - AppState, StateHandle and the published SaleView
//! ├── events.rs    - SessionChanged notifications
//! ├── session.rs   - Wallet session (connect, provider events)
//! ├── cache.rs     - Contract read cache and its refresh triggers
//! ├── estimate.rs  - tokensForInput quotes
//! ├── gate.rs      - approve/buy single-flight gate
//! └── network.rs   - Chain-mismatch gate, switch network, watchAsset
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! provider events ──► Session ──SessionChanged──► ContractCache ──► StateHandle ──► SaleView
//!                                                      ▲                              │
//!                                  TransactionGate ────┘ (refresh on settle)          ▼
//!                                                                                 consumers
//! ```
//!
//! Consumers never touch `AppState` directly: they read [`App::view`] or wait on
//! [`App::subscribe`] and call the action methods.

pub mod cache;
pub mod estimate;
pub mod events;
pub mod gate;
pub mod network;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod tests;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use parking_lot::Mutex;
use shared::chain::ChainDescriptor;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub use cache::ContractCache;
pub use estimate::Estimator;
pub use events::{SessionChanged, SessionField};
pub use gate::{needs_approval, DropReason, GateOutcome, TransactionGate};
pub use network::needs_chain_change;
pub use session::Session;
pub use state::{
    AppState, ContractSnapshot, GateState, PurchaseDraft, SaleView, StateHandle, WalletSession,
};

use crate::core::error::{AppError, Result};
use crate::core::service::WalletProvider;
use crate::services::amount::Amount;
use crate::services::contracts::SaleContract;
use crate::utils::validation::parse_purchase_amount;

/// Which of the two sale tokens to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleToken {
    /// The ERC-20 the sale accepts.
    Input,
    /// The token being sold.
    Output,
}

/// Deployment the app runs against.
#[derive(Debug, Clone)]
pub struct SaleSettings {
    pub sale_contract: Address,
    pub chain: &'static ChainDescriptor,
    pub receipt_poll_interval: Duration,
}

/// The wired-up sale dApp core.
pub struct App {
    provider: Arc<dyn WalletProvider>,
    state: StateHandle,
    session: Session,
    cache: ContractCache,
    estimator: Estimator,
    gate: TransactionGate,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl App {
    pub fn new(provider: Arc<dyn WalletProvider>, settings: SaleSettings) -> Self {
        let state = StateHandle::new(settings.chain, provider.is_installed());
        let sale = SaleContract::new(
            settings.sale_contract,
            Arc::clone(&provider),
            settings.receipt_poll_interval,
        );
        let session = Session::new(Arc::clone(&provider), state.clone());
        let cache = ContractCache::new(
            sale.clone(),
            Arc::clone(&provider),
            settings.receipt_poll_interval,
            state.clone(),
        );
        let estimator = Estimator::new(sale, state.clone());
        let gate = TransactionGate::new(cache.clone(), state.clone());

        Self {
            provider,
            state,
            session,
            cache,
            estimator,
            gate,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to provider events, read the initial session and run the first refresh.
    pub async fn start(&self) {
        if !self.provider.is_installed() {
            warn!("No wallet detected; running read-only");
        }
        {
            let mut tasks = self.tasks.lock();
            tasks.push(self.cache.spawn_refresh_triggers(self.session.subscribe()));
            tasks.push(self.session.spawn_event_loop());
        }

        self.session.init().await;
        self.cache.refresh().await;
        info!(
            chain_id = self.state.chain().chain_id,
            sale = %self.cache.sale().address(),
            "App started"
        );
    }

    pub fn view(&self) -> SaleView {
        self.state.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaleView> {
        self.state.subscribe()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cache(&self) -> &ContractCache {
        &self.cache
    }

    pub fn gate(&self) -> &TransactionGate {
        &self.gate
    }

    pub async fn connect(&self) -> Result<Address> {
        self.session.connect().await
    }

    /// Manual reload of the sale-contract reads.
    pub async fn reload(&self) {
        self.cache.refresh().await;
    }

    /// Store the typed amount and quote it.
    pub async fn set_amount(&self, text: &str) -> Result<Option<Amount>> {
        self.state
            .update(|s| s.draft.amount_text = text.to_string());
        self.estimator.estimate(text).await
    }

    pub async fn estimate(&self, text: &str) -> Result<Option<Amount>> {
        self.estimator.estimate(text).await
    }

    pub fn needs_approval(&self, amount: Amount) -> bool {
        self.gate.needs_approval(amount)
    }

    pub async fn approve(&self, amount: Amount) -> Result<GateOutcome> {
        self.gate.approve(amount).await
    }

    pub async fn buy(&self, amount: Amount) -> Result<GateOutcome> {
        self.gate.buy(amount).await
    }

    /// The purchase button: approve when the drafted amount needs it, buy otherwise.
    pub async fn submit(&self) -> Result<GateOutcome> {
        let text = self.state.read(|s| s.draft.amount_text.clone());
        let amount = parse_purchase_amount(&text, None)?;
        if self.gate.needs_approval(amount) {
            self.gate.approve(amount).await
        } else {
            self.gate.buy(amount).await
        }
    }

    /// Switch the wallet to the supported chain, adding it if needed.
    pub async fn switch_network(&self) -> Result<u64> {
        network::switch_network(self.provider.as_ref(), &self.session, self.state.chain()).await
    }

    /// Register one of the sale tokens with the wallet.
    pub async fn add_token_to_wallet(&self, which: SaleToken) -> Result<bool> {
        let address = self.state.read(|s| match which {
            SaleToken::Input => s.contracts.input_token_address,
            SaleToken::Output => s.contracts.output_token_address,
        });
        let address = address
            .ok_or_else(|| AppError::NotReady(format!("{:?} token address not known yet", which)))?;
        network::add_token_to_wallet(self.provider.as_ref(), &self.cache.token(address)).await
    }
}

impl Drop for App {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}
