//! # Node-Backed Provider
//!
//! [`JsonRpcProvider`] implements [`WalletProvider`] over plain JSON-RPC 2.0 on HTTP.
//!
//! A node has no push channel of its own, so [`JsonRpcProvider::spawn_watcher`] polls
//! `eth_accounts`, `eth_chainId` and `eth_blockNumber` on an interval and emits a
//! [`ProviderEvent`] for every value that changed since the previous poll. Block
//! notifications can additionally come from a `newHeads` subscription
//! ([`crate::services::ws`]) through [`JsonRpcProvider::event_sender`].
//!
//! Nodes do not implement `eth_requestAccounts`; when the node answers with "method not
//! found" the request falls back to `eth_accounts`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use shared::chain::chain_id_hex;
use shared::dto::wallet::RpcErrorObject;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::wallet;
use crate::core::error::{AppError, Result};
use crate::core::service::{ProviderEvent, WalletProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// JSON-RPC provider against a single node URL.
pub struct JsonRpcProvider {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
    events_tx: Sender<ProviderEvent>,
    events_rx: Receiver<ProviderEvent>,
}

impl JsonRpcProvider {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let (events_tx, events_rx) = async_channel::unbounded();
        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
            events_tx,
            events_rx,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sender side of the event queue, for extra event sources such as a `newHeads` stream.
    pub fn event_sender(&self) -> Sender<ProviderEvent> {
        self.events_tx.clone()
    }

    async fn send(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        trace!(id, method, "JSON-RPC request");

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Transport(format!(
                "{} returned HTTP {}",
                method, status
            )));
        }

        let response: RpcResponse = response.json().await?;
        if let Some(error) = response.error {
            debug!(id, method, code = error.code, message = %error.message, "JSON-RPC error");
            return Err(error.into());
        }
        Ok(response.result.unwrap_or(Value::Null))
    }

    /// Poll accounts, chain id and block height every `interval`, emitting change events.
    ///
    /// The first poll reports every value it manages to read. The task ends when the event
    /// queue is closed.
    pub fn spawn_watcher(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let provider = Arc::clone(self);
        tokio::spawn(async move {
            info!(url = %provider.url, interval_ms = interval.as_millis() as u64, "Starting provider watcher");
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last = PollState::default();

            loop {
                ticker.tick().await;
                let (accounts, chain_id, block) = tokio::join!(
                    wallet::accounts(provider.as_ref()),
                    wallet::chain_id(provider.as_ref()),
                    wallet::block_number(provider.as_ref()),
                );
                let current = PollState {
                    accounts: log_poll("eth_accounts", accounts),
                    chain_id: log_poll("eth_chainId", chain_id),
                    block: log_poll("eth_blockNumber", block),
                };

                for event in last.diff(&current) {
                    if provider.events_tx.send(event).await.is_err() {
                        debug!("Event queue closed, stopping provider watcher");
                        return;
                    }
                }
                last.merge(current);
            }
        })
    }
}

fn log_poll<T>(method: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(method, error = %e, "Provider poll failed");
            None
        }
    }
}

/// Last values observed by the watcher. A failed poll leaves the field `None` for that round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PollState {
    accounts: Option<Vec<String>>,
    chain_id: Option<u64>,
    block: Option<u64>,
}

impl PollState {
    /// Events for every field `current` read successfully and that differs from `self`.
    fn diff(&self, current: &PollState) -> Vec<ProviderEvent> {
        let mut events = Vec::new();
        if let Some(accounts) = &current.accounts {
            if self.accounts.as_ref() != Some(accounts) {
                events.push(ProviderEvent::AccountsChanged(accounts.clone()));
            }
        }
        if let Some(chain_id) = current.chain_id {
            if self.chain_id != Some(chain_id) {
                events.push(ProviderEvent::ChainChanged(chain_id_hex(chain_id)));
            }
        }
        if let Some(block) = current.block {
            if self.block != Some(block) {
                events.push(ProviderEvent::NewBlock(block));
            }
        }
        events
    }

    fn merge(&mut self, current: PollState) {
        if current.accounts.is_some() {
            self.accounts = current.accounts;
        }
        if current.chain_id.is_some() {
            self.chain_id = current.chain_id;
        }
        if current.block.is_some() {
            self.block = current.block;
        }
    }
}

#[async_trait]
impl WalletProvider for JsonRpcProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        match self.send(method, params.clone()).await {
            Err(e) if method == "eth_requestAccounts" && e.is_unsupported_method() => {
                debug!("Node has no eth_requestAccounts, falling back to eth_accounts");
                self.send("eth_accounts", params).await
            }
            other => other,
        }
    }

    fn events(&self) -> Receiver<ProviderEvent> {
        self.events_rx.clone()
    }
}
