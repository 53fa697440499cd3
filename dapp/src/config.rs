//! # Monitor Configuration
//!
//! Deployment settings loaded from environment variables (and `.env` through `dotenvy` in the
//! binary). Configuration is validated once on startup to fail fast if misconfigured.
//!
//! | Variable                 | Default                              |
//! |--------------------------|--------------------------------------|
//! | `DAPP_RPC_URL`           | first RPC URL of the configured chain |
//! | `DAPP_WS_URL`            | unset (no `newHeads` subscription)   |
//! | `DAPP_SALE_CONTRACT`     | [`DEFAULT_SALE_CONTRACT`]            |
//! | `DAPP_CHAIN_ID`          | [`SUPPORTED_CHAIN`]                  |
//! | `DAPP_POLL_INTERVAL_MS`  | 4000                                 |
//! | `DAPP_RECEIPT_POLL_MS`   | 1500                                 |

use std::time::Duration;

use alloy_primitives::Address;
use shared::chain::{self, ChainDescriptor, SUPPORTED_CHAIN};

use crate::app::SaleSettings;
use crate::core::error::{AppError, Result};

/// The deployed sale contract.
pub const DEFAULT_SALE_CONTRACT: &str = "0x74FA4eb5a2b312E0e877f8B862641639DDB75F65";

const DEFAULT_POLL_INTERVAL_MS: u64 = 4_000;
const DEFAULT_RECEIPT_POLL_MS: u64 = 1_500;

#[derive(Clone, Debug)]
pub struct DappConfig {
    /// JSON-RPC endpoint of the node
    pub rpc_url: String,
    /// Optional WebSocket endpoint for `newHeads`
    pub ws_url: Option<String>,
    pub sale_contract: Address,
    /// Network purchase actions are gated on
    pub chain_id: u64,
    /// Interval of the account/chain/block watcher
    pub poll_interval: Duration,
    /// Interval between `eth_getTransactionReceipt` polls
    pub receipt_poll_interval: Duration,
}

impl DappConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let chain_id = match lookup("DAPP_CHAIN_ID") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|e| AppError::Config(format!("DAPP_CHAIN_ID must be a number: {}", e)))?,
            None => SUPPORTED_CHAIN.chain_id,
        };

        let rpc_url = match lookup("DAPP_RPC_URL") {
            Some(url) => url,
            None => chain::by_id(chain_id)
                .and_then(ChainDescriptor::default_rpc_url)
                .map(str::to_string)
                .ok_or_else(|| {
                    AppError::Config(format!("DAPP_RPC_URL must be set for chain {}", chain_id))
                })?,
        };

        let sale_contract = lookup("DAPP_SALE_CONTRACT")
            .unwrap_or_else(|| DEFAULT_SALE_CONTRACT.to_string())
            .trim()
            .parse::<Address>()
            .map_err(|e| {
                AppError::Config(format!("DAPP_SALE_CONTRACT must be an address: {}", e))
            })?;

        Ok(Self {
            rpc_url,
            ws_url: lookup("DAPP_WS_URL").filter(|url| !url.trim().is_empty()),
            sale_contract,
            chain_id,
            poll_interval: millis(&lookup, "DAPP_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?,
            receipt_poll_interval: millis(&lookup, "DAPP_RECEIPT_POLL_MS", DEFAULT_RECEIPT_POLL_MS)?,
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        self.chain()?;

        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "DAPP_RPC_URL must be an http(s) URL, got {}",
                self.rpc_url
            )));
        }

        if let Some(ws_url) = &self.ws_url {
            if !(ws_url.starts_with("ws://") || ws_url.starts_with("wss://")) {
                return Err(AppError::Config(format!(
                    "DAPP_WS_URL must be a ws(s) URL, got {}",
                    ws_url
                )));
            }
        }

        if self.poll_interval.is_zero() || self.receipt_poll_interval.is_zero() {
            return Err(AppError::Config("Poll intervals must be non-zero".to_string()));
        }

        Ok(())
    }

    /// The configured network from the chain registry.
    pub fn chain(&self) -> Result<&'static ChainDescriptor> {
        chain::by_id(self.chain_id)
            .ok_or_else(|| AppError::Config(format!("Unknown chain id {}", self.chain_id)))
    }

    pub fn sale_settings(&self) -> Result<SaleSettings> {
        Ok(SaleSettings {
            sale_contract: self.sale_contract,
            chain: self.chain()?,
            receipt_poll_interval: self.receipt_poll_interval,
        })
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Result<Duration> {
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| AppError::Config(format!("{} must be a number of milliseconds: {}", key, e))),
        None => Ok(Duration::from_millis(default)),
    }
}
