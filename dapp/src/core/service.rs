//! # Provider Port
//!
//! The wallet-provider boundary as a trait, so the session, cache and gate run unchanged
//! against a browser wallet bridge, a node-backed JSON-RPC provider, or a scripted test
//! double.
//!
//! The shape follows EIP-1193: one generic `request(method, params)` call plus push events.
//! Typed helpers on top of it live in [`crate::services::wallet`].

use async_trait::async_trait;
use serde_json::Value;

use super::error::Result;

/// Event pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// `accountsChanged`: raw account strings as the wallet reported them. Empty means the
    /// wallet disconnected.
    AccountsChanged(Vec<String>),
    /// `chainChanged`: chain id as a hex quantity (`"0x46a"`).
    ChainChanged(String),
    /// New block header observed.
    NewBlock(u64),
}

/// EIP-1193 style wallet provider.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Send a JSON-RPC request and return its `result`.
    ///
    /// JSON-RPC error objects come back as [`crate::core::AppError::from_rpc`].
    async fn request(&self, method: &str, params: Value) -> Result<Value>;

    /// Receiver for provider push events.
    ///
    /// The session is the single consumer; every call returns a handle to the same queue.
    fn events(&self) -> async_channel::Receiver<ProviderEvent>;

    /// Whether a usable wallet sits behind this provider.
    fn is_installed(&self) -> bool {
        true
    }
}
