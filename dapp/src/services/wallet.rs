//! # Wallet RPC Helpers
//!
//! Typed wrappers over the raw [`WalletProvider::request`] channel: account access, chain and
//! block reads, contract calls, transaction submission and the `wallet_*` extension methods.
//!
//! ## Address verification
//!
//! [`verify_account`] is the single gate every account string passes through before it
//! becomes a session address: the first entry of the list must parse as a 20-byte hex
//! address, and if it is written in mixed case the EIP-55 checksum must match. The returned
//! [`Address`] always displays checksum-normalized.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use serde_json::{json, Value};
use shared::chain::{chain_id_hex, ChainDescriptor};
use shared::dto::wallet::{SwitchEthereumChainParameter, WatchAssetParameter};
use tracing::{debug, trace};

use crate::core::error::{AppError, Result};
use crate::core::service::WalletProvider;

/// Outcome recorded in a mined transaction receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    Success,
    Reverted,
}

/// Pick the active account out of an account list.
///
/// Returns `None` for an empty list or an account that fails verification.
pub fn verify_account(accounts: &[String]) -> Option<Address> {
    let raw = accounts.first()?.trim();
    let hex = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))?;

    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(raw, None).ok()
    } else {
        raw.parse::<Address>().ok()
    }
}

/// Parse a JSON-RPC quantity: `"0x46a"`, `"1130"` or a bare number.
pub fn parse_quantity(value: &Value) -> Result<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| AppError::Transport(format!("Quantity out of range: {}", n))),
        Value::String(s) => parse_quantity_str(s),
        other => Err(AppError::Transport(format!("Expected quantity, got {}", other))),
    }
}

/// Parse a quantity string, hex (`0x`-prefixed) or decimal.
pub fn parse_quantity_str(s: &str) -> Result<u64> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse::<u64>(),
    };
    parsed.map_err(|e| AppError::Transport(format!("Invalid quantity {:?}: {}", s, e)))
}

fn parse_accounts(value: Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        other => Ok(serde_json::from_value(other)?),
    }
}

/// `eth_requestAccounts`: ask the wallet for permission.
pub async fn request_accounts(provider: &dyn WalletProvider) -> Result<Vec<String>> {
    parse_accounts(provider.request("eth_requestAccounts", json!([])).await?)
}

/// `eth_accounts`: accounts already exposed to us, without prompting.
pub async fn accounts(provider: &dyn WalletProvider) -> Result<Vec<String>> {
    parse_accounts(provider.request("eth_accounts", json!([])).await?)
}

/// `eth_chainId`
pub async fn chain_id(provider: &dyn WalletProvider) -> Result<u64> {
    parse_quantity(&provider.request("eth_chainId", json!([])).await?)
}

/// `eth_blockNumber`
pub async fn block_number(provider: &dyn WalletProvider) -> Result<u64> {
    parse_quantity(&provider.request("eth_blockNumber", json!([])).await?)
}

/// `eth_call` against the latest block.
pub async fn call(provider: &dyn WalletProvider, to: Address, data: Bytes) -> Result<Bytes> {
    trace!(to = %to, data = %data, "eth_call");
    let result = provider
        .request(
            "eth_call",
            json!([{ "to": to.to_string(), "data": data.to_string() }, "latest"]),
        )
        .await?;
    let hex = result
        .as_str()
        .ok_or_else(|| AppError::Transport(format!("eth_call returned {}", result)))?;
    hex.parse::<Bytes>()
        .map_err(|e| AppError::Transport(format!("eth_call returned invalid hex: {}", e)))
}

/// `eth_sendTransaction`: returns the transaction hash as soon as the wallet accepts it.
pub async fn send_transaction(
    provider: &dyn WalletProvider,
    from: Address,
    to: Address,
    data: Bytes,
) -> Result<B256> {
    let result = provider
        .request(
            "eth_sendTransaction",
            json!([{
                "from": from.to_string(),
                "to": to.to_string(),
                "data": data.to_string(),
            }]),
        )
        .await?;
    let hex = result
        .as_str()
        .ok_or_else(|| AppError::Transport(format!("eth_sendTransaction returned {}", result)))?;
    hex.parse::<B256>()
        .map_err(|e| AppError::Transport(format!("Invalid transaction hash: {}", e)))
}

/// `eth_getTransactionReceipt`: `None` while the transaction is pending.
pub async fn transaction_receipt(
    provider: &dyn WalletProvider,
    hash: B256,
) -> Result<Option<ReceiptStatus>> {
    let receipt = provider
        .request("eth_getTransactionReceipt", json!([hash.to_string()]))
        .await?;
    if receipt.is_null() {
        return Ok(None);
    }
    let status = receipt
        .get("status")
        .map(parse_quantity)
        .transpose()?
        .unwrap_or(1);
    Ok(Some(if status == 1 {
        ReceiptStatus::Success
    } else {
        ReceiptStatus::Reverted
    }))
}

/// Poll for the receipt until the transaction is mined.
///
/// No timeout is imposed; a transaction that never mines keeps the caller waiting.
pub async fn wait_for_receipt(
    provider: &dyn WalletProvider,
    hash: B256,
    poll_interval: Duration,
) -> Result<B256> {
    loop {
        match transaction_receipt(provider, hash).await? {
            Some(ReceiptStatus::Success) => return Ok(hash),
            Some(ReceiptStatus::Reverted) => {
                return Err(AppError::WriteFailure(format!(
                    "transaction {} reverted",
                    hash
                )))
            }
            None => {
                debug!(tx_hash = %hash, "Transaction pending");
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}

/// `wallet_switchEthereumChain`
pub async fn switch_chain(provider: &dyn WalletProvider, chain_id: u64) -> Result<()> {
    let param = SwitchEthereumChainParameter {
        chain_id: chain_id_hex(chain_id),
    };
    provider
        .request("wallet_switchEthereumChain", json!([param]))
        .await?;
    Ok(())
}

/// `wallet_addEthereumChain` with the descriptor's parameters.
pub async fn add_chain(provider: &dyn WalletProvider, chain: &ChainDescriptor) -> Result<()> {
    provider
        .request(
            "wallet_addEthereumChain",
            json!([chain.to_add_chain_parameter()]),
        )
        .await?;
    Ok(())
}

/// `wallet_watchAsset`: returns whether the wallet added the token.
pub async fn watch_asset(provider: &dyn WalletProvider, asset: WatchAssetParameter) -> Result<bool> {
    let result = provider.request("wallet_watchAsset", json!(asset)).await?;
    Ok(result.as_bool().unwrap_or(false))
}
