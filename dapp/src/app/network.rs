//! # Network Gate and Wallet Extensions
//!
//! Chain-mismatch detection, the switch-network action with its add-chain fallback, and
//! registering a token with the wallet.

use shared::chain::ChainDescriptor;
use shared::dto::wallet::WatchAssetParameter;
use tracing::{info, instrument, warn};

use crate::app::session::Session;
use crate::core::error::{AppError, Result};
use crate::core::service::WalletProvider;
use crate::services::contracts::TokenContract;
use crate::services::wallet;

/// True when the wallet reported a chain and it is not `supported`.
///
/// An unknown chain id does not gate.
pub fn needs_chain_change(chain_id: Option<u64>, supported: &ChainDescriptor) -> bool {
    chain_id.is_some_and(|id| id != supported.chain_id)
}

/// Ask the wallet to switch to `chain`, registering it first if the wallet does not know it.
///
/// A user rejection of the switch is returned as is; only "unrecognized chain" (4902)
/// leads to `wallet_addEthereumChain`. On success the session's chain id is re-read and
/// returned.
#[instrument(skip_all, fields(chain_id = chain.chain_id))]
pub async fn switch_network(
    provider: &dyn WalletProvider,
    session: &Session,
    chain: &ChainDescriptor,
) -> Result<u64> {
    match wallet::switch_chain(provider, chain.chain_id).await {
        Ok(()) => {}
        Err(e) if e.is_unrecognized_chain() => {
            info!(chain = chain.chain_name, "Chain unknown to wallet, adding it");
            wallet::add_chain(provider, chain).await?;
            wallet::switch_chain(provider, chain.chain_id).await?;
        }
        Err(e) => {
            warn!(error = %e, "Switch network failed");
            return Err(e);
        }
    }

    let active = session.reload_chain_id().await?;
    if active != chain.chain_id {
        return Err(AppError::ChainMismatch {
            expected: chain.chain_id,
            actual: active,
        });
    }
    info!(chain_id = active, "Switched network");
    Ok(active)
}

/// Register `token` with the wallet via `wallet_watchAsset`, reading its symbol and decimals.
///
/// Returns whether the wallet added it.
#[instrument(skip_all, fields(token = %token.address()))]
pub async fn add_token_to_wallet(provider: &dyn WalletProvider, token: &TokenContract) -> Result<bool> {
    let (symbol, decimals) = tokio::try_join!(token.symbol(), token.decimals())?;
    let asset = WatchAssetParameter::erc20(token.address().to_checksum(None), symbol, decimals);
    let added = wallet::watch_asset(provider, asset).await?;
    info!(added, "wallet_watchAsset answered");
    Ok(added)
}
