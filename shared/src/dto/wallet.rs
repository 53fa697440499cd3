use serde::{Deserialize, Serialize};

/// `wallet_switchEthereumChain` parameter (EIP-3326)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SwitchEthereumChainParameter {
    pub chain_id: String,
}

/// Native currency entry of [`AddEthereumChainParameter`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeCurrencyParameter {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// `wallet_addEthereumChain` parameter (EIP-3085)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddEthereumChainParameter {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrencyParameter,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

/// `wallet_watchAsset` parameter (EIP-747)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchAssetParameter {
    #[serde(rename = "type")]
    pub asset_type: String,
    pub options: WatchAssetOptions,
}

/// Token details shown by the wallet when watching an asset
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WatchAssetOptions {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

impl WatchAssetParameter {
    /// Watch request for an ERC-20 token
    pub fn erc20(address: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            asset_type: "ERC20".to_string(),
            options: WatchAssetOptions {
                address: address.into(),
                symbol: symbol.into(),
                decimals,
            },
        }
    }
}

/// JSON-RPC error object returned by wallets and nodes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
