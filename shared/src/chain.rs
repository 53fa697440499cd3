//! # Chain Descriptor Registry
//!
//! Static description of the EVM networks the sale dApp knows about. Exactly one of them,
//! [`SUPPORTED_CHAIN`], is the network every write path is gated on; the other is kept so a
//! wallet sitting on it can be recognized and asked to switch.
//!
//! The records mirror the `wallet_addEthereumChain` parameter shape (EIP-3085), see
//! [`ChainDescriptor::to_add_chain_parameter`].

use serde::Serialize;

use crate::dto::wallet::{AddEthereumChainParameter, NativeCurrencyParameter};

/// Native currency of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Immutable description of one network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub chain_id: u64,
    pub chain_name: &'static str,
    pub native_currency: NativeCurrency,
    pub rpc_urls: &'static [&'static str],
    pub block_explorer_urls: &'static [&'static str],
}

/// MetaChain mainnet, the network the sale contract is deployed on.
pub const METACHAIN: ChainDescriptor = ChainDescriptor {
    chain_id: 1130,
    chain_name: "MetaChain",
    native_currency: NativeCurrency {
        name: "DFI",
        symbol: "DFI",
        decimals: 18,
    },
    rpc_urls: &["https://dmc.mydefichain.com/mainnet"],
    block_explorer_urls: &["https://mainnet-dmc.mydefichain.com:8441/"],
};

/// MetaChain testnet.
pub const METACHAIN_TESTNET: ChainDescriptor = ChainDescriptor {
    chain_id: 1131,
    chain_name: "MetaChain Testnet",
    native_currency: NativeCurrency {
        name: "DFI",
        symbol: "DFI",
        decimals: 18,
    },
    rpc_urls: &["https://dmc.mydefichain.com/testnet"],
    block_explorer_urls: &["https://testnet-dmc.mydefichain.com:8444/"],
};

/// The network purchase actions are allowed on.
pub const SUPPORTED_CHAIN: ChainDescriptor = METACHAIN;

/// Every known network, supported one first.
pub fn all() -> &'static [ChainDescriptor] {
    &[METACHAIN, METACHAIN_TESTNET]
}

/// Look up a known network by id.
pub fn by_id(chain_id: u64) -> Option<&'static ChainDescriptor> {
    all().iter().find(|chain| chain.chain_id == chain_id)
}

/// `0x`-prefixed hex quantity, the form wallets expect for chain ids.
pub fn chain_id_hex(chain_id: u64) -> String {
    format!("{:#x}", chain_id)
}

impl ChainDescriptor {
    /// Build the `wallet_addEthereumChain` parameter for this network.
    pub fn to_add_chain_parameter(&self) -> AddEthereumChainParameter {
        AddEthereumChainParameter {
            chain_id: chain_id_hex(self.chain_id),
            chain_name: self.chain_name.to_string(),
            native_currency: NativeCurrencyParameter {
                name: self.native_currency.name.to_string(),
                symbol: self.native_currency.symbol.to_string(),
                decimals: self.native_currency.decimals,
            },
            rpc_urls: self.rpc_urls.iter().map(|url| url.to_string()).collect(),
            block_explorer_urls: self
                .block_explorer_urls
                .iter()
                .map(|url| url.to_string())
                .collect(),
        }
    }

    /// First configured RPC endpoint.
    pub fn default_rpc_url(&self) -> Option<&'static str> {
        self.rpc_urls.first().copied()
    }
}
