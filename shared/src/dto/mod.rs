//! # Data Transfer Objects (DTOs)
//!
//! Parameter and error shapes exchanged with an EIP-1193 wallet provider over its JSON-RPC
//! `request` channel.
//!
//! ## Module Organization
//!
//! - [`wallet`] - `wallet_*` method parameters and the JSON-RPC error object
//!
//! ## Serialization Format
//!
//! Wallets expect the camelCase field names of the EIPs that define each method:
//!
//! ```text
//! {
//!   "method": "wallet_switchEthereumChain",
//!   "params": [{ "chainId": "0x46a" }]
//! }
//! ```

pub mod wallet;
