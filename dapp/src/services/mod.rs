//! # Services Module
//!
//! Chain-facing clients and the value types they exchange.
//!
//! ## Module Overview
//!
//! ```text
//! services/
//! ├── amount.rs     - 18-decimal fixed-point token amounts
//! ├── wallet.rs     - Typed EIP-1193 helpers (accounts, chain, calls, wallet_* methods)
//! ├── contracts.rs  - Sale contract and ERC-20 bindings
//! ├── rpc.rs        - Node-backed JSON-RPC provider with polled change events
//! └── ws.rs         - newHeads WebSocket subscription
//! ```
//!
//! ## Layering
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  SaleContract / TokenContract (contracts.rs) │
//! └──────────────────────┬───────────────────────┘
//!                        │ eth_call / eth_sendTransaction
//! ┌──────────────────────▼───────────────────────┐
//! │  wallet.rs helpers                           │
//! └──────────────────────┬───────────────────────┘
//!                        │ request(method, params)
//! ┌──────────────────────▼───────────────────────┐
//! │  dyn WalletProvider                          │
//! │  (JsonRpcProvider, browser bridge, test mock)│
//! └──────────────────────────────────────────────┘
//! ```

pub mod amount;
pub mod contracts;
pub mod rpc;
pub mod wallet;
pub mod ws;

pub use amount::{Amount, TOKEN_DECIMALS};
pub use contracts::{SaleContract, TokenContract};
pub use rpc::JsonRpcProvider;
