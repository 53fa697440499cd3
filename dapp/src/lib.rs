//! # HOSP Token Sale dApp - Library Root
//!
//! Headless core of the token-sale dApp: it tracks a wallet session, caches the sale
//! contract's public reads, quotes purchases and runs the approve-then-buy flow behind a
//! single-flight gate. The `dapp-monitor` binary (`main.rs`) drives it against a node.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │              dapp (this crate)                         │
//! ├────────────────────────────────────────────────────────┤
//! │  alloy         - Addresses, U256, sol! ABI encoding    │
//! │  Tokio         - Async runtime, watch/broadcast        │
//! │  Reqwest       - JSON-RPC over HTTP                     │
//! │  Tungstenite   - newHeads over WebSocket                │
//! │  tracing       - Structured logging                     │
//! └────────────────────────────────────────────────────────┘
//!          │                              │
//!          │ EIP-1193 requests            │ eth_call / eth_sendTransaction
//!          ▼                              ▼
//! ┌─────────────────┐          ┌─────────────────────────┐
//! │ WalletProvider  │ ───────► │  Sale + ERC-20 contracts │
//! └─────────────────┘          └─────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - **core**: `AppError` and the `WalletProvider` port
//! - **services**: Amounts, wallet RPC helpers, typed contract bindings, the node-backed
//!   provider and the `newHeads` subscription
//! - **app**: Session, contract cache, estimator, transaction gate and the `App` orchestrator
//! - **config**: Environment-driven deployment settings
//! - **debug**: Logging setup
//! - **utils**: Input validation
//!
//! ### Module Dependency Graph
//!
//! ```text
//! main.rs
//!   │
//!   ├── config, debug
//!   │
//!   └── app (session, cache, estimate, gate, network)
//!       ├── services::contracts (typed reads and writes)
//!       ├── services::wallet (EIP-1193 helpers)
//!       └── core (error, WalletProvider)
//! ```

pub mod app;
pub mod config;
pub mod core;
pub mod debug;
pub mod services;
pub mod utils;
