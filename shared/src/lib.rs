//! # Shared Chain and Wallet Types
//!
//! Types shared by everything that talks to the sale contract's network: the static chain
//! registry, the wallet-RPC parameter DTOs and a few display helpers.
//!
//! ## Structure
//!
//! - **[`chain`]**: Chain descriptor registry (supported network, known networks)
//! - **[`dto`]**: Wallet JSON-RPC parameter objects
//!   - **[`dto::wallet`]**: `wallet_switchEthereumChain`, `wallet_addEthereumChain`,
//!     `wallet_watchAsset`
//! - **[`utils`]**: Shared utility functions
//!   - **[`utils::format_address`]**: Format wallet addresses for display
//!   - **[`utils::truncate_address`]**: Truncate addresses with ellipsis
//!
//! ## Usage
//!
//! ```rust
//! use shared::chain::SUPPORTED_CHAIN;
//! use shared::utils::truncate_address;
//!
//! let params = SUPPORTED_CHAIN.to_add_chain_parameter();
//! assert_eq!(params.chain_id, "0x46a");
//! assert_eq!(
//!     truncate_address("0x74FA4eb5a2b312E0e877f8B862641639DDB75F65"),
//!     "0x74...5F65"
//! );
//! ```

pub mod chain;
pub mod dto;
pub mod utils;

pub use chain::{ChainDescriptor, NativeCurrency, SUPPORTED_CHAIN};
pub use dto::*;
pub use utils::*;
