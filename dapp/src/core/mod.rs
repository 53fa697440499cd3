//! # Core Abstractions
//!
//! Core traits and error types shared by every other module.
//!
//! ## Modules
//!
//! - **[`error`]**: Application error types (`AppError`, `Result<T>`)
//! - **[`service`]**: The wallet-provider port (`WalletProvider`, `ProviderEvent`)
//!
//! ## Dependency Injection
//!
//! Everything that talks to the chain receives an `Arc<dyn WalletProvider>`:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dapp::core::WalletProvider;
//!
//! // In production: a node-backed provider
//! let provider: Arc<dyn WalletProvider> = JsonRpcProvider::new(url)?;
//!
//! // In tests: a scripted provider
//! let provider: Arc<dyn WalletProvider> = MockProvider::new();
//! ```

pub mod error;
pub mod service;

pub use error::{AppError, Result};
pub use service::{ProviderEvent, WalletProvider};
