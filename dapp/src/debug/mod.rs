//! # Logging Infrastructure
//!
//! `tracing` setup for the monitor binary: an env-filtered stderr layer and an optional
//! daily-rotated file layer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config = LogConfig::from_env();
//! let _guard = debug::init_logger(&config);
//!
//! info!(chain_id = 1130, "Monitor started");
//! ```
//!
//! ## Configuration
//!
//! Environment variables:
//! - `RUST_LOG`: Log level filter (e.g., `dapp=debug,info`)
//! - `DAPP_LOG_DIR`: Directory for the rotated log file (default: `logs`)
//! - `DAPP_LOG_FILE`: Enable the file layer (1=on, 0=off)

pub mod config;
pub mod logger;

pub use config::LogConfig;
pub use logger::init as init_logger;
