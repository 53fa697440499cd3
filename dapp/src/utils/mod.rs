//! # Utility Functions
//!
//! Shared utility functions used across the dApp core.
//!
//! ## Modules
//!
//! - **[`validation`]**: Purchase amount validation
//!
//! ## Related Modules
//!
//! - [`shared::utils`]: Cross-crate utilities (address truncation)
//! - [`crate::core`]: Core abstractions and error types

pub mod validation;
