//! # Common Error Types
//!
//! Consolidated error handling for the sale dApp core.
//!
//! ## Error Categories
//!
//! Errors are categorized by how the core recovers from them:
//!
//! - **PermissionDenied**: the user rejected a connect or transaction request (EIP-1193 code
//!   4001), or the wallet returned an account that failed verification. The action is rejected
//!   and state is left unchanged.
//! - **ReadFailure**: a background read failed. Always recovered locally by keeping the prior
//!   value and logging.
//! - **WriteFailure**: an approve or buy transaction was rejected by the node or reverted. The
//!   gate lock is released and the cache refreshed regardless.
//! - **ChainMismatch**: the wallet sits on a network other than the supported one.
//! - **NotReady**: a token-scoped read was asked for before a wallet address or token address
//!   is known. Distinct from a zero balance.
//! - **Rpc / Transport**: raw provider failures before they are classified.
//! - **Validation / Config**: bad user input or bad startup configuration.
//!
//! ## Usage Pattern
//!
//! ```rust
//! use dapp::core::error::{AppError, Result};
//!
//! fn require_positive(raw: u64) -> Result<u64> {
//!     if raw == 0 {
//!         return Err(AppError::Validation("Amount must be greater than 0".to_string()));
//!     }
//!     Ok(raw)
//! }
//! ```
//!
//! ## Error Conversion
//!
//! - `reqwest::Error` → `AppError::Transport`
//! - `serde_json::Error` → `AppError::Transport`
//! - JSON-RPC error objects → [`AppError::from_rpc`]

use thiserror::Error;

/// EIP-1193: the user rejected the request.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193: the provider does not support the requested method.
pub const UNSUPPORTED_METHOD_CODE: i64 = 4200;
/// EIP-3326: the requested chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
/// JSON-RPC 2.0: method not found.
pub const METHOD_NOT_FOUND_CODE: i64 = -32601;

/// Application-wide error type.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    /// User rejected the request or the returned account failed verification.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Background read failed; the previous value stays in place.
    #[error("Read failure: {0}")]
    ReadFailure(String),

    /// Approve/buy transaction rejected or reverted.
    #[error("Write failure: {0}")]
    WriteFailure(String),

    /// Wallet is on a network other than the supported one.
    #[error("Chain mismatch: wallet is on chain {actual}, expected {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Preconditions for a read are not met yet (no wallet or token address).
    #[error("Not ready: {0}")]
    NotReady(String),

    /// JSON-RPC error object returned by the provider.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Network or decoding failure talking to the provider.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Input validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Startup configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Classify a JSON-RPC error object.
    ///
    /// Code 4001 is the wallet telling us the user said no.
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            USER_REJECTED_CODE => AppError::PermissionDenied(message),
            _ => AppError::Rpc { code, message },
        }
    }

    /// JSON-RPC error code, when the error came from one.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            AppError::Rpc { code, .. } => Some(*code),
            AppError::PermissionDenied(_) => Some(USER_REJECTED_CODE),
            _ => None,
        }
    }

    /// True when a chain switch failed because the wallet does not know the chain.
    pub fn is_unrecognized_chain(&self) -> bool {
        self.rpc_code() == Some(UNRECOGNIZED_CHAIN_CODE)
    }

    /// True when the provider does not implement the method at all.
    pub fn is_unsupported_method(&self) -> bool {
        matches!(
            self.rpc_code(),
            Some(UNSUPPORTED_METHOD_CODE) | Some(METHOD_NOT_FOUND_CODE)
        )
    }

    /// Reclassify a provider failure on a read path.
    pub fn into_read_failure(self, what: &str) -> Self {
        match self {
            AppError::ReadFailure(_) | AppError::NotReady(_) => self,
            other => AppError::ReadFailure(format!("{}: {}", what, other)),
        }
    }

    /// Reclassify a provider failure on a write path. User rejections stay PermissionDenied.
    pub fn into_write_failure(self, what: &str) -> Self {
        match self {
            AppError::WriteFailure(_) | AppError::PermissionDenied(_) => self,
            other => AppError::WriteFailure(format!("{}: {}", what, other)),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Transport(format!("JSON error: {}", err))
    }
}

impl From<shared::dto::wallet::RpcErrorObject> for AppError {
    fn from(err: shared::dto::wallet::RpcErrorObject) -> Self {
        AppError::from_rpc(err.code, err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_rejection_is_permission_denied() {
        let err = AppError::from_rpc(4001, "User rejected the request.");
        assert_eq!(
            err,
            AppError::PermissionDenied("User rejected the request.".to_string())
        );
        assert_eq!(err.rpc_code(), Some(4001));
    }

    #[test]
    fn test_unrecognized_chain() {
        let err = AppError::from_rpc(4902, "Unrecognized chain ID");
        assert!(err.is_unrecognized_chain());
        assert!(!AppError::from_rpc(-32603, "Internal error").is_unrecognized_chain());
    }

    #[test]
    fn test_unsupported_method() {
        assert!(AppError::from_rpc(-32601, "the method does not exist").is_unsupported_method());
        assert!(AppError::from_rpc(4200, "unsupported").is_unsupported_method());
        assert!(!AppError::Transport("timeout".to_string()).is_unsupported_method());
    }

    #[test]
    fn test_write_failure_keeps_rejection() {
        let rejected = AppError::from_rpc(4001, "denied").into_write_failure("approve");
        assert!(matches!(rejected, AppError::PermissionDenied(_)));

        let reverted = AppError::from_rpc(-32000, "execution reverted").into_write_failure("buy");
        assert_eq!(
            reverted.to_string(),
            "Write failure: buy: RPC error -32000: execution reverted"
        );
    }

    #[test]
    fn test_read_failure_keeps_not_ready() {
        let err = AppError::NotReady("no wallet".to_string()).into_read_failure("allowance");
        assert!(matches!(err, AppError::NotReady(_)));
    }
}
