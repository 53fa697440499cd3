//! # Shared Utility Functions
//!
//! ## Address Formatting
//!
//! Functions for formatting wallet addresses for display:
//! - [`format_address`] - Format address with ellipsis (first N and last M characters)
//! - [`truncate_address`] - Alias for `format_address` with default parameters
//!
//! ## Usage
//!
//! ```rust
//! use shared::utils::format_address;
//!
//! let address = "0x74FA4eb5a2b312E0e877f8B862641639DDB75F65";
//! assert_eq!(format_address(address, 6, 4), "0x74FA...5F65");
//! ```

/// Format a wallet address by showing the first `prefix_len` and last `suffix_len` characters.
///
/// If the address is shorter than `prefix_len + suffix_len`, it is returned as-is.
/// The `0x` prefix counts towards `prefix_len`.
///
/// # Examples
///
/// ```rust
/// use shared::utils::format_address;
///
/// let addr = "0x74FA4eb5a2b312E0e877f8B862641639DDB75F65";
/// assert_eq!(format_address(addr, 4, 4), "0x74...5F65");
/// assert_eq!(format_address("0xabc", 4, 4), "0xabc");
/// ```
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    let address_len = address.len();

    if address_len <= prefix_len + suffix_len || !address.is_ascii() {
        return address.to_string();
    }

    let prefix = &address[..prefix_len];
    let suffix = &address[address_len - suffix_len..];

    format!("{}...{}", prefix, suffix)
}

/// Format a wallet address with default 4-character prefix and suffix.
///
/// # Examples
///
/// ```rust
/// use shared::utils::truncate_address;
///
/// let addr = "0x74FA4eb5a2b312E0e877f8B862641639DDB75F65";
/// assert_eq!(truncate_address(addr), "0x74...5F65");
/// ```
pub fn truncate_address(address: &str) -> String {
    format_address(address, 4, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x74FA4eb5a2b312E0e877f8B862641639DDB75F65";

    #[test]
    fn test_format_address() {
        assert_eq!(format_address(ADDR, 4, 4), "0x74...5F65");
        assert_eq!(format_address(ADDR, 6, 6), "0x74FA...B75F65");
        assert_eq!(format_address(ADDR, 2, 2), "0x...65");
    }

    #[test]
    fn test_format_address_short() {
        assert_eq!(format_address("0x1234", 4, 4), "0x1234");
        assert_eq!(format_address("", 4, 4), "");
    }

    #[test]
    fn test_truncate_address() {
        assert_eq!(truncate_address(ADDR), "0x74...5F65");
    }
}
