//! # Sale and Token Contracts
//!
//! ABI bindings and thin typed handles for the two contracts the dApp talks to:
//!
//! - the **sale contract**: supply counters, the input/output token addresses, the
//!   `tokensForInput` quote, and the `getToken` purchase
//! - the **input token** (ERC-20): allowance, balance, metadata and `approve`
//!
//! Each read encodes one call with `alloy-sol-types`, sends it through [`wallet::call`], and
//! decodes the single return value. Amount-valued results come back as [`Amount`].

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{sol, SolCall};

use super::amount::Amount;
use super::wallet;
use crate::core::error::{AppError, Result};
use crate::core::service::WalletProvider;

sol! {
    /// Token sale contract.
    interface ISale {
        function remainingSupply() external view returns (uint256);
        function burnedInput() external view returns (uint256);
        function inputToLP() external view returns (uint256);
        function swappedInput() external view returns (uint256);
        function inputToken() external view returns (address);
        function token() external view returns (address);
        function tokensForInput(uint256 amount) external view returns (uint256);
        function getToken(uint256 amount) external;
    }

    /// ERC-20 subset used by the purchase flow.
    interface IERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// Encode `call`, run it as `eth_call` against `to`, decode its return value.
async fn read<C>(provider: &dyn WalletProvider, to: Address, call: C) -> Result<C::Return>
where
    C: SolCall + Send,
{
    let data = Bytes::from(call.abi_encode());
    let output = wallet::call(provider, to, data).await?;
    C::abi_decode_returns(&output)
        .map_err(|e| AppError::Transport(format!("{} decode failed: {}", C::SIGNATURE, e)))
}

/// Encode `call`, submit it from `from`, and wait until it is mined.
async fn write<C>(
    provider: &dyn WalletProvider,
    from: Address,
    to: Address,
    call: C,
    receipt_poll: Duration,
) -> Result<B256>
where
    C: SolCall + Send,
{
    let data = Bytes::from(call.abi_encode());
    let hash = wallet::send_transaction(provider, from, to, data).await?;
    wallet::wait_for_receipt(provider, hash, receipt_poll).await
}

/// Handle on the deployed sale contract.
#[derive(Clone)]
pub struct SaleContract {
    address: Address,
    provider: Arc<dyn WalletProvider>,
    receipt_poll: Duration,
}

impl SaleContract {
    pub fn new(address: Address, provider: Arc<dyn WalletProvider>, receipt_poll: Duration) -> Self {
        Self {
            address,
            provider,
            receipt_poll,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Output tokens still for sale.
    pub async fn remaining_supply(&self) -> Result<Amount> {
        read(&*self.provider, self.address, ISale::remainingSupplyCall {})
            .await
            .map(Amount::from_raw)
    }

    /// Input tokens burned so far.
    pub async fn burned_input(&self) -> Result<Amount> {
        read(&*self.provider, self.address, ISale::burnedInputCall {})
            .await
            .map(Amount::from_raw)
    }

    /// Input tokens routed into the liquidity pool.
    pub async fn input_to_lp(&self) -> Result<Amount> {
        read(&*self.provider, self.address, ISale::inputToLPCall {})
            .await
            .map(Amount::from_raw)
    }

    /// Input tokens swapped to output tokens after being added to liquidity.
    pub async fn swapped_input(&self) -> Result<Amount> {
        read(&*self.provider, self.address, ISale::swappedInputCall {})
            .await
            .map(Amount::from_raw)
    }

    /// Address of the ERC-20 the sale accepts.
    pub async fn input_token(&self) -> Result<Address> {
        read(&*self.provider, self.address, ISale::inputTokenCall {}).await
    }

    /// Address of the token being sold.
    pub async fn output_token(&self) -> Result<Address> {
        read(&*self.provider, self.address, ISale::tokenCall {}).await
    }

    /// Quote: output tokens received for `amount` input tokens.
    pub async fn tokens_for_input(&self, amount: Amount) -> Result<Amount> {
        read(
            &*self.provider,
            self.address,
            ISale::tokensForInputCall {
                amount: amount.raw(),
            },
        )
        .await
        .map(Amount::from_raw)
    }

    /// Purchase with `amount` input tokens from `from`; resolves once mined.
    pub async fn get_token(&self, from: Address, amount: Amount) -> Result<B256> {
        write(
            &*self.provider,
            from,
            self.address,
            ISale::getTokenCall {
                amount: amount.raw(),
            },
            self.receipt_poll,
        )
        .await
    }
}

/// Handle on an ERC-20 token.
#[derive(Clone)]
pub struct TokenContract {
    address: Address,
    provider: Arc<dyn WalletProvider>,
    receipt_poll: Duration,
}

impl TokenContract {
    pub fn new(address: Address, provider: Arc<dyn WalletProvider>, receipt_poll: Duration) -> Self {
        Self {
            address,
            provider,
            receipt_poll,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn symbol(&self) -> Result<String> {
        read(&*self.provider, self.address, IERC20::symbolCall {}).await
    }

    pub async fn decimals(&self) -> Result<u8> {
        read(&*self.provider, self.address, IERC20::decimalsCall {}).await
    }

    /// Amount `owner` allows `spender` to move.
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<Amount> {
        read(
            &*self.provider,
            self.address,
            IERC20::allowanceCall { owner, spender },
        )
        .await
        .map(Amount::from_raw)
    }

    pub async fn balance_of(&self, owner: Address) -> Result<Amount> {
        read(&*self.provider, self.address, IERC20::balanceOfCall { owner })
            .await
            .map(Amount::from_raw)
    }

    /// Set `spender`'s allowance to `amount`; resolves once mined.
    pub async fn approve(&self, from: Address, spender: Address, amount: Amount) -> Result<B256> {
        write(
            &*self.provider,
            from,
            self.address,
            IERC20::approveCall {
                spender,
                amount: amount.raw(),
            },
            self.receipt_poll,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::mock::{address, MockProvider, INPUT_TOKEN};
    use alloy_primitives::U256;

    #[test]
    fn test_selectors_match_abi() {
        assert_eq!(ISale::remainingSupplyCall::SIGNATURE, "remainingSupply()");
        assert_eq!(ISale::getTokenCall::SIGNATURE, "getToken(uint256)");
        assert_eq!(IERC20::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(IERC20::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(IERC20::allowanceCall::SELECTOR, [0xdd, 0x62, 0xed, 0x3e]);
    }

    #[test]
    fn test_approve_calldata_layout() {
        let spender = Address::repeat_byte(0x11);
        let amount: Amount = "100".parse().unwrap();
        let data = IERC20::approveCall {
            spender,
            amount: amount.raw(),
        }
        .abi_encode();

        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[16..36], spender.as_slice());
        assert_eq!(U256::from_be_slice(&data[36..68]), amount.raw());
    }

    #[tokio::test]
    async fn test_token_metadata_reads() {
        let provider = MockProvider::new();
        let token = TokenContract::new(address(INPUT_TOKEN), provider.clone(), Duration::from_millis(1));

        assert_eq!(token.decimals().await.unwrap(), 18);
        assert_eq!(token.symbol().await.unwrap(), "DUSD");
        assert_eq!(provider.call_count("eth_call:decimals"), 1);
    }
}
