use anyhow::Result;
use async_trait::async_trait;
use ethers::types::{Address, U256};

use crate::domain::{ExchangeEvent, LoggedEvent, NewOrder, Order, Receipt, TokenEvent};

pub mod errors;
pub mod exchange;
pub mod token;
mod tx;

pub use errors::TxError;
pub use exchange::EthersExchange;
pub use token::EthersToken;

pub type TxResult<E = ExchangeEvent> = std::result::Result<Receipt<E>, TxError>;

/// Read/write surface of the exchange contract.
///
/// Reads return `anyhow` errors (transport problems); writes return a
/// `TxError` so a revert can be told apart from a dead node. `from` is the
/// sending account for every write.
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    fn address(&self) -> Address;

    async fn fee_account(&self) -> Result<Address>;
    async fn fee_percent(&self) -> Result<U256>;
    async fn balance_of(&self, token: Address, user: Address) -> Result<U256>;
    /// Wallet balance of the native currency, outside the exchange.
    async fn native_balance(&self, user: Address) -> Result<U256>;
    async fn order_count(&self) -> Result<U256>;
    async fn order(&self, id: U256) -> Result<Option<Order>>;
    async fn order_filled(&self, id: U256) -> Result<bool>;
    async fn order_cancelled(&self, id: U256) -> Result<bool>;

    async fn head_block(&self) -> Result<u64>;
    /// Exchange events in `from_block..=to_block`, in chain order.
    async fn events(&self, from_block: u64, to_block: u64) -> Result<Vec<LoggedEvent>>;

    async fn deposit_ether(&self, from: Address, amount: U256) -> TxResult;
    async fn withdraw_ether(&self, from: Address, amount: U256) -> TxResult;
    async fn deposit_token(&self, from: Address, token: Address, amount: U256) -> TxResult;
    async fn withdraw_token(&self, from: Address, token: Address, amount: U256) -> TxResult;
    async fn make_order(&self, from: Address, order: NewOrder) -> TxResult;
    async fn fill_order(&self, from: Address, id: U256) -> TxResult;
    async fn cancel_order(&self, from: Address, id: U256) -> TxResult;
}

/// Standard fungible token surface.
#[async_trait]
pub trait TokenGateway: Send + Sync {
    fn address(&self) -> Address;

    async fn name(&self) -> Result<String>;
    async fn symbol(&self) -> Result<String>;
    async fn decimals(&self) -> Result<u8>;
    async fn total_supply(&self) -> Result<U256>;
    async fn balance_of(&self, owner: Address) -> Result<U256>;
    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256>;

    async fn transfer(&self, from: Address, to: Address, value: U256) -> TxResult<TokenEvent>;
    async fn approve(&self, from: Address, spender: Address, value: U256) -> TxResult<TokenEvent>;
    async fn transfer_from(
        &self,
        sender: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> TxResult<TokenEvent>;
}
