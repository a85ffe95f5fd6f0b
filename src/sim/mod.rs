//! In-process chain reproducing the exchange and token contract behaviour,
//! so the dashboard and the contract properties can be exercised without a
//! node.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::types::{Address, U256};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::contract::{ExchangeGateway, TokenGateway, TxError, TxResult};
use crate::domain::time::now_ts;
use crate::domain::{ExchangeEvent, LoggedEvent, NewOrder, Order, Receipt, TokenEvent};
use crate::helpers::ETHER_ADDRESS;

pub mod exchange;
pub mod revert;
pub mod token;

pub use exchange::ExchangeLedger;
pub use revert::Revert;
pub use token::TokenLedger;

// ==================================================
// CHAIN STATE
// ==================================================

struct ChainState {
    block: u64,
    pinned_time: Option<u64>,
    ether: HashMap<Address, U256>,
    tokens: HashMap<Address, TokenLedger>,
    exchange: ExchangeLedger,
    logs: Vec<LoggedEvent>,
}

impl ChainState {
    fn now(&self) -> u64 {
        self.pinned_time.unwrap_or_else(now_ts)
    }

    fn wallet(&self, account: Address) -> U256 {
        self.ether.get(&account).copied().unwrap_or_default()
    }

    /// One block per transaction.
    fn mine(&mut self, events: Vec<ExchangeEvent>) -> Receipt<ExchangeEvent> {
        self.block += 1;
        for (i, event) in events.iter().enumerate() {
            debug!("🧱 block {} → {}", self.block, event.name());
            self.logs.push(LoggedEvent {
                block: self.block,
                log_index: i as u64,
                event: event.clone(),
            });
        }
        Receipt {
            block: self.block,
            events,
        }
    }

    fn mine_token(&mut self, event: TokenEvent) -> Receipt<TokenEvent> {
        self.block += 1;
        Receipt {
            block: self.block,
            events: vec![event],
        }
    }

    fn split_token(&mut self, token: Address) -> Result<(&mut ExchangeLedger, &mut TokenLedger), Revert> {
        let ledger = self
            .tokens
            .get_mut(&token)
            .ok_or(Revert::UnknownToken(token))?;
        Ok((&mut self.exchange, ledger))
    }
}

#[derive(Clone)]
pub struct LocalChain {
    state: Arc<RwLock<ChainState>>,
}

impl LocalChain {
    pub fn new(exchange: Address, fee_account: Address, fee_percent: U256) -> Self {
        Self {
            state: Arc::new(RwLock::new(ChainState {
                block: 0,
                pinned_time: None,
                ether: HashMap::new(),
                tokens: HashMap::new(),
                exchange: ExchangeLedger::new(exchange, fee_account, fee_percent),
                logs: Vec::new(),
            })),
        }
    }

    pub async fn deploy_token(&self, address: Address, deployer: Address) -> LocalToken {
        let mut state = self.state.write().await;
        state.tokens.insert(address, TokenLedger::new(deployer));
        state.block += 1;
        LocalToken {
            chain: self.clone(),
            address,
        }
    }

    pub async fn exchange(&self) -> LocalExchange {
        let address = self.state.read().await.exchange.address;
        LocalExchange {
            chain: self.clone(),
            address,
        }
    }

    /// Sets the wallet (native currency) balance of `account`.
    pub async fn fund(&self, account: Address, amount: U256) {
        self.state.write().await.ether.insert(account, amount);
    }

    /// Freezes block timestamps at `timestamp`.
    pub async fn set_time(&self, timestamp: u64) {
        self.state.write().await.pinned_time = Some(timestamp);
    }

    /// Plain value transfer. The exchange has no payable fallback.
    pub async fn send_ether(&self, from: Address, to: Address, amount: U256) -> Result<(), TxError> {
        let mut state = self.state.write().await;
        if to == state.exchange.address {
            return Err(Revert::EtherNotAccepted.into());
        }
        let balance = state.wallet(from);
        if balance < amount {
            return Err(Revert::InsufficientBalance.into());
        }
        state.ether.insert(from, balance - amount);
        let to_balance = state.wallet(to) + amount;
        state.ether.insert(to, to_balance);
        state.block += 1;
        Ok(())
    }
}

// ==================================================
// EXCHANGE HANDLE
// ==================================================

#[derive(Clone)]
pub struct LocalExchange {
    chain: LocalChain,
    address: Address,
}

#[async_trait]
impl ExchangeGateway for LocalExchange {
    fn address(&self) -> Address {
        self.address
    }

    async fn fee_account(&self) -> Result<Address> {
        Ok(self.chain.state.read().await.exchange.fee_account)
    }

    async fn fee_percent(&self) -> Result<U256> {
        Ok(self.chain.state.read().await.exchange.fee_percent)
    }

    async fn balance_of(&self, token: Address, user: Address) -> Result<U256> {
        Ok(self.chain.state.read().await.exchange.balance_of(token, user))
    }

    async fn native_balance(&self, user: Address) -> Result<U256> {
        Ok(self.chain.state.read().await.wallet(user))
    }

    async fn order_count(&self) -> Result<U256> {
        Ok(self.chain.state.read().await.exchange.order_count())
    }

    async fn order(&self, id: U256) -> Result<Option<Order>> {
        Ok(self.chain.state.read().await.exchange.order(id).cloned())
    }

    async fn order_filled(&self, id: U256) -> Result<bool> {
        Ok(self.chain.state.read().await.exchange.order_filled(id))
    }

    async fn order_cancelled(&self, id: U256) -> Result<bool> {
        Ok(self.chain.state.read().await.exchange.order_cancelled(id))
    }

    async fn head_block(&self) -> Result<u64> {
        Ok(self.chain.state.read().await.block)
    }

    async fn events(&self, from_block: u64, to_block: u64) -> Result<Vec<LoggedEvent>> {
        if from_block > to_block {
            return Err(anyhow!("Invalid block range {}..={}", from_block, to_block));
        }
        let state = self.chain.state.read().await;
        Ok(state
            .logs
            .iter()
            .filter(|l| l.block >= from_block && l.block <= to_block)
            .cloned()
            .collect())
    }

    async fn deposit_ether(&self, from: Address, amount: U256) -> TxResult {
        let mut state = self.chain.state.write().await;
        let wallet = state.wallet(from);
        if wallet < amount {
            return Err(Revert::InsufficientBalance.into());
        }
        let event = state.exchange.deposit_ether(from, amount)?;
        state.ether.insert(from, wallet - amount);
        Ok(state.mine(vec![event]))
    }

    async fn withdraw_ether(&self, from: Address, amount: U256) -> TxResult {
        let mut state = self.chain.state.write().await;
        let event = state.exchange.withdraw_ether(from, amount)?;
        let wallet = state.wallet(from) + amount;
        state.ether.insert(from, wallet);
        Ok(state.mine(vec![event]))
    }

    async fn deposit_token(&self, from: Address, token: Address, amount: U256) -> TxResult {
        let mut state = self.chain.state.write().await;
        if token == ETHER_ADDRESS {
            return Err(Revert::NativeCurrencyAsToken.into());
        }
        let (exchange, ledger) = state.split_token(token)?;
        let event = exchange.deposit_token(token, ledger, from, amount)?;
        Ok(state.mine(vec![event]))
    }

    async fn withdraw_token(&self, from: Address, token: Address, amount: U256) -> TxResult {
        let mut state = self.chain.state.write().await;
        if token == ETHER_ADDRESS {
            return Err(Revert::NativeCurrencyAsToken.into());
        }
        let (exchange, ledger) = state.split_token(token)?;
        let event = exchange.withdraw_token(token, ledger, from, amount)?;
        Ok(state.mine(vec![event]))
    }

    async fn make_order(&self, from: Address, order: NewOrder) -> TxResult {
        let mut state = self.chain.state.write().await;
        let now = state.now();
        let event = state.exchange.make_order(from, order, now);
        Ok(state.mine(vec![event]))
    }

    async fn fill_order(&self, from: Address, id: U256) -> TxResult {
        let mut state = self.chain.state.write().await;
        let now = state.now();
        let event = state.exchange.fill_order(from, id, now)?;
        Ok(state.mine(vec![event]))
    }

    async fn cancel_order(&self, from: Address, id: U256) -> TxResult {
        let mut state = self.chain.state.write().await;
        let now = state.now();
        let event = state.exchange.cancel_order(from, id, now)?;
        Ok(state.mine(vec![event]))
    }
}

// ==================================================
// TOKEN HANDLE
// ==================================================

#[derive(Clone)]
pub struct LocalToken {
    chain: LocalChain,
    address: Address,
}

impl LocalToken {
    async fn with_ledger<T>(&self, f: impl FnOnce(&TokenLedger) -> T) -> Result<T> {
        let state = self.chain.state.read().await;
        let ledger = state
            .tokens
            .get(&self.address)
            .ok_or_else(|| anyhow!("No token deployed at {:?}", self.address))?;
        Ok(f(ledger))
    }

    async fn mutate(
        &self,
        f: impl FnOnce(&mut TokenLedger) -> Result<TokenEvent, Revert>,
    ) -> TxResult<TokenEvent> {
        let mut state = self.chain.state.write().await;
        let ledger = state
            .tokens
            .get_mut(&self.address)
            .ok_or(Revert::UnknownToken(self.address))?;
        let event = f(ledger)?;
        Ok(state.mine_token(event))
    }
}

#[async_trait]
impl TokenGateway for LocalToken {
    fn address(&self) -> Address {
        self.address
    }

    async fn name(&self) -> Result<String> {
        self.with_ledger(|t| t.name.clone()).await
    }

    async fn symbol(&self) -> Result<String> {
        self.with_ledger(|t| t.symbol.clone()).await
    }

    async fn decimals(&self) -> Result<u8> {
        self.with_ledger(|t| t.decimals).await
    }

    async fn total_supply(&self) -> Result<U256> {
        self.with_ledger(|t| t.total_supply).await
    }

    async fn balance_of(&self, owner: Address) -> Result<U256> {
        self.with_ledger(|t| t.balance_of(owner)).await
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        self.with_ledger(|t| t.allowance(owner, spender)).await
    }

    async fn transfer(&self, from: Address, to: Address, value: U256) -> TxResult<TokenEvent> {
        self.mutate(|t| t.transfer(from, to, value)).await
    }

    async fn approve(&self, from: Address, spender: Address, value: U256) -> TxResult<TokenEvent> {
        self.mutate(|t| t.approve(from, spender, value)).await
    }

    async fn transfer_from(
        &self,
        sender: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> TxResult<TokenEvent> {
        self.mutate(|t| t.transfer_from(sender, from, to, value)).await
    }
}
