use anyhow::Result;
use async_trait::async_trait;
use ethers::contract::{abigen, EthLogDecode};
use ethers::providers::Middleware;
use ethers::types::{Address, Log, U256};
use std::sync::Arc;

use super::tx::{raw_log, send};
use super::{ExchangeGateway, TxResult};
use crate::domain::{ExchangeEvent, LoggedEvent, NewOrder, Order, Trade};

// ==================================================
// ABI GENERATION
// ==================================================

abigen!(
    ExchangeContract,
    r#"[
        function feeAccount() view returns (address)
        function feePercent() view returns (uint256)
        function balanceOf(address _token, address _user) view returns (uint256)
        function orderCount() view returns (uint256)
        function orders(uint256) view returns (uint256 id, address user, address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, uint256 timestamp)
        function orderFilled(uint256) view returns (bool)
        function orderCancelled(uint256) view returns (bool)
        function depositEther() payable
        function withdrawEther(uint256 _amount)
        function depositToken(address _token, uint256 _amount)
        function withdrawToken(address _token, uint256 _amount)
        function makeOrder(address _tokenGet, uint256 _amountGet, address _tokenGive, uint256 _amountGive)
        function fillOrder(uint256 _id)
        function cancelOrder(uint256 _id)
        event Deposit(address token, address user, uint256 amount, uint256 balance)
        event Withdraw(address token, address user, uint256 amount, uint256 balance)
        event Order(uint256 id, address user, address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, uint256 timestamp)
        event Cancel(uint256 id, address user, address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, uint256 timestamp)
        event Trade(uint256 id, address user, address tokenGet, uint256 amountGet, address tokenGive, uint256 amountGive, address userFill, uint256 timestamp)
    ]"#
);

// ==================================================
// EVENT MAPPING
// ==================================================

fn to_event(raw: ExchangeContractEvents) -> ExchangeEvent {
    match raw {
        ExchangeContractEvents::DepositFilter(e) => ExchangeEvent::Deposit {
            token: e.token,
            user: e.user,
            amount: e.amount,
            balance: e.balance,
        },
        ExchangeContractEvents::WithdrawFilter(e) => ExchangeEvent::Withdraw {
            token: e.token,
            user: e.user,
            amount: e.amount,
            balance: e.balance,
        },
        ExchangeContractEvents::OrderFilter(e) => ExchangeEvent::Order(Order {
            id: e.id,
            user: e.user,
            token_get: e.token_get,
            amount_get: e.amount_get,
            token_give: e.token_give,
            amount_give: e.amount_give,
            timestamp: e.timestamp.low_u64(),
        }),
        ExchangeContractEvents::CancelFilter(e) => ExchangeEvent::Cancel(Order {
            id: e.id,
            user: e.user,
            token_get: e.token_get,
            amount_get: e.amount_get,
            token_give: e.token_give,
            amount_give: e.amount_give,
            timestamp: e.timestamp.low_u64(),
        }),
        ExchangeContractEvents::TradeFilter(e) => ExchangeEvent::Trade(Trade {
            order: Order {
                id: e.id,
                user: e.user,
                token_get: e.token_get,
                amount_get: e.amount_get,
                token_give: e.token_give,
                amount_give: e.amount_give,
                timestamp: e.timestamp.low_u64(),
            },
            user_fill: e.user_fill,
        }),
    }
}

fn decode_log(log: &Log) -> Option<ExchangeEvent> {
    ExchangeContractEvents::decode_log(&raw_log(log))
        .ok()
        .map(to_event)
}

// ==================================================
// GATEWAY
// ==================================================

/// Exchange gateway backed by a deployed contract.
#[derive(Clone)]
pub struct EthersExchange<M> {
    contract: ExchangeContract<M>,
    client: Arc<M>,
}

impl<M: Middleware + 'static> EthersExchange<M> {
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self {
            contract: ExchangeContract::new(address, client.clone()),
            client,
        }
    }
}

#[async_trait]
impl<M: Middleware + 'static> ExchangeGateway for EthersExchange<M> {
    fn address(&self) -> Address {
        self.contract.address()
    }

    async fn fee_account(&self) -> Result<Address> {
        Ok(self.contract.fee_account().call().await?)
    }

    async fn fee_percent(&self) -> Result<U256> {
        Ok(self.contract.fee_percent().call().await?)
    }

    async fn balance_of(&self, token: Address, user: Address) -> Result<U256> {
        Ok(self.contract.balance_of(token, user).call().await?)
    }

    async fn native_balance(&self, user: Address) -> Result<U256> {
        Ok(self.client.get_balance(user, None).await?)
    }

    async fn order_count(&self) -> Result<U256> {
        Ok(self.contract.order_count().call().await?)
    }

    async fn order(&self, id: U256) -> Result<Option<Order>> {
        let (order_id, user, token_get, amount_get, token_give, amount_give, timestamp) =
            self.contract.orders(id).call().await?;

        // Unknown ids come back as a zeroed struct.
        if order_id.is_zero() {
            return Ok(None);
        }

        Ok(Some(Order {
            id: order_id,
            user,
            token_get,
            amount_get,
            token_give,
            amount_give,
            timestamp: timestamp.low_u64(),
        }))
    }

    async fn order_filled(&self, id: U256) -> Result<bool> {
        Ok(self.contract.order_filled(id).call().await?)
    }

    async fn order_cancelled(&self, id: U256) -> Result<bool> {
        Ok(self.contract.order_cancelled(id).call().await?)
    }

    async fn head_block(&self) -> Result<u64> {
        Ok(self.client.get_block_number().await?.as_u64())
    }

    async fn events(&self, from_block: u64, to_block: u64) -> Result<Vec<LoggedEvent>> {
        let logs = self
            .contract
            .events()
            .from_block(from_block)
            .to_block(to_block)
            .query_with_meta()
            .await?;

        let mut events: Vec<LoggedEvent> = logs
            .into_iter()
            .map(|(raw, meta)| LoggedEvent {
                block: meta.block_number.as_u64(),
                log_index: meta.log_index.low_u64(),
                event: to_event(raw),
            })
            .collect();

        events.sort_by_key(|e| (e.block, e.log_index));
        Ok(events)
    }

    async fn deposit_ether(&self, from: Address, amount: U256) -> TxResult {
        let call = self.contract.deposit_ether().value(amount);
        send(call, from, self.address(), decode_log).await
    }

    async fn withdraw_ether(&self, from: Address, amount: U256) -> TxResult {
        let call = self.contract.withdraw_ether(amount);
        send(call, from, self.address(), decode_log).await
    }

    async fn deposit_token(&self, from: Address, token: Address, amount: U256) -> TxResult {
        let call = self.contract.deposit_token(token, amount);
        send(call, from, self.address(), decode_log).await
    }

    async fn withdraw_token(&self, from: Address, token: Address, amount: U256) -> TxResult {
        let call = self.contract.withdraw_token(token, amount);
        send(call, from, self.address(), decode_log).await
    }

    async fn make_order(&self, from: Address, order: NewOrder) -> TxResult {
        let call = self.contract.make_order(
            order.token_get,
            order.amount_get,
            order.token_give,
            order.amount_give,
        );
        send(call, from, self.address(), decode_log).await
    }

    async fn fill_order(&self, from: Address, id: U256) -> TxResult {
        let call = self.contract.fill_order(id);
        send(call, from, self.address(), decode_log).await
    }

    async fn cancel_order(&self, from: Address, id: U256) -> TxResult {
        let call = self.contract.cancel_order(id);
        send(call, from, self.address(), decode_log).await
    }
}
