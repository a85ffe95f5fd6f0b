use anyhow::Result;
use async_trait::async_trait;
use ethers::contract::{abigen, EthLogDecode};
use ethers::providers::Middleware;
use ethers::types::{Address, Log, U256};
use std::sync::Arc;

use super::tx::{raw_log, send};
use super::{TokenGateway, TxResult};
use crate::domain::TokenEvent;

abigen!(
    Erc20Contract,
    r#"[
        function name() view returns (string)
        function symbol() view returns (string)
        function decimals() view returns (uint8)
        function totalSupply() view returns (uint256)
        function balanceOf(address) view returns (uint256)
        function allowance(address,address) view returns (uint256)
        function transfer(address,uint256) returns (bool)
        function approve(address,uint256) returns (bool)
        function transferFrom(address,address,uint256) returns (bool)
        event Transfer(address indexed from, address indexed to, uint256 value)
        event Approval(address indexed owner, address indexed spender, uint256 value)
    ]"#
);

fn decode_log(log: &Log) -> Option<TokenEvent> {
    match Erc20ContractEvents::decode_log(&raw_log(log)).ok()? {
        Erc20ContractEvents::TransferFilter(e) => Some(TokenEvent::Transfer {
            from: e.from,
            to: e.to,
            value: e.value,
        }),
        Erc20ContractEvents::ApprovalFilter(e) => Some(TokenEvent::Approval {
            owner: e.owner,
            spender: e.spender,
            value: e.value,
        }),
    }
}

#[derive(Clone)]
pub struct EthersToken<M> {
    contract: Erc20Contract<M>,
}

impl<M: Middleware + 'static> EthersToken<M> {
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self {
            contract: Erc20Contract::new(address, client),
        }
    }
}

#[async_trait]
impl<M: Middleware + 'static> TokenGateway for EthersToken<M> {
    fn address(&self) -> Address {
        self.contract.address()
    }

    async fn name(&self) -> Result<String> {
        Ok(self.contract.name().call().await?)
    }

    async fn symbol(&self) -> Result<String> {
        Ok(self.contract.symbol().call().await?)
    }

    async fn decimals(&self) -> Result<u8> {
        Ok(self.contract.decimals().call().await?)
    }

    async fn total_supply(&self) -> Result<U256> {
        Ok(self.contract.total_supply().call().await?)
    }

    async fn balance_of(&self, owner: Address) -> Result<U256> {
        Ok(self.contract.balance_of(owner).call().await?)
    }

    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        Ok(self.contract.allowance(owner, spender).call().await?)
    }

    async fn transfer(&self, from: Address, to: Address, value: U256) -> TxResult<TokenEvent> {
        let call = self.contract.transfer(to, value);
        send(call, from, self.address(), decode_log).await
    }

    async fn approve(&self, from: Address, spender: Address, value: U256) -> TxResult<TokenEvent> {
        let call = self.contract.approve(spender, value);
        send(call, from, self.address(), decode_log).await
    }

    async fn transfer_from(
        &self,
        sender: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> TxResult<TokenEvent> {
        let call = self.contract.transfer_from(from, to, value);
        send(call, sender, self.address(), decode_log).await
    }
}
