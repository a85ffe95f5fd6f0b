use ethers::types::{Address, U256};
use std::collections::HashMap;

use super::Revert;
use crate::domain::TokenEvent;
use crate::helpers::units;

pub const NAME: &str = "Sigma Token";
pub const SYMBOL: &str = "SIG";
pub const DECIMALS: u8 = 18;
pub const SUPPLY_UNITS: u64 = 1_000_000;

/// Balances and allowances of a standard fungible token.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl TokenLedger {
    /// Mints the whole supply to `deployer`.
    pub fn new(deployer: Address) -> Self {
        let total_supply = units(SUPPLY_UNITS);
        let mut balances = HashMap::new();
        balances.insert(deployer, total_supply);

        Self {
            name: NAME.to_string(),
            symbol: SYMBOL.to_string(),
            decimals: DECIMALS,
            total_supply,
            balances,
            allowances: HashMap::new(),
        }
    }

    pub fn balance_of(&self, owner: Address) -> U256 {
        self.balances.get(&owner).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<TokenEvent, Revert> {
        if to.is_zero() {
            return Err(Revert::InvalidRecipient);
        }
        let from_balance = self.balance_of(from);
        if from_balance < value {
            return Err(Revert::InsufficientBalance);
        }

        self.balances.insert(from, from_balance - value);
        let to_balance = self
            .balance_of(to)
            .checked_add(value)
            .ok_or(Revert::Overflow)?;
        self.balances.insert(to, to_balance);

        Ok(TokenEvent::Transfer { from, to, value })
    }

    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        value: U256,
    ) -> Result<TokenEvent, Revert> {
        if spender.is_zero() {
            return Err(Revert::InvalidRecipient);
        }
        self.allowances.insert((owner, spender), value);
        Ok(TokenEvent::Approval {
            owner,
            spender,
            value,
        })
    }

    /// Delegated transfer; consumes `spender`'s allowance over `from`.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        value: U256,
    ) -> Result<TokenEvent, Revert> {
        let allowance = self.allowance(from, spender);
        if allowance < value {
            return Err(Revert::InsufficientAllowance);
        }
        let event = self.transfer(from, to, value)?;
        self.allowances.insert((from, spender), allowance - value);
        Ok(event)
    }
}
