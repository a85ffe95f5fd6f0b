use ethers::types::{Address, U256};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::token::TokenLedger;
use super::Revert;
use crate::domain::{ExchangeEvent, NewOrder, Order, Trade};
use crate::helpers::ETHER_ADDRESS;

type Balances = HashMap<(Address, Address), U256>;

fn balance(balances: &Balances, token: Address, user: Address) -> U256 {
    balances.get(&(token, user)).copied().unwrap_or_default()
}

fn credit(balances: &mut Balances, token: Address, user: Address, amount: U256) -> Result<U256, Revert> {
    let next = balance(balances, token, user)
        .checked_add(amount)
        .ok_or(Revert::Overflow)?;
    balances.insert((token, user), next);
    Ok(next)
}

fn debit(balances: &mut Balances, token: Address, user: Address, amount: U256) -> Result<U256, Revert> {
    let next = balance(balances, token, user)
        .checked_sub(amount)
        .ok_or(Revert::InsufficientBalance)?;
    balances.insert((token, user), next);
    Ok(next)
}

/// Exchange bookkeeping: per-(token, user) balances, the order table, and the
/// filled / cancelled flags. Every method either applies all of its effects
/// or returns a `Revert` with the ledger unchanged.
#[derive(Debug, Clone)]
pub struct ExchangeLedger {
    pub address: Address,
    pub fee_account: Address,
    pub fee_percent: U256,
    balances: Balances,
    orders: BTreeMap<U256, Order>,
    order_count: U256,
    filled: HashSet<U256>,
    cancelled: HashSet<U256>,
}

impl ExchangeLedger {
    pub fn new(address: Address, fee_account: Address, fee_percent: U256) -> Self {
        Self {
            address,
            fee_account,
            fee_percent,
            balances: HashMap::new(),
            orders: BTreeMap::new(),
            order_count: U256::zero(),
            filled: HashSet::new(),
            cancelled: HashSet::new(),
        }
    }

    // ==================================================
    // READS
    // ==================================================

    pub fn balance_of(&self, token: Address, user: Address) -> U256 {
        balance(&self.balances, token, user)
    }

    pub fn order_count(&self) -> U256 {
        self.order_count
    }

    pub fn order(&self, id: U256) -> Option<&Order> {
        self.orders.get(&id)
    }

    pub fn order_filled(&self, id: U256) -> bool {
        self.filled.contains(&id)
    }

    pub fn order_cancelled(&self, id: U256) -> bool {
        self.cancelled.contains(&id)
    }

    // ==================================================
    // FUNDS
    // ==================================================

    /// Credits ether the caller already moved out of the sender's wallet.
    pub fn deposit_ether(&mut self, user: Address, amount: U256) -> Result<ExchangeEvent, Revert> {
        let balance = credit(&mut self.balances, ETHER_ADDRESS, user, amount)?;
        Ok(ExchangeEvent::Deposit {
            token: ETHER_ADDRESS,
            user,
            amount,
            balance,
        })
    }

    /// Debits the exchange balance; the caller pays the ether back out.
    pub fn withdraw_ether(&mut self, user: Address, amount: U256) -> Result<ExchangeEvent, Revert> {
        let balance = debit(&mut self.balances, ETHER_ADDRESS, user, amount)?;
        Ok(ExchangeEvent::Withdraw {
            token: ETHER_ADDRESS,
            user,
            amount,
            balance,
        })
    }

    pub fn deposit_token(
        &mut self,
        token_address: Address,
        token: &mut TokenLedger,
        user: Address,
        amount: U256,
    ) -> Result<ExchangeEvent, Revert> {
        if token_address == ETHER_ADDRESS {
            return Err(Revert::NativeCurrencyAsToken);
        }

        let mut next = self.balances.clone();
        let balance = credit(&mut next, token_address, user, amount)?;
        token.transfer_from(self.address, user, self.address, amount)?;
        self.balances = next;

        Ok(ExchangeEvent::Deposit {
            token: token_address,
            user,
            amount,
            balance,
        })
    }

    pub fn withdraw_token(
        &mut self,
        token_address: Address,
        token: &mut TokenLedger,
        user: Address,
        amount: U256,
    ) -> Result<ExchangeEvent, Revert> {
        if token_address == ETHER_ADDRESS {
            return Err(Revert::NativeCurrencyAsToken);
        }

        let mut next = self.balances.clone();
        let balance = debit(&mut next, token_address, user, amount)?;
        token.transfer(self.address, user, amount)?;
        self.balances = next;

        Ok(ExchangeEvent::Withdraw {
            token: token_address,
            user,
            amount,
            balance,
        })
    }

    // ==================================================
    // ORDERS
    // ==================================================

    pub fn make_order(&mut self, user: Address, terms: NewOrder, now: u64) -> ExchangeEvent {
        self.order_count += U256::one();
        let order = Order {
            id: self.order_count,
            user,
            token_get: terms.token_get,
            amount_get: terms.amount_get,
            token_give: terms.token_give,
            amount_give: terms.amount_give,
            timestamp: now,
        };
        self.orders.insert(order.id, order.clone());
        ExchangeEvent::Order(order)
    }

    pub fn cancel_order(&mut self, sender: Address, id: U256, now: u64) -> Result<ExchangeEvent, Revert> {
        let order = self.orders.get(&id).ok_or(Revert::InvalidOrderId)?;
        if order.user != sender {
            return Err(Revert::NotOrderOwner);
        }
        if self.cancelled.contains(&id) {
            return Err(Revert::OrderAlreadyCancelled);
        }
        if self.filled.contains(&id) {
            return Err(Revert::OrderAlreadyFilled);
        }

        let order = Order {
            timestamp: now,
            ..order.clone()
        };
        self.cancelled.insert(id);
        Ok(ExchangeEvent::Cancel(order))
    }

    /// The filler pays `amount_get` plus the fee in `token_get`; the maker
    /// receives `amount_get`, the fee account the fee, and the filler the
    /// maker's `amount_give` of `token_give`.
    pub fn fill_order(&mut self, filler: Address, id: U256, now: u64) -> Result<ExchangeEvent, Revert> {
        if id.is_zero() || id > self.order_count {
            return Err(Revert::InvalidOrderId);
        }
        if self.filled.contains(&id) {
            return Err(Revert::OrderAlreadyFilled);
        }
        if self.cancelled.contains(&id) {
            return Err(Revert::OrderAlreadyCancelled);
        }
        let order = self.orders.get(&id).ok_or(Revert::InvalidOrderId)?.clone();

        let fee = order
            .amount_get
            .checked_mul(self.fee_percent)
            .ok_or(Revert::Overflow)?
            / U256::from(100);
        let charged = order.amount_get.checked_add(fee).ok_or(Revert::Overflow)?;

        let mut next = self.balances.clone();
        debit(&mut next, order.token_get, filler, charged)?;
        credit(&mut next, order.token_get, order.user, order.amount_get)?;
        credit(&mut next, order.token_get, self.fee_account, fee)?;
        debit(&mut next, order.token_give, order.user, order.amount_give)?;
        credit(&mut next, order.token_give, filler, order.amount_give)?;

        self.balances = next;
        self.filled.insert(id);

        Ok(ExchangeEvent::Trade(Trade {
            order: Order {
                timestamp: now,
                ..order
            },
            user_fill: filler,
        }))
    }
}
