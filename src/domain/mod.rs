use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::helpers::ETHER_ADDRESS;

pub mod order;
pub mod time;

pub use order::Side;

// ==================================================
// ORDERS
// ==================================================

/// Mirror of an on-chain order record. Never mutated after creation; fill and
/// cancel state is tracked by id elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: U256,
    pub user: Address,
    #[serde(rename = "tokenGet")]
    pub token_get: Address,
    #[serde(rename = "amountGet")]
    pub amount_get: U256,
    #[serde(rename = "tokenGive")]
    pub token_give: Address,
    #[serde(rename = "amountGive")]
    pub amount_give: U256,
    pub timestamp: u64,
}

impl Order {
    /// The maker side: giving ether means the maker is buying tokens.
    pub fn side(&self) -> Side {
        if self.token_give == ETHER_ADDRESS {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    pub fn ether_amount(&self) -> U256 {
        match self.side() {
            Side::Buy => self.amount_give,
            Side::Sell => self.amount_get,
        }
    }

    pub fn token_amount(&self) -> U256 {
        match self.side() {
            Side::Buy => self.amount_get,
            Side::Sell => self.amount_give,
        }
    }
}

/// Terms submitted to `makeOrder`; id and timestamp are assigned on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewOrder {
    pub token_get: Address,
    pub amount_get: U256,
    pub token_give: Address,
    pub amount_give: U256,
}

/// An order together with the account that filled it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(flatten)]
    pub order: Order,
    #[serde(rename = "userFill")]
    pub user_fill: Address,
}

impl Trade {
    pub fn id(&self) -> U256 {
        self.order.id
    }
}

// ==================================================
// CONTRACT EVENTS
// ==================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ExchangeEvent {
    Deposit {
        token: Address,
        user: Address,
        amount: U256,
        balance: U256,
    },
    Withdraw {
        token: Address,
        user: Address,
        amount: U256,
        balance: U256,
    },
    Order(Order),
    Cancel(Order),
    Trade(Trade),
}

impl ExchangeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ExchangeEvent::Deposit { .. } => "Deposit",
            ExchangeEvent::Withdraw { .. } => "Withdraw",
            ExchangeEvent::Order(_) => "Order",
            ExchangeEvent::Cancel(_) => "Cancel",
            ExchangeEvent::Trade(_) => "Trade",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TokenEvent {
    Transfer {
        from: Address,
        to: Address,
        value: U256,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: U256,
    },
}

/// An exchange event with its position in the chain, used to order the
/// backfill and to resume live polling without overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedEvent {
    pub block: u64,
    pub log_index: u64,
    pub event: ExchangeEvent,
}

/// Outcome of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt<E> {
    pub block: u64,
    pub events: Vec<E>,
}

impl<E> Receipt<E> {
    pub fn first_event(&self) -> Option<&E> {
        self.events.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::units;

    fn order(token_give: Address) -> Order {
        Order {
            id: U256::one(),
            user: Address::from_low_u64_be(1),
            token_get: Address::from_low_u64_be(9),
            amount_get: units(2),
            token_give,
            amount_give: units(1),
            timestamp: 1_700_000_000,
        }
    }

    #[test]
    fn giving_ether_is_a_buy() {
        let o = order(ETHER_ADDRESS);
        assert_eq!(o.side(), Side::Buy);
        assert_eq!(o.ether_amount(), units(1));
        assert_eq!(o.token_amount(), units(2));
    }

    #[test]
    fn giving_tokens_is_a_sell() {
        let mut o = order(Address::from_low_u64_be(9));
        o.token_get = ETHER_ADDRESS;
        assert_eq!(o.side(), Side::Sell);
        assert_eq!(o.ether_amount(), units(2));
        assert_eq!(o.token_amount(), units(1));
    }
}
