use ethers::types::Address;
use std::fmt;

use crate::contract::TxError;

/// Precondition failures of the in-process ledger. On a real node these all
/// collapse into a plain revert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revert {
    InsufficientBalance,
    InsufficientAllowance,
    InvalidRecipient,
    EtherNotAccepted,
    NativeCurrencyAsToken,
    InvalidOrderId,
    OrderAlreadyFilled,
    OrderAlreadyCancelled,
    NotOrderOwner,
    UnknownToken(Address),
    Overflow,
}

impl fmt::Display for Revert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revert::InsufficientBalance => write!(f, "insufficient balance"),
            Revert::InsufficientAllowance => write!(f, "insufficient allowance"),
            Revert::InvalidRecipient => write!(f, "invalid recipient"),
            Revert::EtherNotAccepted => write!(f, "ether is not accepted directly"),
            Revert::NativeCurrencyAsToken => write!(f, "native currency is not a token"),
            Revert::InvalidOrderId => write!(f, "invalid order id"),
            Revert::OrderAlreadyFilled => write!(f, "order already filled"),
            Revert::OrderAlreadyCancelled => write!(f, "order already cancelled"),
            Revert::NotOrderOwner => write!(f, "only the order creator can cancel"),
            Revert::UnknownToken(addr) => write!(f, "no token deployed at {:?}", addr),
            Revert::Overflow => write!(f, "arithmetic overflow"),
        }
    }
}

impl std::error::Error for Revert {}

impl From<Revert> for TxError {
    fn from(revert: Revert) -> Self {
        TxError::reverted(revert.to_string())
    }
}
