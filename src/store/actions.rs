use ethers::types::{Address, U256};

use crate::domain::{Order, Trade};

/// Tagged event descriptions folded by the reducer. Constructing one has no
/// side effects; only `Store::dispatch` applies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // web3
    Web3Loaded { chain_id: u64 },
    Web3AccountLoaded(Address),

    // contracts
    TokenLoaded(Address),
    ExchangeLoaded(Address),

    // order collections
    CancelledOrdersLoaded(Vec<Order>),
    FilledOrdersLoaded(Vec<Trade>),
    AllOrdersLoaded(Vec<Order>),
    OrdersLoadFailed(String),

    // order lifecycle
    OrderCancelling,
    OrderCancelled(Order),
    OrderFilling,
    OrderFilled(Trade),

    // balances
    EtherBalanceLoaded(U256),
    TokenBalanceLoaded(U256),
    ExchangeEtherBalanceLoaded(U256),
    ExchangeTokenBalanceLoaded(U256),
    BalancesLoaded,
    BalancesLoading,

    // deposit / withdraw form
    EtherDepositAmountChanged(String),
    EtherWithdrawAmountChanged(String),
    TokenDepositAmountChanged(String),
    TokenWithdrawAmountChanged(String),

    // order entry form
    BuyOrderAmountChanged(String),
    BuyOrderPriceChanged(String),
    BuyOrderMaking,
    OrderMade(Order),
    SellOrderAmountChanged(String),
    SellOrderPriceChanged(String),
    SellOrderMaking,

    TransactionFailed(String),
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Web3Loaded { .. } => "WEB3_LOADED",
            Action::Web3AccountLoaded(_) => "WEB3_ACCOUNT_LOADED",
            Action::TokenLoaded(_) => "TOKEN_LOADED",
            Action::ExchangeLoaded(_) => "EXCHANGE_LOADED",
            Action::CancelledOrdersLoaded(_) => "CANCELLED_ORDERS_LOADED",
            Action::FilledOrdersLoaded(_) => "FILLED_ORDERS_LOADED",
            Action::AllOrdersLoaded(_) => "ALL_ORDERS_LOADED",
            Action::OrdersLoadFailed(_) => "ORDERS_LOAD_FAILED",
            Action::OrderCancelling => "ORDER_CANCELLING",
            Action::OrderCancelled(_) => "ORDER_CANCELLED",
            Action::OrderFilling => "ORDER_FILLING",
            Action::OrderFilled(_) => "ORDER_FILLED",
            Action::EtherBalanceLoaded(_) => "ETHER_BALANCE_LOADED",
            Action::TokenBalanceLoaded(_) => "TOKEN_BALANCE_LOADED",
            Action::ExchangeEtherBalanceLoaded(_) => "EXCHANGE_ETHER_BALANCE_LOADED",
            Action::ExchangeTokenBalanceLoaded(_) => "EXCHANGE_TOKEN_BALANCE_LOADED",
            Action::BalancesLoaded => "BALANCES_LOADED",
            Action::BalancesLoading => "BALANCES_LOADING",
            Action::EtherDepositAmountChanged(_) => "ETHER_DEPOSIT_AMOUNT_CHANGED",
            Action::EtherWithdrawAmountChanged(_) => "ETHER_WITHDRAW_AMOUNT_CHANGED",
            Action::TokenDepositAmountChanged(_) => "TOKEN_DEPOSIT_AMOUNT_CHANGED",
            Action::TokenWithdrawAmountChanged(_) => "TOKEN_WITHDRAW_AMOUNT_CHANGED",
            Action::BuyOrderAmountChanged(_) => "BUY_ORDER_AMOUNT_CHANGED",
            Action::BuyOrderPriceChanged(_) => "BUY_ORDER_PRICE_CHANGED",
            Action::BuyOrderMaking => "BUY_ORDER_MAKING",
            Action::OrderMade(_) => "ORDER_MADE",
            Action::SellOrderAmountChanged(_) => "SELL_ORDER_AMOUNT_CHANGED",
            Action::SellOrderPriceChanged(_) => "SELL_ORDER_PRICE_CHANGED",
            Action::SellOrderMaking => "SELL_ORDER_MAKING",
            Action::TransactionFailed(_) => "TRANSACTION_FAILED",
        }
    }
}
