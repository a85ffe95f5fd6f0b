//! Derived views over `AppState`. Each dashboard region computes its own
//! slice here; nothing in this module mutates state.

use ethers::types::{Address, U256};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

use super::reducer::AppState;
use crate::domain::time::{format_timestamp, hour_bucket};
use crate::domain::{Order, Side, Trade};
use crate::helpers::{ether, format_balance, format_price, tokens, GREEN, RED};

// ==================================================
// DECORATED ORDERS
// ==================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedOrder {
    pub id: U256,
    pub user: Address,
    pub timestamp: u64,
    pub formatted_timestamp: String,
    pub ether_amount: Decimal,
    pub token_amount: Decimal,
    pub token_price: Decimal,
    /// Maker side of the order.
    pub side: Side,
}

impl DecoratedOrder {
    pub fn from_order(order: &Order) -> Self {
        let ether_amount = ether(Some(order.ether_amount())).unwrap_or_default();
        let token_amount = tokens(Some(order.token_amount())).unwrap_or_default();
        let token_price = if token_amount.is_zero() {
            Decimal::ZERO
        } else {
            format_price(ether_amount / token_amount)
        };

        Self {
            id: order.id,
            user: order.user,
            timestamp: order.timestamp,
            formatted_timestamp: format_timestamp(order.timestamp),
            ether_amount,
            token_amount,
            token_price,
            side: order.side(),
        }
    }

    pub fn class(&self) -> &'static str {
        self.side.class()
    }

    /// What a taker does when filling this order.
    pub fn fill_action(&self) -> Side {
        self.side.opposite()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratedTrade {
    pub order: DecoratedOrder,
    pub user_fill: Address,
    /// GREEN when the price did not drop versus the previous trade.
    pub price_class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MyTrade {
    pub order: DecoratedOrder,
    /// Side from the account's perspective.
    pub side: Side,
}

impl MyTrade {
    pub fn sign(&self) -> &'static str {
        self.side.sign()
    }

    pub fn class(&self) -> &'static str {
        self.side.class()
    }
}

// ==================================================
// LOADING FLAGS
// ==================================================

pub fn orders_loaded(state: &AppState) -> bool {
    let ex = &state.exchange;
    ex.all_orders.loaded && ex.filled_orders.loaded && ex.cancelled_orders.loaded
}

pub fn filled_orders_loaded(state: &AppState) -> bool {
    state.exchange.filled_orders.loaded
}

pub fn balances_loaded(state: &AppState) -> bool {
    !state.exchange.balances_loading
        && state.exchange.ether_balance.is_some()
        && state.exchange.token_balance.is_some()
}

// ==================================================
// OPEN ORDERS + ORDER BOOK
// ==================================================

pub fn open_orders(state: &AppState) -> Vec<Order> {
    let ex = &state.exchange;
    let closed: HashSet<U256> = ex
        .filled_orders
        .data
        .iter()
        .map(|t| t.id())
        .chain(ex.cancelled_orders.data.iter().map(|o| o.id))
        .collect();

    ex.all_orders
        .data
        .iter()
        .filter(|o| !closed.contains(&o.id))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBook {
    pub buy_orders: Vec<DecoratedOrder>,
    pub sell_orders: Vec<DecoratedOrder>,
}

pub fn order_book(state: &AppState) -> OrderBook {
    let (mut buy_orders, mut sell_orders): (Vec<_>, Vec<_>) = open_orders(state)
        .iter()
        .map(DecoratedOrder::from_order)
        .partition(|o| o.side == Side::Buy);

    buy_orders.sort_by(|a, b| b.token_price.cmp(&a.token_price));
    sell_orders.sort_by(|a, b| b.token_price.cmp(&a.token_price));

    OrderBook {
        buy_orders,
        sell_orders,
    }
}

// ==================================================
// TRADES
// ==================================================

fn chronological(trades: &[Trade]) -> Vec<Trade> {
    let mut sorted = trades.to_vec();
    sorted.sort_by_key(|t| (t.order.timestamp, t.id()));
    sorted
}

/// All filled orders, newest first.
pub fn filled_orders(state: &AppState) -> Vec<DecoratedTrade> {
    let mut previous_price: Option<Decimal> = None;
    let mut decorated: Vec<DecoratedTrade> = chronological(&state.exchange.filled_orders.data)
        .iter()
        .map(|trade| {
            let order = DecoratedOrder::from_order(&trade.order);
            let price_class = match previous_price {
                Some(prev) if order.token_price < prev => RED,
                _ => GREEN,
            };
            previous_price = Some(order.token_price);
            DecoratedTrade {
                order,
                user_fill: trade.user_fill,
                price_class,
            }
        })
        .collect();

    decorated.reverse();
    decorated
}

/// Trades the account took part in, as maker or filler, newest first.
pub fn my_filled_orders(state: &AppState, account: Address) -> Vec<MyTrade> {
    let mut mine: Vec<MyTrade> = chronological(&state.exchange.filled_orders.data)
        .iter()
        .filter(|t| t.order.user == account || t.user_fill == account)
        .map(|t| {
            let order = DecoratedOrder::from_order(&t.order);
            let side = if t.order.user == account {
                order.side
            } else {
                order.side.opposite()
            };
            MyTrade { order, side }
        })
        .collect();

    mine.reverse();
    mine
}

pub fn my_open_orders(state: &AppState, account: Address) -> Vec<DecoratedOrder> {
    let mut mine: Vec<DecoratedOrder> = open_orders(state)
        .iter()
        .filter(|o| o.user == account)
        .map(DecoratedOrder::from_order)
        .collect();

    mine.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    mine
}

// ==================================================
// PRICE CHART
// ==================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candle {
    pub hour: u64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceChart {
    pub last_price: Option<Decimal>,
    /// Buy when the last trade priced at or above the one before it.
    pub last_price_change: Option<Side>,
    pub series: Vec<Candle>,
}

pub fn price_chart(state: &AppState) -> PriceChart {
    let trades: Vec<DecoratedOrder> = chronological(&state.exchange.filled_orders.data)
        .iter()
        .map(|t| DecoratedOrder::from_order(&t.order))
        .collect();

    let mut buckets: BTreeMap<u64, Vec<Decimal>> = BTreeMap::new();
    for t in &trades {
        buckets
            .entry(hour_bucket(t.timestamp))
            .or_default()
            .push(t.token_price);
    }

    let series = buckets
        .into_iter()
        .filter_map(|(hour, prices)| {
            let open = *prices.first()?;
            let close = *prices.last()?;
            let high = prices.iter().copied().max()?;
            let low = prices.iter().copied().min()?;
            Some(Candle {
                hour,
                open,
                high,
                low,
                close,
            })
        })
        .collect();

    let last_price = trades.last().map(|t| t.token_price);
    let last_price_change = match trades.as_slice() {
        [.., prev, last] if last.token_price >= prev.token_price => Some(Side::Buy),
        [.., _, _] => Some(Side::Sell),
        _ => None,
    };

    PriceChart {
        last_price,
        last_price_change,
        series,
    }
}

// ==================================================
// BALANCES
// ==================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Balances {
    pub wallet_ether: Option<Decimal>,
    pub wallet_token: Option<Decimal>,
    pub exchange_ether: Option<Decimal>,
    pub exchange_token: Option<Decimal>,
}

pub fn balances(state: &AppState) -> Balances {
    Balances {
        wallet_ether: format_balance(state.web3.balance),
        wallet_token: format_balance(state.token.balance),
        exchange_ether: format_balance(state.exchange.ether_balance),
        exchange_token: format_balance(state.exchange.token_balance),
    }
}
