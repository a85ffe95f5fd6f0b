use colored::{ColoredString, Colorize};
use ethers::utils::to_checksum;
use rust_decimal::Decimal;
use std::fmt;

use crate::domain::time::format_timestamp;
use crate::helpers::GREEN;
use crate::store::reducer::OrderForm;
use crate::store::selectors::{
    self, Balances, DecoratedOrder, DecoratedTrade, MyTrade, OrderBook, PriceChart,
};
use crate::store::AppState;

/// A display region that derives its own data and loading state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region<T> {
    Loading,
    /// Needs a connected account.
    Unavailable,
    Ready(T),
}

impl<T> Region<T> {
    fn when(ready: bool, build: impl FnOnce() -> T) -> Self {
        if ready {
            Region::Ready(build())
        } else {
            Region::Loading
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Region::Ready(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MyTransactions {
    pub trades: Vec<MyTrade>,
    pub open_orders: Vec<DecoratedOrder>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    pub buy: OrderForm,
    pub sell: OrderForm,
}

/// Fixed layout: balance and order entry side by side, the order book, price
/// chart and my transactions, then the trade history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub balance: Region<Balances>,
    pub order_entry: Region<OrderEntry>,
    pub order_book: Region<OrderBook>,
    pub price_chart: Region<PriceChart>,
    pub my_transactions: Region<MyTransactions>,
    pub trades: Region<Vec<DecoratedTrade>>,
    pub error: Option<String>,
}

impl DashboardView {
    pub fn build(state: &AppState) -> Self {
        let account = state.web3.account;
        let orders_ready = selectors::orders_loaded(state);

        let balance = match account {
            None => Region::Unavailable,
            Some(_) => Region::when(selectors::balances_loaded(state), || {
                selectors::balances(state)
            }),
        };

        let order_entry = match account {
            None => Region::Unavailable,
            Some(_) => Region::when(state.exchange.loaded, || OrderEntry {
                buy: state.exchange.buy_order.clone(),
                sell: state.exchange.sell_order.clone(),
            }),
        };

        let my_transactions = match account {
            None => Region::Unavailable,
            Some(account) => Region::when(orders_ready, || MyTransactions {
                trades: selectors::my_filled_orders(state, account),
                open_orders: selectors::my_open_orders(state, account),
            }),
        };

        Self {
            balance,
            order_entry,
            order_book: Region::when(orders_ready, || selectors::order_book(state)),
            price_chart: Region::when(selectors::filled_orders_loaded(state), || {
                selectors::price_chart(state)
            }),
            my_transactions,
            trades: Region::when(selectors::filled_orders_loaded(state), || {
                selectors::filled_orders(state)
            }),
            error: state
                .exchange
                .last_error
                .clone()
                .or_else(|| state.exchange.load_error.clone()),
        }
    }
}

// ==================================================
// TERMINAL RENDERING
// ==================================================

fn paint(text: String, class: &str) -> ColoredString {
    if class == GREEN {
        text.green()
    } else {
        text.red()
    }
}

fn amount(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn header(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "\n{}", format!("── {} ──", title).bold())
}

fn region<T>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    region: &Region<T>,
    body: impl FnOnce(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    header(f, title)?;
    match region {
        Region::Loading => writeln!(f, "  {}", "loading…".dimmed()),
        Region::Unavailable => writeln!(f, "  {}", "connect an account".dimmed()),
        Region::Ready(data) => body(f, data),
    }
}

fn order_row(f: &mut fmt::Formatter<'_>, o: &DecoratedOrder) -> fmt::Result {
    writeln!(
        f,
        "  #{:<5} {:>14} SIG  {} ETH/SIG  {:>12} ETH",
        o.id,
        o.token_amount,
        paint(format!("{:>10}", o.token_price), o.class()),
        o.ether_amount
    )
}

impl fmt::Display for DashboardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(err) = &self.error {
            writeln!(f, "{}", format!("⚠️  {}", err).red().bold())?;
        }

        region(f, "Balance", &self.balance, |f, b| {
            writeln!(f, "  {:<6} {:>14} {:>14}", "", "Wallet", "Exchange")?;
            writeln!(
                f,
                "  {:<6} {:>14} {:>14}",
                "ETH",
                amount(b.wallet_ether),
                amount(b.exchange_ether)
            )?;
            writeln!(
                f,
                "  {:<6} {:>14} {:>14}",
                "SIG",
                amount(b.wallet_token),
                amount(b.exchange_token)
            )
        })?;

        region(f, "New Order", &self.order_entry, |f, entry| {
            for (side, form) in [("Buy", &entry.buy), ("Sell", &entry.sell)] {
                writeln!(
                    f,
                    "  {:<5} amount {:>10}  price {:>10}{}",
                    side,
                    form.amount.as_deref().unwrap_or("-"),
                    form.price.as_deref().unwrap_or("-"),
                    if form.making { "  (pending)" } else { "" }
                )?;
            }
            Ok(())
        })?;

        region(f, "Order Book", &self.order_book, |f, book| {
            for o in &book.sell_orders {
                order_row(f, o)?;
            }
            writeln!(f, "  {}", "─".repeat(56).dimmed())?;
            for o in &book.buy_orders {
                order_row(f, o)?;
            }
            Ok(())
        })?;

        region(f, "Price Chart", &self.price_chart, |f, chart| {
            match (chart.last_price, chart.last_price_change) {
                (Some(price), Some(change)) => writeln!(
                    f,
                    "  SIG/ETH {} {}",
                    paint(change.sign().to_string(), change.class()),
                    price
                )?,
                (Some(price), None) => writeln!(f, "  SIG/ETH {}", price)?,
                _ => writeln!(f, "  no trades yet")?,
            }
            for c in &chart.series {
                writeln!(
                    f,
                    "  {}  O {}  H {}  L {}  C {}",
                    format_timestamp(c.hour),
                    c.open,
                    c.high,
                    c.low,
                    c.close
                )?;
            }
            Ok(())
        })?;

        region(f, "My Transactions", &self.my_transactions, |f, mine| {
            for t in &mine.trades {
                writeln!(
                    f,
                    "  {}  {}  {} ETH/SIG",
                    t.order.formatted_timestamp,
                    paint(format!("{}{} SIG", t.sign(), t.order.token_amount), t.class()),
                    t.order.token_price
                )?;
            }
            for o in &mine.open_orders {
                writeln!(
                    f,
                    "  open #{} {} {} SIG @ {}",
                    o.id,
                    paint(o.side.as_str().to_string(), o.class()),
                    o.token_amount,
                    o.token_price
                )?;
            }
            Ok(())
        })?;

        region(f, "Trades", &self.trades, |f, trades| {
            for t in trades {
                writeln!(
                    f,
                    "  {}  {:>14} SIG  {}  {}",
                    t.order.formatted_timestamp,
                    t.order.token_amount,
                    paint(format!("{:>10}", t.order.token_price), t.price_class),
                    to_checksum(&t.user_fill, None)
                )?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{reduce, Action};
    use ethers::types::Address;

    #[test]
    fn regions_start_loading_and_need_an_account() {
        let view = DashboardView::build(&AppState::default());
        assert_eq!(view.order_book, Region::Loading);
        assert_eq!(view.trades, Region::Loading);
        assert_eq!(view.balance, Region::Unavailable);
        assert_eq!(view.my_transactions, Region::Unavailable);
    }

    #[test]
    fn order_regions_are_ready_once_collections_load() {
        let state = [
            Action::Web3AccountLoaded(Address::from_low_u64_be(1)),
            Action::CancelledOrdersLoaded(vec![]),
            Action::FilledOrdersLoaded(vec![]),
            Action::AllOrdersLoaded(vec![]),
        ]
        .iter()
        .fold(AppState::default(), reduce);

        let view = DashboardView::build(&state);
        assert!(view.order_book.ready().is_some());
        assert!(view.trades.ready().is_some());
        assert!(view.my_transactions.ready().is_some());
        assert_eq!(view.balance, Region::Loading);

        let rendered = view.to_string();
        assert!(rendered.contains("Order Book"));
        assert!(rendered.contains("no trades yet"));
    }

    #[test]
    fn load_failure_is_surfaced() {
        let state = reduce(AppState::default(), &Action::OrdersLoadFailed("rpc down".into()));
        let view = DashboardView::build(&state);
        assert_eq!(view.error.as_deref(), Some("rpc down"));
        assert!(view.to_string().contains("rpc down"));
    }
}
