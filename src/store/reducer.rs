use ethers::types::{Address, U256};

use super::actions::Action;
use crate::domain::{Order, Trade};

// ==================================================
// STATE SLICES
// ==================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Web3State {
    pub chain_id: Option<u64>,
    pub account: Option<Address>,
    pub balance: Option<U256>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenState {
    pub loaded: bool,
    pub contract: Option<Address>,
    pub balance: Option<U256>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection<T> {
    pub loaded: bool,
    pub data: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            loaded: false,
            data: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderForm {
    pub amount: Option<String>,
    pub price: Option<String>,
    pub making: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExchangeState {
    pub loaded: bool,
    pub contract: Option<Address>,

    pub cancelled_orders: Collection<Order>,
    pub filled_orders: Collection<Trade>,
    pub all_orders: Collection<Order>,
    pub load_error: Option<String>,

    pub order_cancelling: bool,
    pub order_filling: bool,

    pub ether_balance: Option<U256>,
    pub token_balance: Option<U256>,
    pub balances_loading: bool,

    pub ether_deposit_amount: Option<String>,
    pub ether_withdraw_amount: Option<String>,
    pub token_deposit_amount: Option<String>,
    pub token_withdraw_amount: Option<String>,

    pub buy_order: OrderForm,
    pub sell_order: OrderForm,

    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub web3: Web3State,
    pub token: TokenState,
    pub exchange: ExchangeState,
}

// ==================================================
// REDUCER
// ==================================================

/// Folds one action into the state. Pure: the input is consumed and a new
/// state returned, nothing else is touched.
pub fn reduce(state: AppState, action: &Action) -> AppState {
    AppState {
        web3: web3(state.web3, action),
        token: token(state.token, action),
        exchange: exchange(state.exchange, action),
    }
}

fn web3(mut state: Web3State, action: &Action) -> Web3State {
    match action {
        Action::Web3Loaded { chain_id } => state.chain_id = Some(*chain_id),
        Action::Web3AccountLoaded(account) => state.account = Some(*account),
        Action::EtherBalanceLoaded(balance) => state.balance = Some(*balance),
        _ => {}
    }
    state
}

fn token(mut state: TokenState, action: &Action) -> TokenState {
    match action {
        Action::TokenLoaded(contract) => {
            state.loaded = true;
            state.contract = Some(*contract);
        }
        Action::TokenBalanceLoaded(balance) => state.balance = Some(*balance),
        _ => {}
    }
    state
}

fn exchange(mut state: ExchangeState, action: &Action) -> ExchangeState {
    match action {
        Action::ExchangeLoaded(contract) => {
            state.loaded = true;
            state.contract = Some(*contract);
        }

        Action::CancelledOrdersLoaded(orders) => {
            state.cancelled_orders = Collection {
                loaded: true,
                data: orders.clone(),
            };
        }
        Action::FilledOrdersLoaded(trades) => {
            state.filled_orders = Collection {
                loaded: true,
                data: trades.clone(),
            };
        }
        Action::AllOrdersLoaded(orders) => {
            state.all_orders = Collection {
                loaded: true,
                data: orders.clone(),
            };
            state.load_error = None;
        }
        Action::OrdersLoadFailed(reason) => state.load_error = Some(reason.clone()),

        Action::OrderCancelling => state.order_cancelling = true,
        Action::OrderCancelled(order) => {
            state.order_cancelling = false;
            if !state.cancelled_orders.data.iter().any(|o| o.id == order.id) {
                state.cancelled_orders.data.push(order.clone());
            }
        }

        Action::OrderFilling => state.order_filling = true,
        Action::OrderFilled(trade) => {
            state.order_filling = false;
            if !state.filled_orders.data.iter().any(|t| t.id() == trade.id()) {
                state.filled_orders.data.push(trade.clone());
            }
        }

        Action::ExchangeEtherBalanceLoaded(balance) => state.ether_balance = Some(*balance),
        Action::ExchangeTokenBalanceLoaded(balance) => state.token_balance = Some(*balance),
        Action::BalancesLoading => state.balances_loading = true,
        Action::BalancesLoaded => state.balances_loading = false,

        Action::EtherDepositAmountChanged(amount) => {
            state.ether_deposit_amount = Some(amount.clone())
        }
        Action::EtherWithdrawAmountChanged(amount) => {
            state.ether_withdraw_amount = Some(amount.clone())
        }
        Action::TokenDepositAmountChanged(amount) => {
            state.token_deposit_amount = Some(amount.clone())
        }
        Action::TokenWithdrawAmountChanged(amount) => {
            state.token_withdraw_amount = Some(amount.clone())
        }

        Action::BuyOrderAmountChanged(amount) => state.buy_order.amount = Some(amount.clone()),
        Action::BuyOrderPriceChanged(price) => state.buy_order.price = Some(price.clone()),
        Action::BuyOrderMaking => state.buy_order.making = true,
        Action::SellOrderAmountChanged(amount) => state.sell_order.amount = Some(amount.clone()),
        Action::SellOrderPriceChanged(price) => state.sell_order.price = Some(price.clone()),
        Action::SellOrderMaking => state.sell_order.making = true,

        Action::OrderMade(order) => {
            if !state.all_orders.data.iter().any(|o| o.id == order.id) {
                state.all_orders.data.push(order.clone());
            }
            state.buy_order = OrderForm::default();
            state.sell_order = OrderForm::default();
        }

        Action::TransactionFailed(reason) => {
            state.last_error = Some(reason.clone());
            state.order_cancelling = false;
            state.order_filling = false;
            state.balances_loading = false;
            state.buy_order.making = false;
            state.sell_order.making = false;
        }

        _ => {}
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::{units, ETHER_ADDRESS};

    fn order(id: u64) -> Order {
        Order {
            id: U256::from(id),
            user: Address::from_low_u64_be(1),
            token_get: Address::from_low_u64_be(9),
            amount_get: units(1),
            token_give: ETHER_ADDRESS,
            amount_give: units(1),
            timestamp: 1_700_000_000 + id,
        }
    }

    #[test]
    fn loaded_collections_are_flagged() {
        let state = reduce(AppState::default(), &Action::AllOrdersLoaded(vec![order(1)]));
        assert!(state.exchange.all_orders.loaded);
        assert_eq!(state.exchange.all_orders.data.len(), 1);
        assert!(!state.exchange.filled_orders.loaded);
    }

    #[test]
    fn cancelling_then_cancelled() {
        let mut state = reduce(AppState::default(), &Action::OrderCancelling);
        assert!(state.exchange.order_cancelling);

        state = reduce(state, &Action::OrderCancelled(order(1)));
        assert!(!state.exchange.order_cancelling);
        assert_eq!(state.exchange.cancelled_orders.data, vec![order(1)]);
    }

    #[test]
    fn filled_orders_are_not_duplicated() {
        let trade = Trade {
            order: order(1),
            user_fill: Address::from_low_u64_be(2),
        };
        let mut state = reduce(AppState::default(), &Action::FilledOrdersLoaded(vec![trade.clone()]));
        state = reduce(state, &Action::OrderFilling);
        state = reduce(state, &Action::OrderFilled(trade));

        assert_eq!(state.exchange.filled_orders.data.len(), 1);
        assert!(!state.exchange.order_filling);
    }

    #[test]
    fn order_made_appends_and_resets_forms() {
        let mut state = reduce(AppState::default(), &Action::BuyOrderAmountChanged("10".into()));
        state = reduce(state, &Action::BuyOrderPriceChanged("0.5".into()));
        state = reduce(state, &Action::BuyOrderMaking);
        assert!(state.exchange.buy_order.making);

        state = reduce(state, &Action::OrderMade(order(3)));
        state = reduce(state, &Action::OrderMade(order(3)));

        assert_eq!(state.exchange.all_orders.data.len(), 1);
        assert_eq!(state.exchange.buy_order, OrderForm::default());
    }

    #[test]
    fn balances_are_routed_to_their_slice() {
        let mut state = AppState::default();
        for action in [
            Action::BalancesLoading,
            Action::EtherBalanceLoaded(units(5)),
            Action::TokenBalanceLoaded(units(6)),
            Action::ExchangeEtherBalanceLoaded(units(7)),
            Action::ExchangeTokenBalanceLoaded(units(8)),
        ] {
            state = reduce(state, &action);
        }
        assert!(state.exchange.balances_loading);
        assert_eq!(state.web3.balance, Some(units(5)));
        assert_eq!(state.token.balance, Some(units(6)));
        assert_eq!(state.exchange.ether_balance, Some(units(7)));
        assert_eq!(state.exchange.token_balance, Some(units(8)));

        state = reduce(state, &Action::BalancesLoaded);
        assert!(!state.exchange.balances_loading);
    }

    #[test]
    fn failed_transaction_clears_pending_flags() {
        let mut state = reduce(AppState::default(), &Action::OrderFilling);
        state = reduce(state, &Action::TransactionFailed("reverted".into()));
        assert!(!state.exchange.order_filling);
        assert_eq!(state.exchange.last_error.as_deref(), Some("reverted"));
    }
}
