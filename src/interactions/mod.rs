use anyhow::{anyhow, Result};
use ethers::types::{Address, U256};
use log::info;
use rust_decimal::Decimal;

use crate::config::SyncConfig;
use crate::contract::{ExchangeGateway, TokenGateway, TxError, TxResult};
use crate::domain::{ExchangeEvent, LoggedEvent, NewOrder, Order, Receipt};
use crate::helpers::{parse_amount, to_wei, ETHER_ADDRESS};
use crate::logging::{log_rejection, log_success};
use crate::store::reducer::OrderForm;
use crate::store::{Action, AppState, Store};

pub mod subscription;

pub use subscription::{subscribe_to_events, Subscription};

// ==================================================
// HISTORICAL BACKFILL
// ==================================================

/// Events in `from..=to`, fetched in windows of at most `chunk` blocks.
pub(crate) async fn fetch_events(
    exchange: &dyn ExchangeGateway,
    from: u64,
    to: u64,
    chunk: u64,
) -> Result<Vec<LoggedEvent>> {
    let mut out = Vec::new();
    if from > to {
        return Ok(out);
    }

    let chunk = chunk.max(1);
    let mut start = from;
    loop {
        let end = start.saturating_add(chunk - 1).min(to);
        out.extend(exchange.events(start, end).await?);
        if end >= to {
            break;
        }
        start = end + 1;
    }
    Ok(out)
}

/// Loads cancelled, filled and made orders up to the current head and
/// dispatches one loaded-action per collection. Returns the head block the
/// backfill covered, which is where live polling must resume.
pub async fn load_all_orders(
    exchange: &dyn ExchangeGateway,
    store: &Store,
    sync: &SyncConfig,
) -> Result<u64> {
    let head = exchange.head_block().await?;
    let events = fetch_events(exchange, sync.start_block, head, sync.log_chunk_size).await?;

    let mut cancelled = Vec::new();
    let mut filled = Vec::new();
    let mut all = Vec::new();

    for logged in events {
        match logged.event {
            ExchangeEvent::Cancel(order) => cancelled.push(order),
            ExchangeEvent::Trade(trade) => filled.push(trade),
            ExchangeEvent::Order(order) => all.push(order),
            ExchangeEvent::Deposit { .. } | ExchangeEvent::Withdraw { .. } => {}
        }
    }

    info!(
        "📚 Backfilled blocks {}..={}: {} orders, {} filled, {} cancelled",
        sync.start_block,
        head,
        all.len(),
        filled.len(),
        cancelled.len()
    );

    store.dispatch(Action::CancelledOrdersLoaded(cancelled)).await;
    store.dispatch(Action::FilledOrdersLoaded(filled)).await;
    store.dispatch(Action::AllOrdersLoaded(all)).await;

    Ok(head)
}

// ==================================================
// BALANCES
// ==================================================

pub async fn load_balances(
    exchange: &dyn ExchangeGateway,
    token: &dyn TokenGateway,
    account: Address,
    store: &Store,
) -> Result<()> {
    let (wallet_ether, wallet_token, exchange_ether, exchange_token) = futures_util::try_join!(
        exchange.native_balance(account),
        token.balance_of(account),
        exchange.balance_of(ETHER_ADDRESS, account),
        exchange.balance_of(token.address(), account),
    )?;

    store.dispatch(Action::EtherBalanceLoaded(wallet_ether)).await;
    store.dispatch(Action::TokenBalanceLoaded(wallet_token)).await;
    store.dispatch(Action::ExchangeEtherBalanceLoaded(exchange_ether)).await;
    store.dispatch(Action::ExchangeTokenBalanceLoaded(exchange_token)).await;
    store.dispatch(Action::BalancesLoaded).await;
    Ok(())
}

// ==================================================
// TRANSACTIONS
// ==================================================

/// Logs the outcome and records failures in the store so the view can show
/// them.
async fn settle<E>(store: &Store, what: &str, result: TxResult<E>) -> Result<Receipt<E>> {
    match result {
        Ok(receipt) => {
            log_success(&format!("{} mined in block {}", what, receipt.block));
            Ok(receipt)
        }
        Err(e) => {
            log_rejection(what, &e.to_string());
            store
                .dispatch(Action::TransactionFailed(format!("{}: {}", what, e)))
                .await;
            Err(e.into())
        }
    }
}

pub async fn deposit_ether(
    exchange: &dyn ExchangeGateway,
    store: &Store,
    account: Address,
    amount: U256,
) -> Result<Receipt<ExchangeEvent>> {
    store.dispatch(Action::BalancesLoading).await;
    let result = exchange.deposit_ether(account, amount).await;
    settle(store, "Ether deposit", result).await
}

pub async fn withdraw_ether(
    exchange: &dyn ExchangeGateway,
    store: &Store,
    account: Address,
    amount: U256,
) -> Result<Receipt<ExchangeEvent>> {
    store.dispatch(Action::BalancesLoading).await;
    let result = exchange.withdraw_ether(account, amount).await;
    settle(store, "Ether withdrawal", result).await
}

/// Approves the exchange for `amount`, then deposits it.
pub async fn deposit_token(
    exchange: &dyn ExchangeGateway,
    token: &dyn TokenGateway,
    store: &Store,
    account: Address,
    amount: U256,
) -> Result<Receipt<ExchangeEvent>> {
    store.dispatch(Action::BalancesLoading).await;

    let approval = token.approve(account, exchange.address(), amount).await;
    settle(store, "Token approval", approval).await?;

    let result = exchange.deposit_token(account, token.address(), amount).await;
    settle(store, "Token deposit", result).await
}

pub async fn withdraw_token(
    exchange: &dyn ExchangeGateway,
    token: &dyn TokenGateway,
    store: &Store,
    account: Address,
    amount: U256,
) -> Result<Receipt<ExchangeEvent>> {
    store.dispatch(Action::BalancesLoading).await;
    let result = exchange.withdraw_token(account, token.address(), amount).await;
    settle(store, "Token withdrawal", result).await
}

pub async fn fill_order(
    exchange: &dyn ExchangeGateway,
    store: &Store,
    account: Address,
    order: &Order,
) -> Result<Receipt<ExchangeEvent>> {
    store.dispatch(Action::OrderFilling).await;
    let result = exchange.fill_order(account, order.id).await;
    settle(store, &format!("Fill of order {}", order.id), result).await
}

pub async fn cancel_order(
    exchange: &dyn ExchangeGateway,
    store: &Store,
    account: Address,
    order: &Order,
) -> Result<Receipt<ExchangeEvent>> {
    store.dispatch(Action::OrderCancelling).await;
    let result = exchange.cancel_order(account, order.id).await;
    settle(store, &format!("Cancel of order {}", order.id), result).await
}

// ==================================================
// BALANCE FORMS
// ==================================================

/// The deposit and withdraw forms of the balance panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundsForm {
    EtherDeposit,
    EtherWithdraw,
    TokenDeposit,
    TokenWithdraw,
}

impl FundsForm {
    fn label(&self) -> &'static str {
        match self {
            FundsForm::EtherDeposit => "Ether deposit",
            FundsForm::EtherWithdraw => "Ether withdrawal",
            FundsForm::TokenDeposit => "Token deposit",
            FundsForm::TokenWithdraw => "Token withdrawal",
        }
    }

    /// The amount typed into this form, in base units.
    pub fn amount(&self, state: &AppState) -> Result<U256> {
        let field = match self {
            FundsForm::EtherDeposit => &state.exchange.ether_deposit_amount,
            FundsForm::EtherWithdraw => &state.exchange.ether_withdraw_amount,
            FundsForm::TokenDeposit => &state.exchange.token_deposit_amount,
            FundsForm::TokenWithdraw => &state.exchange.token_withdraw_amount,
        };
        let raw = field
            .as_deref()
            .ok_or_else(|| anyhow!("{} amount is empty", self.label()))?;
        let amount = parse_amount(raw)?;
        if amount.is_zero() {
            return Err(anyhow!("{} amount must be positive", self.label()));
        }
        Ok(amount)
    }
}

/// Submits the amount currently held by `form`.
pub async fn submit_funds(
    exchange: &dyn ExchangeGateway,
    token: &dyn TokenGateway,
    store: &Store,
    account: Address,
    form: FundsForm,
) -> Result<Receipt<ExchangeEvent>> {
    let amount = form.amount(&store.state().await)?;
    match form {
        FundsForm::EtherDeposit => deposit_ether(exchange, store, account, amount).await,
        FundsForm::EtherWithdraw => withdraw_ether(exchange, store, account, amount).await,
        FundsForm::TokenDeposit => deposit_token(exchange, token, store, account, amount).await,
        FundsForm::TokenWithdraw => withdraw_token(exchange, token, store, account, amount).await,
    }
}

// ==================================================
// ORDER ENTRY
// ==================================================

/// Token amount and ether-per-token price from the order entry form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderInput {
    pub amount: Decimal,
    pub price: Decimal,
}

impl OrderInput {
    pub fn from_form(form: &OrderForm) -> Result<Self> {
        let parse = |field: &str, value: &Option<String>| -> Result<Decimal> {
            let raw = value
                .as_deref()
                .ok_or_else(|| anyhow!("Order {} is empty", field))?;
            let parsed: Decimal = raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid order {} '{}': {}", field, raw, e))?;
            if parsed <= Decimal::ZERO {
                return Err(anyhow!("Order {} must be positive", field));
            }
            Ok(parsed)
        };

        Ok(Self {
            amount: parse("amount", &form.amount)?,
            price: parse("price", &form.price)?,
        })
    }

    fn ether_total(&self) -> Result<Decimal> {
        self.amount
            .checked_mul(self.price)
            .ok_or_else(|| anyhow!("Order total overflows"))
    }

    /// Buying tokens: get `amount` tokens, give `amount * price` ether.
    pub fn buy_terms(&self, token: Address) -> Result<NewOrder> {
        Ok(NewOrder {
            token_get: token,
            amount_get: to_wei(self.amount)?,
            token_give: ETHER_ADDRESS,
            amount_give: to_wei(self.ether_total()?)?,
        })
    }

    /// Selling tokens: get `amount * price` ether, give `amount` tokens.
    pub fn sell_terms(&self, token: Address) -> Result<NewOrder> {
        Ok(NewOrder {
            token_get: ETHER_ADDRESS,
            amount_get: to_wei(self.ether_total()?)?,
            token_give: token,
            amount_give: to_wei(self.amount)?,
        })
    }
}

pub async fn make_buy_order(
    exchange: &dyn ExchangeGateway,
    token: Address,
    store: &Store,
    account: Address,
    input: OrderInput,
) -> Result<Receipt<ExchangeEvent>> {
    let terms = input.buy_terms(token)?;
    store.dispatch(Action::BuyOrderMaking).await;
    let result = exchange.make_order(account, terms).await;
    settle(store, "Buy order", result).await
}

pub async fn make_sell_order(
    exchange: &dyn ExchangeGateway,
    token: Address,
    store: &Store,
    account: Address,
    input: OrderInput,
) -> Result<Receipt<ExchangeEvent>> {
    let terms = input.sell_terms(token)?;
    store.dispatch(Action::SellOrderMaking).await;
    let result = exchange.make_order(account, terms).await;
    settle(store, "Sell order", result).await
}

/// True when `err` is a transaction revert rather than a transport or input
/// problem.
pub fn is_revert(err: &anyhow::Error) -> bool {
    err.downcast_ref::<TxError>()
        .map(TxError::is_revert)
        .unwrap_or(false)
}
