use anyhow::Result;
use log::{info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use super::fetch_events;
use crate::contract::ExchangeGateway;
use crate::domain::ExchangeEvent;
use crate::store::{Action, Store};

/// Live action for an exchange event.
pub fn live_action(event: ExchangeEvent) -> Action {
    match event {
        ExchangeEvent::Cancel(order) => Action::OrderCancelled(order),
        ExchangeEvent::Trade(trade) => Action::OrderFilled(trade),
        ExchangeEvent::Order(order) => Action::OrderMade(order),
        ExchangeEvent::Deposit { .. } | ExchangeEvent::Withdraw { .. } => Action::BalancesLoaded,
    }
}

/// Handle on the live event poller. `cancel` stops it cleanly; dropping the
/// handle aborts the task.
pub struct Subscription {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
    next_block: Arc<AtomicU64>,
}

impl Subscription {
    /// Last block whose events have been dispatched, `None` before block 0
    /// has been covered.
    pub fn cursor(&self) -> Option<u64> {
        self.next_block.load(Ordering::SeqCst).checked_sub(1)
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    pub async fn cancel(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("⚠️  Event subscription ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Dispatches everything from `next` up to the current head and returns the
/// block to poll from next time. Nothing is dispatched unless the whole range
/// was fetched, so a failed poll is retried from the same place.
async fn poll_once(
    exchange: &dyn ExchangeGateway,
    store: &Store,
    next: u64,
    chunk: u64,
) -> Result<u64> {
    let head = exchange.head_block().await?;
    if head < next {
        return Ok(next);
    }

    let events = fetch_events(exchange, next, head, chunk).await?;
    for logged in events {
        info!("📡 {} in block {}", logged.event.name(), logged.block);
        store.dispatch(live_action(logged.event)).await;
    }
    Ok(head + 1)
}

/// Starts polling for events from `from_block` on. After a backfill that is
/// one past the head it covered.
pub fn subscribe_to_events(
    exchange: Arc<dyn ExchangeGateway>,
    store: Store,
    from_block: u64,
    poll_interval: Duration,
    chunk: u64,
) -> Subscription {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let next_block = Arc::new(AtomicU64::new(from_block));
    let shared = next_block.clone();
    let poll_interval = poll_interval.max(Duration::from_millis(1));

    let handle = tokio::spawn(async move {
        info!("🎬 Subscribed to exchange events from block {}", from_block);

        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    info!("🔌 Event subscription cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let from = shared.load(Ordering::SeqCst);
                    match poll_once(exchange.as_ref(), &store, from, chunk).await {
                        Ok(next) => shared.store(next, Ordering::SeqCst),
                        Err(e) => warn!("⚠️  Event poll failed: {} - retrying next tick", e),
                    }
                }
            }
        }
    });

    Subscription {
        stop: Some(stop_tx),
        handle: Some(handle),
        next_block,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Order;
    use ethers::types::{Address, U256};

    #[test]
    fn deposits_and_withdrawals_refresh_balances() {
        let deposit = ExchangeEvent::Deposit {
            token: Address::zero(),
            user: Address::from_low_u64_be(1),
            amount: U256::one(),
            balance: U256::one(),
        };
        assert_eq!(live_action(deposit), Action::BalancesLoaded);
    }

    #[test]
    fn order_events_map_to_lifecycle_actions() {
        let order = Order {
            id: U256::one(),
            user: Address::from_low_u64_be(1),
            token_get: Address::zero(),
            amount_get: U256::one(),
            token_give: Address::zero(),
            amount_give: U256::one(),
            timestamp: 1,
        };
        assert_eq!(
            live_action(ExchangeEvent::Order(order.clone())),
            Action::OrderMade(order.clone())
        );
        assert_eq!(
            live_action(ExchangeEvent::Cancel(order.clone())),
            Action::OrderCancelled(order)
        );
    }

    #[tokio::test]
    async fn zero_interval_still_polls_from_the_first_block() {
        use crate::domain::NewOrder;
        use crate::sim::LocalChain;
        use tokio::time::{sleep, timeout};

        let chain = LocalChain::new(Address::from_low_u64_be(0xe0), Address::zero(), U256::zero());
        let exchange = Arc::new(chain.exchange().await);
        let terms = NewOrder {
            token_get: Address::from_low_u64_be(0x70),
            amount_get: U256::one(),
            token_give: Address::zero(),
            amount_give: U256::one(),
        };
        exchange.make_order(Address::from_low_u64_be(1), terms).await.unwrap();

        let store = Store::new();
        let sub = subscribe_to_events(exchange, store.clone(), 0, Duration::ZERO, 10);
        assert_eq!(sub.cursor(), None);

        let delivered = timeout(Duration::from_secs(2), async {
            while sub.cursor() != Some(1) {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(delivered.is_ok());
        assert!(sub.is_active());
        assert_eq!(store.state().await.exchange.all_orders.data.len(), 1);

        sub.cancel().await;
    }
}
