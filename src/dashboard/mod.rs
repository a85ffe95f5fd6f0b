use anyhow::Result;
use ethers::types::Address;
use log::{error, info, warn};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

use crate::config::{RecoveryPolicy, SyncConfig};
use crate::contract::{ExchangeGateway, TokenGateway};
use crate::interactions::{load_all_orders, load_balances, subscribe_to_events, Subscription};
use crate::logging::log_retry;
use crate::store::{Action, Store};

pub mod view;

pub use view::DashboardView;

/// Top-level container. Mounting runs the historical backfill to completion
/// and only then starts the live subscription; unmounting stops it.
pub struct Dashboard {
    exchange: Arc<dyn ExchangeGateway>,
    token: Arc<dyn TokenGateway>,
    store: Store,
    sync: SyncConfig,
    subscription: Option<Subscription>,
    mounted: bool,
}

impl Dashboard {
    pub fn new(
        exchange: Arc<dyn ExchangeGateway>,
        token: Arc<dyn TokenGateway>,
        store: Store,
        sync: SyncConfig,
    ) -> Self {
        Self {
            exchange,
            token,
            store,
            sync,
            subscription: None,
            mounted: false,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn exchange(&self) -> &dyn ExchangeGateway {
        self.exchange.as_ref()
    }

    pub fn token(&self) -> &dyn TokenGateway {
        self.token.as_ref()
    }

    /// True while the live subscription is running.
    pub fn is_live(&self) -> bool {
        self.subscription
            .as_ref()
            .map(Subscription::is_active)
            .unwrap_or(false)
    }

    pub fn subscription_cursor(&self) -> Option<u64> {
        self.subscription.as_ref().and_then(Subscription::cursor)
    }

    // ==================================================
    // LIFECYCLE
    // ==================================================

    /// Backfills, then subscribes. A mount that returns an error leaves the
    /// dashboard unmounted, so it can be mounted again.
    pub async fn mount(&mut self) -> Result<()> {
        if self.mounted {
            warn!("⚠️  Dashboard already mounted");
            return Ok(());
        }

        self.store
            .dispatch(Action::ExchangeLoaded(self.exchange.address()))
            .await;
        self.store
            .dispatch(Action::TokenLoaded(self.token.address()))
            .await;

        let from_block = match self.backfill().await {
            Ok(head) => head + 1,
            Err(e) if self.sync.recovery == RecoveryPolicy::Ignore => {
                warn!("⚠️  Order history unavailable ({}), going live anyway", e);
                match self.exchange.head_block().await {
                    Ok(head) => head + 1,
                    // Head unknown too: replay from the first block.
                    Err(_) => self.sync.start_block,
                }
            }
            Err(e) => {
                error!("❌ Order history failed to load: {}", e);
                return Err(e);
            }
        };

        self.subscription = Some(subscribe_to_events(
            self.exchange.clone(),
            self.store.clone(),
            from_block,
            Duration::from_millis(self.sync.poll_interval_ms),
            self.sync.log_chunk_size,
        ));
        self.mounted = true;

        info!("✅ Dashboard mounted, live from block {}", from_block);
        Ok(())
    }

    /// Runs the backfill under the configured recovery policy. The failure
    /// is dispatched before it is returned.
    async fn backfill(&self) -> Result<u64> {
        let (retries, backoff) = match &self.sync.recovery {
            RecoveryPolicy::Retry {
                attempts,
                backoff_ms,
            } => (*attempts, Duration::from_millis(*backoff_ms)),
            RecoveryPolicy::Fail | RecoveryPolicy::Ignore => (0, Duration::ZERO),
        };

        let mut attempt = 0;
        loop {
            match load_all_orders(self.exchange.as_ref(), &self.store, &self.sync).await {
                Ok(head) => return Ok(head),
                Err(e) if attempt < retries => {
                    attempt += 1;
                    log_retry(attempt, &e.to_string());
                    sleep(backoff).await;
                }
                Err(e) => {
                    self.store
                        .dispatch(Action::OrdersLoadFailed(e.to_string()))
                        .await;
                    return Err(e);
                }
            }
        }
    }

    pub async fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel().await;
        }
        self.mounted = false;
        info!("👋 Dashboard unmounted");
    }

    // ==================================================
    // ACCOUNT
    // ==================================================

    pub async fn connect_account(&self, account: Address) -> Result<()> {
        self.store.dispatch(Action::Web3AccountLoaded(account)).await;
        self.refresh_balances(account).await
    }

    pub async fn refresh_balances(&self, account: Address) -> Result<()> {
        load_balances(self.exchange.as_ref(), self.token.as_ref(), account, &self.store).await
    }

    pub async fn view(&self) -> DashboardView {
        DashboardView::build(&self.store.state().await)
    }
}
