//! Runs the fee scenario against the in-process chain: user1 offers 1 ether
//! for 1 SIG, user2 fills it at a 10% fee, and the dashboard follows along.

use anyhow::Result;
use ethers::types::{Address, U256};
use log::info;
use sigma_dex::config::{RecoveryPolicy, SyncConfig};
use sigma_dex::contract::{ExchangeGateway, TokenGateway};
use sigma_dex::dashboard::Dashboard;
use sigma_dex::domain::time::now_ts;
use sigma_dex::helpers::{ether, tokens, units, ETHER_ADDRESS};
use sigma_dex::interactions::{self, OrderInput};
use sigma_dex::logging;
use sigma_dex::sim::LocalChain;
use sigma_dex::store::{Action, Store};
use rust_decimal_macros::dec;
use std::sync::Arc;
use tokio::time::{sleep, Duration};

const POLL_MS: u64 = 100;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let deployer = Address::from_low_u64_be(0xd0);
    let fee_account = Address::from_low_u64_be(0xfe);
    let user1 = Address::from_low_u64_be(0x01);
    let user2 = Address::from_low_u64_be(0x02);

    let chain = LocalChain::new(Address::from_low_u64_be(0xe0), fee_account, U256::from(10));
    chain.set_time(now_ts()).await;
    let token = Arc::new(chain.deploy_token(Address::from_low_u64_be(0x70), deployer).await);
    let exchange = Arc::new(chain.exchange().await);

    chain.fund(user1, units(10)).await;
    chain.fund(user2, units(10)).await;
    token.transfer(deployer, user2, units(100)).await?;

    // ===============================
    // HISTORY BEFORE MOUNT
    // ===============================
    let setup = Store::new();
    interactions::deposit_ether(exchange.as_ref(), &setup, user1, units(1)).await?;
    interactions::make_buy_order(
        exchange.as_ref(),
        token.address(),
        &setup,
        user1,
        OrderInput {
            amount: dec!(1),
            price: dec!(1),
        },
    )
    .await?;

    // ===============================
    // DASHBOARD
    // ===============================
    let store = Store::new();
    store.dispatch(Action::Web3Loaded { chain_id: 1337 }).await;

    let sync = SyncConfig {
        poll_interval_ms: POLL_MS,
        recovery: RecoveryPolicy::Fail,
        ..SyncConfig::default()
    };
    let mut dashboard = Dashboard::new(exchange.clone(), token.clone(), store.clone(), sync);
    dashboard.mount().await?;
    dashboard.connect_account(user2).await?;

    println!("{}", dashboard.view().await);

    // ===============================
    // LIVE: user2 deposits and fills
    // ===============================
    interactions::deposit_token(exchange.as_ref(), token.as_ref(), &store, user2, units(2)).await?;

    let order = exchange
        .order(U256::one())
        .await?
        .ok_or_else(|| anyhow::anyhow!("order 1 missing"))?;
    interactions::fill_order(exchange.as_ref(), &store, user2, &order).await?;

    sleep(Duration::from_millis(POLL_MS * 3)).await;
    dashboard.refresh_balances(user2).await?;
    println!("{}", dashboard.view().await);

    // ===============================
    // POST-STATE
    // ===============================
    let sig = token.address();
    for (name, who) in [("user1", user1), ("user2", user2), ("fee", fee_account)] {
        info!(
            "📊 {:<5} SIG {:>4}  ETH {:>4}",
            name,
            tokens(Some(exchange.balance_of(sig, who).await?)).unwrap_or_default(),
            ether(Some(exchange.balance_of(ETHER_ADDRESS, who).await?)).unwrap_or_default()
        );
    }

    dashboard.unmount().await;
    Ok(())
}
