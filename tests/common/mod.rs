#![allow(dead_code)]

use ethers::types::{Address, U256};
use sigma_dex::contract::TokenGateway;
use sigma_dex::helpers::units;
use sigma_dex::sim::{LocalChain, LocalExchange, LocalToken};
use sigma_dex::store::AppState;
use sigma_dex::store::Store;
use std::sync::Arc;
use tokio::time::{sleep, timeout, Duration};

pub const NOW: u64 = 1_700_000_000;
pub const FEE_PERCENT: u64 = 10;

pub struct Fixture {
    pub chain: LocalChain,
    pub exchange: Arc<LocalExchange>,
    pub token: Arc<LocalToken>,
    pub deployer: Address,
    pub fee_account: Address,
    pub user1: Address,
    pub user2: Address,
}

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

/// Token deployed by `deployer`, 100 SIG and 100 ether in each user wallet,
/// block time pinned to `NOW`.
pub async fn setup() -> Fixture {
    let deployer = addr(0xd0);
    let fee_account = addr(0xfe);
    let user1 = addr(0x01);
    let user2 = addr(0x02);

    let chain = LocalChain::new(addr(0xe0), fee_account, U256::from(FEE_PERCENT));
    chain.set_time(NOW).await;
    let token = Arc::new(chain.deploy_token(addr(0x70), deployer).await);
    let exchange = Arc::new(chain.exchange().await);

    for user in [user1, user2] {
        chain.fund(user, units(100)).await;
        token
            .transfer(deployer, user, units(100))
            .await
            .expect("seed transfer");
    }

    Fixture {
        chain,
        exchange,
        token,
        deployer,
        fee_account,
        user1,
        user2,
    }
}

/// Polls the store until `check` holds, for at most two seconds.
pub async fn wait_for(store: &Store, check: impl Fn(&AppState) -> bool) -> bool {
    timeout(Duration::from_secs(2), async {
        loop {
            if check(&store.state().await) {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}
