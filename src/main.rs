use anyhow::{anyhow, Result};
use clap::Parser;
use ethers::prelude::{Address, Http, LocalWallet, Middleware, Provider, Signer, SignerMiddleware};
use log::{info, warn};
use sigma_dex::config::{Args, Config};
use sigma_dex::contract::{EthersExchange, EthersToken, ExchangeGateway, TokenGateway};
use sigma_dex::dashboard::Dashboard;
use sigma_dex::logging;
use sigma_dex::store::{Action, Store};
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

type Gateways = (Arc<dyn ExchangeGateway>, Arc<dyn TokenGateway>);

fn gateways<M: Middleware + 'static>(client: Arc<M>, config: &Config) -> Result<Gateways> {
    Ok((
        Arc::new(EthersExchange::new(config.exchange_address()?, client.clone())),
        Arc::new(EthersToken::new(config.token_address()?, client)),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    info!("🚀 Starting Sigma DEX dashboard");

    let args = Args::parse();
    let config = Config::load(&args.config)?;

    // ===============================
    // PROVIDER
    // ===============================
    let provider = Provider::<Http>::try_from(config.network.rpc_url.as_str())?;
    let chain_id = provider.get_chainid().await?.as_u64();
    if chain_id != config.network.chain_id {
        warn!(
            "⚠️  Node reports chain {} but config expects {}",
            chain_id, config.network.chain_id
        );
    }

    // ===============================
    // WALLET (optional)
    // ===============================
    let (account, (exchange, token)) = match Config::private_key() {
        Some(key) => {
            let wallet: LocalWallet = key.parse()?;
            let wallet = wallet.with_chain_id(chain_id);
            let address = wallet.address();
            info!("🔑 Signer loaded: {:?}", address);
            let client = Arc::new(SignerMiddleware::new(provider, wallet));
            (Some(address), gateways(client, &config)?)
        }
        None => {
            info!("👀 No PRIVATE_KEY set, running read-only");
            let account = args
                .account
                .as_deref()
                .map(|a| a.parse::<Address>())
                .transpose()
                .map_err(|e| anyhow!("Invalid --account: {}", e))?;
            (account, gateways(Arc::new(provider), &config)?)
        }
    };

    let store = Store::new();
    store.dispatch(Action::Web3Loaded { chain_id }).await;

    let mut dashboard = Dashboard::new(exchange, token, store, config.sync.clone());
    dashboard.mount().await?;

    if let Some(account) = account {
        dashboard.connect_account(account).await?;
    }

    // ===============================
    // RENDER LOOP
    // ===============================
    // Redraw whenever the store changes; the ticker only refreshes balances,
    // which lands back here through the store.
    let mut changes = dashboard.store().changes();
    let mut ticker = interval(Duration::from_millis(config.display.refresh_interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    println!("{}", dashboard.view().await);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("🛑 Ctrl-C received");
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                println!("{}", dashboard.view().await);
            }
            _ = ticker.tick() => {
                if let Some(account) = account {
                    if let Err(e) = dashboard.refresh_balances(account).await {
                        warn!("⚠️  Balance refresh failed: {}", e);
                    }
                }
            }
        }
    }

    dashboard.unmount().await;
    Ok(())
}
