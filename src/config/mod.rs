use anyhow::{anyhow, Context, Result};
use clap::Parser;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use url::Url;

pub mod sync;

pub use sync::{RecoveryPolicy, SyncConfig};

/* =======================
CLI ARGS
======================= */

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Account to show balances and personal orders for
    #[arg(short, long)]
    pub account: Option<String>,
}

/* =======================
MAIN CONFIG
======================= */

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub sync: SyncConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub exchange_address: String,
    pub token_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub refresh_interval_ms: u64,
}

/* =======================
DEFAULT CONFIG
======================= */

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                rpc_url: "http://127.0.0.1:7545".to_string(),
                chain_id: 1337,
                exchange_address: "0x0000000000000000000000000000000000000000".to_string(),
                token_address: "0x0000000000000000000000000000000000000000".to_string(),
            },
            sync: SyncConfig::default(),
            display: DisplayConfig {
                refresh_interval_ms: 2_000,
            },
        }
    }
}

/* =======================
LOAD / CREATE CONFIG
======================= */

impl Config {
    pub fn load(path: &PathBuf) -> Result<Self> {
        let mut cfg = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)?
        } else {
            let cfg = Config::default();
            let content = serde_json::to_string_pretty(&cfg)?;
            std::fs::write(path, content)?;
            cfg
        };

        if let Some(policy) = RecoveryPolicy::from_env()? {
            cfg.sync.recovery = policy;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.network.rpc_url)
            .with_context(|| format!("Invalid rpc_url: {}", self.network.rpc_url))?;
        self.exchange_address()?;
        self.token_address()?;

        if self.sync.log_chunk_size == 0 {
            return Err(anyhow!("sync.log_chunk_size must be positive"));
        }
        if self.sync.poll_interval_ms == 0 {
            return Err(anyhow!("sync.poll_interval_ms must be positive"));
        }
        Ok(())
    }

    pub fn exchange_address(&self) -> Result<Address> {
        parse_address("exchange_address", &self.network.exchange_address)
    }

    pub fn token_address(&self) -> Result<Address> {
        parse_address("token_address", &self.network.token_address)
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address> {
    value
        .parse()
        .map_err(|e| anyhow!("Invalid {} '{}': {}", field, value, e))
}

// ==================================================
// ENVIRONMENT HELPERS
// ==================================================

impl Config {
    /// Signing key for transactions; without one the session is read-only.
    pub fn private_key() -> Option<String> {
        env::var("PRIVATE_KEY").ok().filter(|k| !k.trim().is_empty())
    }
}
