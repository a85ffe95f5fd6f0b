use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::env;

/// What the dashboard does when the historical order backfill fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "UPPERCASE")]
pub enum RecoveryPolicy {
    /// Surface the error and stay unsubscribed.
    Fail,
    /// Retry with a fixed backoff, then behave like `Fail`.
    Retry { attempts: u32, backoff_ms: u64 },
    /// Record the error and go live from the current head anyway.
    Ignore,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        RecoveryPolicy::Retry {
            attempts: 3,
            backoff_ms: 2_000,
        }
    }
}

impl RecoveryPolicy {
    /// `LOAD_RECOVERY` = FAIL | RETRY | IGNORE, with `LOAD_RETRY_ATTEMPTS` and
    /// `LOAD_RETRY_BACKOFF_MS` for RETRY. `None` when the variable is unset.
    pub fn from_env() -> Result<Option<Self>> {
        let mode = match env::var("LOAD_RECOVERY") {
            Ok(mode) => mode.to_uppercase(),
            Err(_) => return Ok(None),
        };

        let policy = match mode.as_str() {
            "FAIL" => RecoveryPolicy::Fail,
            "IGNORE" => RecoveryPolicy::Ignore,
            "RETRY" => RecoveryPolicy::Retry {
                attempts: env::var("LOAD_RETRY_ATTEMPTS")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()
                    .map_err(|e| anyhow!("Invalid LOAD_RETRY_ATTEMPTS: {}", e))?,
                backoff_ms: env::var("LOAD_RETRY_BACKOFF_MS")
                    .unwrap_or_else(|_| "2000".to_string())
                    .parse()
                    .map_err(|e| anyhow!("Invalid LOAD_RETRY_BACKOFF_MS: {}", e))?,
            },
            other => return Err(anyhow!("Unknown LOAD_RECOVERY mode: {}", other)),
        };

        Ok(Some(policy))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// First block scanned by the backfill (the exchange deployment block).
    pub start_block: u64,
    /// Upper bound on blocks per `eth_getLogs` request.
    pub log_chunk_size: u64,
    pub poll_interval_ms: u64,
    pub recovery: RecoveryPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            start_block: 0,
            log_chunk_size: 5_000,
            poll_interval_ms: 1_000,
            recovery: RecoveryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_is_tagged_by_mode() {
        let retry: RecoveryPolicy =
            serde_json::from_str(r#"{"mode":"RETRY","attempts":2,"backoff_ms":10}"#).unwrap();
        assert_eq!(
            retry,
            RecoveryPolicy::Retry {
                attempts: 2,
                backoff_ms: 10
            }
        );

        let ignore: RecoveryPolicy = serde_json::from_str(r#"{"mode":"IGNORE"}"#).unwrap();
        assert_eq!(ignore, RecoveryPolicy::Ignore);
    }
}
