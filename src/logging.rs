use env_logger::Env;
use log::{error, info, warn};

/// `RUST_LOG` wins; otherwise everything at info and above.
pub fn init() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
}

pub fn log_rejection(what: &str, reason: &str) {
    error!("❌ {} rejected: {}", what, reason);
}

pub fn log_retry(attempt: u32, reason: &str) {
    warn!("🔁 Retry {} - {}", attempt, reason);
}

pub fn log_success(msg: &str) {
    info!("✅ {}", msg);
}
