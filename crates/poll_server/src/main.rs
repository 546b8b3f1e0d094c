//! Entry point for the reward-flight availability watcher. Loads the
//! configuration, imports proxy lists, and runs the poll loop until the
//! process is stopped.

mod config;
mod executor;

use std::path::PathBuf;
use std::sync::Arc;

use flight_scan::NotificationDebouncer;
use proxy_pool::ProxyPool;
use reward_api::RewardApiClient;
use webhook_notify::WebhookNotifier;

use crate::config::Config;
use crate::executor::PollExecutor;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting reward flight watcher...");

    let config_path = std::env::var("FLIGHT_WATCH_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));

    let config = match Config::load(&config_path) {
        Ok(config) => {
            log::info!("⚙️ Loaded configuration from {}", config_path.display());
            config
        }
        Err(e) => {
            log::error!("❌ Failed to load configuration: {}", e);
            log::error!(
                "💡 Set FLIGHT_WATCH_CONFIG or place config.json in the working directory"
            );
            std::process::exit(1);
        }
    };

    let proxy_pool = Arc::new(ProxyPool::new());
    if let Err(e) = proxy_pool.import_dir(&config.proxy_dir).await {
        log::error!(
            "❌ Failed to import proxies from {}: {}",
            config.proxy_dir.display(),
            e
        );
        std::process::exit(1);
    }

    let fetcher = Arc::new(RewardApiClient::new(None));
    let notifier = Arc::new(WebhookNotifier::new(config.webhook_url.clone()));
    let debouncer = Arc::new(NotificationDebouncer::new());

    log::info!(
        "✈️ Monitoring {} route(s), checking every {}s",
        config.active_routes().len(),
        config.cooldown_time / 1000
    );

    let executor = PollExecutor::new(config, proxy_pool, fetcher, notifier, debouncer);
    executor.start().await;
}
