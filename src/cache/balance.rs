//! On-chain EduPoints balance cache

use moka::future::Cache;
use std::time::Duration;
use tracing::debug;

/// `balanceOf` results keyed by lowercase wallet address.
#[derive(Clone)]
pub struct BalanceCache {
    cache: Cache<String, String>,
}

impl BalanceCache {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    pub async fn get(&self, wallet_address: &str) -> Option<String> {
        let key = wallet_address.to_lowercase();
        let result = self.cache.get(&key).await;
        if result.is_some() {
            debug!("Balance cache hit for {}", key);
        } else {
            debug!("Balance cache miss for {}", key);
        }
        result
    }

    pub async fn insert(&self, wallet_address: &str, balance: String) {
        self.cache.insert(wallet_address.to_lowercase(), balance).await;
    }

    /// Called after points land in the wallet.
    pub async fn invalidate(&self, wallet_address: &str) {
        let key = wallet_address.to_lowercase();
        self.cache.invalidate(&key).await;
        debug!("Invalidated cached balance for {}", key);
    }
}
