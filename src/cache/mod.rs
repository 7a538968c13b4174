pub mod balance;

pub use balance::BalanceCache;

use crate::config::Config;

pub fn init_cache(config: &Config) -> BalanceCache {
    BalanceCache::new(config.balance_cache_max_capacity, config.balance_cache_ttl)
}
