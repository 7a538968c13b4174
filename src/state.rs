use crate::blockchain::TokenClient;
use crate::cache::{self, BalanceCache};
use crate::config::Config;
use sqlx::SqlitePool;
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub db_pool: SqlitePool,
    pub token_client: Arc<dyn TokenClient>,
    pub balances: BalanceCache,
}

impl AppState {
    pub fn new(config: Config, db_pool: SqlitePool, token_client: Arc<dyn TokenClient>) -> Self {
        let balances = cache::init_cache(&config);
        Self {
            config,
            db_pool,
            token_client,
            balances,
        }
    }
}
