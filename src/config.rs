// Configuration for:
// - SQLite database connection string
// - HTTP listening address/port
// - EduPoints contract RPC endpoint, address and admin signing key
// - Balance cache settings (size, TTL)

use dotenv::dotenv;
use std::env;
use std::fmt;
use std::time::Duration;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub rpc_url: String,
    pub contract_address: Option<String>,
    pub admin_private_key: Option<String>,
    pub chain_id: u64,
    pub rpc_timeout_secs: u64,
    pub confirmation_timeout: Duration,
    pub rpc_rate_limit: Option<u32>,
    pub balance_cache_ttl: Duration,
    pub balance_cache_max_capacity: u64,
    pub log_format: String,
    pub cors_origin: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:edupoints.db".to_string());
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);
        let rpc_url = env::var("RPC_URL").unwrap_or_else(|_| "http://localhost:8545".to_string());
        let contract_address = env::var("CONTRACT_ADDRESS").ok().filter(|v| !v.trim().is_empty());
        let admin_private_key = env::var("PRIVATE_KEY").ok().filter(|v| !v.trim().is_empty());
        let chain_id = env::var("CHAIN_ID")
            .map(|v| v.parse().unwrap_or(31337))
            .unwrap_or(31337);
        let rpc_timeout_secs = env::var("RPC_TIMEOUT_SECS")
            .map(|v| v.parse().unwrap_or(30))
            .unwrap_or(30);
        let confirmation_timeout = env::var("CONFIRMATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(120));
        let rpc_rate_limit = env::var("RPC_RATE_LIMIT")
            .map(|v| v.parse().ok())
            .unwrap_or(None);
        let balance_cache_ttl = env::var("BALANCE_CACHE_TTL")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        let balance_cache_max_capacity = env::var("BALANCE_CACHE_MAX_CAPACITY")
            .unwrap_or_else(|_| "10000".to_string())
            .parse()
            .unwrap_or(10_000);
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
        let cors_origin = env::var("CORS_ORIGIN").unwrap_or_else(|_| "*".to_string());

        Self {
            database_url,
            server_host,
            server_port,
            rpc_url,
            contract_address,
            admin_private_key,
            chain_id,
            rpc_timeout_secs,
            confirmation_timeout,
            rpc_rate_limit,
            balance_cache_ttl,
            balance_cache_max_capacity,
            log_format,
            cors_origin,
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

// Hand-written so the admin key never ends up in logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &self.database_url)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("admin_private_key", &self.admin_private_key.as_ref().map(|_| "<redacted>"))
            .field("chain_id", &self.chain_id)
            .field("rpc_timeout_secs", &self.rpc_timeout_secs)
            .field("confirmation_timeout", &self.confirmation_timeout)
            .field("rpc_rate_limit", &self.rpc_rate_limit)
            .field("balance_cache_ttl", &self.balance_cache_ttl)
            .field("balance_cache_max_capacity", &self.balance_cache_max_capacity)
            .field("log_format", &self.log_format)
            .field("cors_origin", &self.cors_origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_private_key() {
        let mut config = Config::from_env();
        config.admin_private_key = Some("0xdeadbeef".to_string());

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("deadbeef"));
        assert!(rendered.contains("<redacted>"));
    }
}
