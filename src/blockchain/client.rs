use crate::blockchain::models::{AchievementType, ChainReceipt, StudentRegistration, StudentSummary};
use crate::config::Config;
use async_trait::async_trait;
use ethers::contract::abigen;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TransactionReceipt, U64};
use ethers::utils::{format_ether, parse_ether};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

abigen!(
    EduPointsToken,
    r#"[
        function awardPoints(address student, uint256 amount, string achievementName, uint8 achievementType) external
        function balanceOf(address account) external view returns (uint256)
        function getStudentSummary(address student) external view returns (bool, uint256, uint256, uint256, uint256, uint256)
        function registerStudent(string name, string email, string studentId, string department, address wallet) external
        function isEmailRegistered(string email) external view returns (bool)
        function isStudentIdRegistered(string studentId) external view returns (bool)
    ]"#
);

type AdminMiddleware = SignerMiddleware<Provider<Http>, LocalWallet>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("EduPoints contract address is not configured")]
    NotConfigured,

    #[error("Admin signing key is not configured")]
    SignerUnavailable,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid points amount: {0}")]
    InvalidAmount(String),

    #[error("RPC provider error: {0}")]
    Provider(String),

    #[error("Contract call failed: {0}")]
    Contract(String),

    #[error("Transaction {0} reverted on-chain")]
    Reverted(String),

    #[error("Transaction {0} was dropped before confirmation")]
    Dropped(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),
}

/// The EduPoints contract operations this service consumes. Every
/// state-changing call resolves only after the transaction is confirmed.
#[async_trait]
pub trait TokenClient: Send + Sync {
    async fn award_points(
        &self,
        wallet_address: &str,
        points: &str,
        description: &str,
        achievement_type: AchievementType,
    ) -> Result<ChainReceipt, ClientError>;

    async fn balance_of(&self, wallet_address: &str) -> Result<String, ClientError>;

    async fn get_student_summary(&self, wallet_address: &str) -> Result<StudentSummary, ClientError>;

    async fn register_student(&self, registration: &StudentRegistration) -> Result<ChainReceipt, ClientError>;

    async fn is_email_registered(&self, email: &str) -> Result<bool, ClientError>;

    async fn is_student_id_registered(&self, student_id: &str) -> Result<bool, ClientError>;
}

/// JSON-RPC client for the deployed EduPointsToken contract.
pub struct EduPointsClient {
    provider: Arc<Provider<Http>>,
    signer: Option<Arc<AdminMiddleware>>,
    contract_address: Option<Address>,
    rpc_timeout: Duration,
    confirmation_timeout: Duration,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl EduPointsClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| ClientError::Provider(e.to_string()))?
            .interval(Duration::from_secs(1));
        let provider = Arc::new(provider);

        let contract_address = match &config.contract_address {
            Some(raw) => Some(
                raw.parse::<Address>()
                    .map_err(|_| ClientError::InvalidAddress(raw.clone()))?,
            ),
            None => None,
        };

        let signer = match &config.admin_private_key {
            Some(key) => {
                let wallet = key
                    .parse::<LocalWallet>()
                    .map_err(|e| ClientError::Provider(format!("invalid admin key: {}", e)))?
                    .with_chain_id(config.chain_id);
                info!("EduPoints admin signer loaded: {:?}", wallet.address());
                Some(Arc::new(SignerMiddleware::new((*provider).clone(), wallet)))
            }
            None => None,
        };

        let limiter = config
            .rpc_rate_limit
            .and_then(NonZeroU32::new)
            .map(|per_second| RateLimiter::direct(Quota::per_second(per_second)));

        info!(
            "Initializing EduPoints client with RPC endpoint: {}, contract: {:?}",
            config.rpc_url, contract_address
        );

        Ok(Self {
            provider,
            signer,
            contract_address,
            rpc_timeout: Duration::from_secs(config.rpc_timeout_secs),
            confirmation_timeout: config.confirmation_timeout,
            limiter,
        })
    }

    fn reader(&self) -> Result<EduPointsToken<Provider<Http>>, ClientError> {
        let address = self.contract_address.ok_or(ClientError::NotConfigured)?;
        Ok(EduPointsToken::new(address, self.provider.clone()))
    }

    fn writer(&self) -> Result<EduPointsToken<AdminMiddleware>, ClientError> {
        let address = self.contract_address.ok_or(ClientError::NotConfigured)?;
        let signer = self.signer.clone().ok_or(ClientError::SignerUnavailable)?;
        Ok(EduPointsToken::new(address, signer))
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Bounds a single RPC round trip.
    async fn rpc<T, E, F>(&self, what: &str, fut: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.throttle().await;
        match tokio::time::timeout(self.rpc_timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ClientError::Contract(format!("{}: {}", what, e))),
            Err(_) => Err(ClientError::Timeout(what.to_string())),
        }
    }

    fn into_receipt(receipt: TransactionReceipt) -> Result<ChainReceipt, ClientError> {
        let transaction_hash = format!("{:?}", receipt.transaction_hash);
        if receipt.status != Some(U64::from(1)) {
            return Err(ClientError::Reverted(transaction_hash));
        }

        Ok(ChainReceipt {
            transaction_hash,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            status: receipt.status.map(|s| s.as_u64()),
        })
    }
}

fn parse_address(raw: &str) -> Result<Address, ClientError> {
    raw.parse::<Address>()
        .map_err(|_| ClientError::InvalidAddress(raw.to_string()))
}

#[async_trait]
impl TokenClient for EduPointsClient {
    async fn award_points(
        &self,
        wallet_address: &str,
        points: &str,
        description: &str,
        achievement_type: AchievementType,
    ) -> Result<ChainReceipt, ClientError> {
        let contract = self.writer()?;
        let student = parse_address(wallet_address)?;
        let amount = parse_ether(points).map_err(|_| ClientError::InvalidAmount(points.to_string()))?;

        let call = contract.award_points(student, amount, description.to_string(), achievement_type.code());
        let pending = self.rpc("awardPoints", call.send()).await?;
        let tx_hash = format!("{:?}", pending.tx_hash());
        debug!("awardPoints submitted: {} ({} points to {})", tx_hash, points, wallet_address);

        let receipt = match tokio::time::timeout(self.confirmation_timeout, pending).await {
            Ok(Ok(Some(receipt))) => receipt,
            Ok(Ok(None)) => return Err(ClientError::Dropped(tx_hash)),
            Ok(Err(e)) => return Err(ClientError::Provider(e.to_string())),
            Err(_) => return Err(ClientError::Timeout(tx_hash)),
        };

        let receipt = Self::into_receipt(receipt)?;
        info!(
            "Awarded {} points to {} for {}: {}",
            points, wallet_address, description, receipt.transaction_hash
        );
        Ok(receipt)
    }

    async fn balance_of(&self, wallet_address: &str) -> Result<String, ClientError> {
        let contract = self.reader()?;
        let account = parse_address(wallet_address)?;

        let balance = self.rpc("balanceOf", contract.balance_of(account).call()).await?;
        Ok(format_ether(balance))
    }

    async fn get_student_summary(&self, wallet_address: &str) -> Result<StudentSummary, ClientError> {
        let contract = self.reader()?;
        let student = parse_address(wallet_address)?;

        let (is_registered, earned, spent, balance, staked, achievements) = self
            .rpc("getStudentSummary", contract.get_student_summary(student).call())
            .await?;

        Ok(StudentSummary {
            is_registered,
            total_points_earned: format_ether(earned),
            total_points_spent: format_ether(spent),
            current_balance: format_ether(balance),
            staked_points: format_ether(staked),
            achievement_count: achievements.low_u64(),
        })
    }

    async fn register_student(&self, registration: &StudentRegistration) -> Result<ChainReceipt, ClientError> {
        let contract = self.writer()?;
        let wallet = parse_address(&registration.wallet_address)?;

        let call = contract.register_student(
            registration.name.clone(),
            registration.email.clone(),
            registration.student_id.clone(),
            registration.department.clone(),
            wallet,
        );
        let pending = self.rpc("registerStudent", call.send()).await?;
        let tx_hash = format!("{:?}", pending.tx_hash());

        let receipt = match tokio::time::timeout(self.confirmation_timeout, pending).await {
            Ok(Ok(Some(receipt))) => receipt,
            Ok(Ok(None)) => return Err(ClientError::Dropped(tx_hash)),
            Ok(Err(e)) => return Err(ClientError::Provider(e.to_string())),
            Err(_) => return Err(ClientError::Timeout(tx_hash)),
        };

        let receipt = Self::into_receipt(receipt)?;
        info!(
            "Registered student {} on chain: {}",
            registration.student_id, receipt.transaction_hash
        );
        Ok(receipt)
    }

    async fn is_email_registered(&self, email: &str) -> Result<bool, ClientError> {
        let contract = self.reader()?;
        self.rpc("isEmailRegistered", contract.is_email_registered(email.to_string()).call())
            .await
    }

    async fn is_student_id_registered(&self, student_id: &str) -> Result<bool, ClientError> {
        let contract = self.reader()?;
        self.rpc(
            "isStudentIdRegistered",
            contract.is_student_id_registered(student_id.to_string()).call(),
        )
        .await
    }
}
