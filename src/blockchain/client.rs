//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Query chain state (chain id, block number, balances, receipts, gas price)
//! - Handle timeouts and network errors gracefully
//! - Hand out a signing provider for contract writes

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId, NetworkConfig};
use crate::blockchain::wallet::Wallet;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    /// Address of the attached wallet, if the primary provider can sign.
    signer: Option<Address>,
    /// Configuration.
    config: NetworkConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a read-only client.
    pub fn new(config: NetworkConfig) -> BlockchainResult<Self> {
        Self::build(config, None)
    }

    /// Create a client whose primary provider signs with `wallet`.
    pub fn with_wallet(config: NetworkConfig, wallet: &Wallet) -> BlockchainResult<Self> {
        if wallet.chain_id() != config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: config.chain_id,
                actual: wallet.chain_id(),
            });
        }
        Self::build(config, Some(wallet))
    }

    fn build(config: NetworkConfig, wallet: Option<&Wallet>) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let primary = match wallet {
            Some(wallet) => ProviderBuilder::new()
                .wallet(wallet.ethereum_wallet())
                .connect_http(primary_url)
                .erased(),
            None => ProviderBuilder::new().connect_http(primary_url).erased(),
        };
        providers.push(primary);

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(ProviderBuilder::new().connect_http(url).erased());
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::debug!(
            rpc_url = %config.rpc_url,
            chain_id = config.chain_id,
            failovers = providers.len() - 1,
            signer = ?wallet.map(Wallet::address),
            "Blockchain client initialized"
        );

        Ok(Self {
            providers,
            signer: wallet.map(Wallet::address),
            config,
            timeout_duration,
        })
    }

    /// Run a read against each provider in turn until one answers in time.
    pub async fn read<T, E, F, Fut>(&self, what: &str, op: F) -> BlockchainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match timeout(self.timeout_duration, op(provider.clone())).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => {
                    tracing::warn!(provider_idx = i, error = %e, what, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(provider_idx = i, what, "RPC timeout, trying next provider");
                }
            }
        }
        Err(BlockchainError::Rpc(format!("All RPC providers failed to {}", what)))
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.config.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.config.chain_id,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.read("get chain id", |p| async move { p.get_chain_id().await })
            .await
            .map(ChainId)
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.read("get block number", |p| async move { p.get_block_number().await })
            .await
    }

    /// Get the balance of an address.
    pub async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        self.read("get balance", |p| async move { p.get_balance(address).await })
            .await
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        self.read("get receipt", |p| async move {
            p.get_transaction_receipt(tx_hash).await
        })
        .await
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        self.read("get gas price", |p| async move { p.get_gas_price().await })
            .await
    }

    /// The primary provider. Signs transactions when a wallet is attached.
    pub fn provider(&self) -> &DynProvider {
        &self.providers[0]
    }

    /// The primary provider, failing when no wallet is attached.
    pub fn signing_provider(&self) -> BlockchainResult<&DynProvider> {
        if self.signer.is_none() {
            return Err(BlockchainError::NotAvailable(
                "client has no wallet attached".to_string(),
            ));
        }
        Ok(self.provider())
    }

    /// Address of the attached wallet.
    pub fn signer(&self) -> Option<Address> {
        self.signer
    }

    /// Get the configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Get the number of confirmation blocks required.
    pub fn confirmation_blocks(&self) -> u32 {
        self.config.confirmation_blocks
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("signer", &self.signer)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
