//! Gas planning, submission, and confirmation monitoring.
//!
//! # Responsibilities
//! - Turn a node gas estimate into a bounded gas plan
//! - Submit contract calls with that plan
//! - Monitor confirmations

use std::time::Duration;

use alloy::contract::SolCallBuilder;
use alloy::primitives::{TxHash, U256};
use alloy::providers::DynProvider;
use alloy::rpc::types::TransactionReceipt;
use alloy::sol_types::SolCall;
use tokio::time::{interval, timeout};

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, NetworkConfig};

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Gas limit and price to submit a transaction with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPlan {
    /// Raw estimate returned by the node.
    pub estimated_gas: u64,
    /// Estimate with the configured limit multiplier applied.
    pub gas_limit: u64,
    /// Node gas price with the configured price multiplier applied, in wei.
    pub gas_price: u128,
}

impl GasPlan {
    /// Build a plan from a node estimate and the current gas price.
    ///
    /// Fails when the node's price is above `max_gas_price_gwei`. The
    /// multiplied price is clamped to that cap.
    pub fn from_estimate(
        estimated_gas: u64,
        gas_price: u128,
        config: &NetworkConfig,
    ) -> BlockchainResult<Self> {
        let max_gas_price = config.max_gas_price_gwei as u128 * WEI_PER_GWEI;
        if gas_price > max_gas_price {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: (gas_price / WEI_PER_GWEI) as u64,
                max_gwei: config.max_gas_price_gwei,
            });
        }

        let gas_limit = (estimated_gas as f64 * config.gas_limit_multiplier).ceil() as u64;
        let gas_price = ((gas_price as f64 * config.gas_price_multiplier) as u128).min(max_gas_price);

        Ok(Self {
            estimated_gas,
            gas_limit,
            gas_price,
        })
    }

    /// Upper bound on what the transaction can cost, in wei.
    pub fn max_cost_wei(&self) -> U256 {
        U256::from(self.gas_limit) * U256::from(self.gas_price)
    }
}

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationStatus {
    /// Transaction is pending in mempool.
    Pending,
    /// Transaction has been mined but not enough confirmations.
    Confirming { current: u32, required: u32 },
    /// Transaction is confirmed with required block depth.
    Confirmed { block_number: u64 },
    /// Transaction reverted.
    Failed(String),
}

impl ConfirmationStatus {
    /// Classify a receipt against the current chain head.
    ///
    /// A receipt's own block counts as the first confirmation.
    pub fn evaluate(
        receipt: Option<&TransactionReceipt>,
        current_block: u64,
        required: u32,
    ) -> Self {
        let Some(receipt) = receipt else {
            return ConfirmationStatus::Pending;
        };
        if !receipt.status() {
            return ConfirmationStatus::Failed("Transaction reverted".to_string());
        }
        let tx_block = receipt.block_number.unwrap_or(current_block);
        Self::from_depth(tx_block, current_block, required)
    }

    fn from_depth(tx_block: u64, current_block: u64, required: u32) -> Self {
        let current = (current_block.saturating_sub(tx_block) + 1).min(u32::MAX as u64) as u32;
        if current >= required {
            ConfirmationStatus::Confirmed {
                block_number: tx_block,
            }
        } else {
            ConfirmationStatus::Confirming { current, required }
        }
    }
}

/// Ask the node how much gas a contract call needs.
pub async fn estimate_call<C: SolCall>(
    call: &SolCallBuilder<&DynProvider, C>,
) -> BlockchainResult<u64> {
    call.estimate_gas()
        .await
        .map_err(|e| BlockchainError::Contract(format!("Gas estimation failed: {}", e)))
}

/// Submit a contract call, applying `plan` when given.
///
/// Without a plan the provider's fillers choose gas limit and fees.
pub async fn send_call<C: SolCall>(
    call: SolCallBuilder<&DynProvider, C>,
    plan: Option<&GasPlan>,
) -> BlockchainResult<TxHash> {
    let call = match plan {
        Some(plan) => call.gas(plan.gas_limit).gas_price(plan.gas_price),
        None => call,
    };
    let pending = call
        .send()
        .await
        .map_err(|e| BlockchainError::Contract(format!("Transaction submission failed: {}", e)))?;
    let tx_hash = *pending.tx_hash();
    tracing::info!(tx_hash = %tx_hash, "Transaction submitted");
    Ok(tx_hash)
}

impl BlockchainClient {
    /// Fetch the current gas price and build a plan around `estimated_gas`.
    pub async fn plan_gas(&self, estimated_gas: u64) -> BlockchainResult<GasPlan> {
        let gas_price = self.get_gas_price().await?;
        GasPlan::from_estimate(estimated_gas, gas_price, self.config())
    }

    /// Wait for a transaction to reach the configured confirmation depth.
    ///
    /// Returns the receipt, or an error if the transaction reverted or the
    /// configured confirmation timeout elapsed. Failed polls are retried.
    pub async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<TransactionReceipt> {
        let required_confirmations = self.confirmation_blocks();
        let timeout_duration = Duration::from_secs(self.config().confirmation_timeout_secs);
        let poll_interval = Duration::from_secs(2);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                let receipt = match self.get_transaction_receipt(tx_hash).await {
                    Ok(receipt) => receipt,
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                        continue;
                    }
                };
                let current_block = match self.get_block_number().await {
                    Ok(block) => block,
                    Err(e) => {
                        tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number poll failed");
                        continue;
                    }
                };

                match ConfirmationStatus::evaluate(
                    receipt.as_ref(),
                    current_block,
                    required_confirmations,
                ) {
                    ConfirmationStatus::Pending => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    }
                    ConfirmationStatus::Confirming { current, required } => {
                        tracing::debug!(
                            tx_hash = %tx_hash,
                            confirmations = current,
                            required = required,
                            "Waiting for confirmations"
                        );
                    }
                    ConfirmationStatus::Confirmed { block_number } => {
                        tracing::info!(tx_hash = %tx_hash, block_number, "Transaction confirmed");
                        if let Some(receipt) = receipt {
                            return Ok(receipt);
                        }
                    }
                    ConfirmationStatus::Failed(reason) => {
                        return Err(BlockchainError::Reverted(format!("{} ({})", reason, tx_hash)));
                    }
                }
            }
        })
        .await;

        match result {
            Ok(receipt) => receipt,
            Err(_) => Err(BlockchainError::ConfirmationTimeout(required_confirmations)),
        }
    }
}
