//! Attestation error type and shared helpers.

use std::time::{SystemTime, UNIX_EPOCH};

use alloy::primitives::{Address, TxHash, B256};
use alloy::rpc::types::TransactionReceipt;
use alloy::sol_types::SolEvent;
use thiserror::Error;

use crate::blockchain::BlockchainError;

/// Errors from schema, attestation and proof operations.
#[derive(Debug, Error)]
pub enum EasError {
    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error("Invalid schema definition '{definition}': {reason}")]
    InvalidSchema { definition: String, reason: String },

    #[error("Missing value for schema field '{0}'")]
    MissingField(String),

    #[error("Cannot encode field '{field}': {reason}")]
    Encoding { field: String, reason: String },

    #[error("Cannot decode attestation data: {0}")]
    Decoding(String),

    #[error("Schema {0} is not registered")]
    SchemaNotFound(B256),

    #[error("Attestation {0} not found")]
    AttestationNotFound(B256),

    #[error("Attestation {0} is not revocable")]
    NotRevocable(B256),

    #[error("Attestation {0} is already revoked")]
    AlreadyRevoked(B256),

    #[error("Transaction {tx_hash} emitted no {event} event")]
    MissingEvent {
        tx_hash: TxHash,
        event: &'static str,
    },

    #[error("Signature verification failed: {0}")]
    InvalidSignature(String),

    #[error("Merkle proof error: {0}")]
    Proof(String),
}

/// Result type for attestation operations.
pub type EasResult<T> = Result<T, EasError>;

/// Events of type `E` emitted by `contract` in `receipt`, in log order.
pub(crate) fn decode_events<E: SolEvent>(receipt: &TransactionReceipt, contract: Address) -> Vec<E> {
    receipt
        .inner
        .logs()
        .iter()
        .filter(|log| log.address() == contract)
        .filter_map(|log| log.log_decode::<E>().ok())
        .map(|decoded| decoded.inner.data)
        .collect()
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blockchain_error_is_transparent() {
        let err = EasError::from(BlockchainError::Rpc("boom".to_string()));
        assert_eq!(err.to_string(), "RPC error: boom");
    }

    #[test]
    fn test_unix_now_is_recent() {
        // 2024-01-01T00:00:00Z
        assert!(unix_now() > 1_704_067_200);
    }
}
