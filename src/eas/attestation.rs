//! EAS contract client for on-chain attestations.
//!
//! # Responsibilities
//! - Create single and batched attestations
//! - Read attestations back and check their validity
//! - Revoke on-chain attestations after checking they can be revoked
//! - Anchor off-chain attestation UIDs (timestamp / off-chain revocation)

use alloy::primitives::{Address, Bytes, TxHash, B256, U256};
use alloy::rpc::types::TransactionReceipt;

use crate::blockchain::transaction::{estimate_call, send_call};
use crate::blockchain::{BlockchainClient, BlockchainError, GasPlan};
use crate::eas::contracts::IEAS::{
    self, Attestation, AttestationRequest, AttestationRequestData, MultiAttestationRequest,
    RevocationRequest, RevocationRequestData,
};
use crate::eas::types::{decode_events, EasError, EasResult};

/// Parameters of one on-chain attestation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestParams {
    pub schema: B256,
    pub recipient: Address,
    /// Unix seconds; 0 means the attestation never expires.
    pub expiration_time: u64,
    pub revocable: bool,
    pub ref_uid: B256,
    pub data: Bytes,
    /// Wei forwarded to the schema resolver.
    pub value: U256,
}

impl AttestParams {
    fn request_data(&self) -> AttestationRequestData {
        AttestationRequestData {
            recipient: self.recipient,
            expirationTime: self.expiration_time,
            revocable: self.revocable,
            refUID: self.ref_uid,
            data: self.data.clone(),
            value: self.value,
        }
    }
}

/// Build one `multiAttest` request per schema, keeping first-seen order.
pub fn group_by_schema(params: &[AttestParams]) -> Vec<MultiAttestationRequest> {
    let mut requests: Vec<MultiAttestationRequest> = Vec::new();
    for p in params {
        match requests.iter_mut().find(|r| r.schema == p.schema) {
            Some(request) => request.data.push(p.request_data()),
            None => requests.push(MultiAttestationRequest {
                schema: p.schema,
                data: vec![p.request_data()],
            }),
        }
    }
    requests
}

/// Outcome of a confirmed state-changing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

impl TxOutcome {
    fn from_receipt(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        }
    }
}

/// Why an attestation cannot be revoked, if it cannot.
pub fn check_revocable(attestation: &Attestation) -> EasResult<()> {
    if !attestation.revocable {
        return Err(EasError::NotRevocable(attestation.uid));
    }
    if attestation.revocationTime != 0 {
        return Err(EasError::AlreadyRevoked(attestation.uid));
    }
    Ok(())
}

/// Client for the EAS contract at a fixed address.
#[derive(Debug, Clone)]
pub struct EasClient {
    client: BlockchainClient,
    address: Address,
}

impl EasClient {
    pub fn new(client: BlockchainClient, address: Address) -> Self {
        Self { client, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn blockchain(&self) -> &BlockchainClient {
        &self.client
    }

    fn writer(&self) -> EasResult<IEAS::IEASInstance<alloy::providers::DynProvider>> {
        Ok(IEAS::new(self.address, self.client.signing_provider()?.clone()))
    }

    fn signer(&self) -> EasResult<Address> {
        self.client.signer().ok_or_else(|| {
            EasError::Blockchain(BlockchainError::NotAvailable(
                "sending a transaction needs a wallet".to_string(),
            ))
        })
    }

    /// Create one attestation and return its UID.
    pub async fn attest(&self, params: &AttestParams) -> EasResult<(B256, TxOutcome)> {
        let eas = self.writer()?;
        let request = AttestationRequest {
            schema: params.schema,
            data: params.request_data(),
        };
        let call = eas.attest(request).value(params.value).from(self.signer()?);
        let plan = self.client.plan_gas(estimate_call(&call).await?).await?;

        tracing::info!(
            schema = %params.schema,
            recipient = %params.recipient,
            gas_limit = plan.gas_limit,
            "Creating attestation"
        );
        let tx_hash = send_call(call, Some(&plan)).await?;
        let receipt = self.client.wait_for_confirmation(tx_hash).await?;

        let uid = decode_events::<IEAS::Attested>(&receipt, self.address)
            .into_iter()
            .next()
            .map(|event| event.uid)
            .ok_or(EasError::MissingEvent {
                tx_hash,
                event: "Attested",
            })?;
        tracing::info!(uid = %uid, tx_hash = %tx_hash, "Attestation created");
        Ok((uid, TxOutcome::from_receipt(&receipt)))
    }

    /// Create several attestations in one `multiAttest` transaction.
    ///
    /// UIDs are returned in log order: requests grouped by schema, each group
    /// in input order.
    pub async fn multi_attest(&self, params: &[AttestParams]) -> EasResult<(Vec<B256>, TxOutcome)> {
        let eas = self.writer()?;
        let total_value = params.iter().fold(U256::ZERO, |acc, p| acc + p.value);
        let call = eas
            .multiAttest(group_by_schema(params))
            .value(total_value)
            .from(self.signer()?);
        let plan = self.client.plan_gas(estimate_call(&call).await?).await?;

        tracing::info!(count = params.len(), gas_limit = plan.gas_limit, "Creating attestations");
        let tx_hash = send_call(call, Some(&plan)).await?;
        let receipt = self.client.wait_for_confirmation(tx_hash).await?;

        let uids: Vec<B256> = decode_events::<IEAS::Attested>(&receipt, self.address)
            .into_iter()
            .map(|event| event.uid)
            .collect();
        if uids.len() != params.len() {
            return Err(EasError::MissingEvent {
                tx_hash,
                event: "Attested",
            });
        }
        Ok((uids, TxOutcome::from_receipt(&receipt)))
    }

    /// Gas plan for attesting `params` (one call, or `multiAttest` for several).
    pub async fn estimate_attest(&self, params: &[AttestParams]) -> EasResult<GasPlan> {
        let eas = self.writer()?;
        let from = self.signer()?;
        let estimate = match params {
            [single] => {
                let request = AttestationRequest {
                    schema: single.schema,
                    data: single.request_data(),
                };
                estimate_call(&eas.attest(request).value(single.value).from(from)).await?
            }
            _ => {
                let total_value = params.iter().fold(U256::ZERO, |acc, p| acc + p.value);
                let call = eas.multiAttest(group_by_schema(params)).value(total_value).from(from);
                estimate_call(&call).await?
            }
        };
        Ok(self.client.plan_gas(estimate).await?)
    }

    /// Fetch an attestation. An all-zero result means the UID is unknown.
    pub async fn get_attestation(&self, uid: B256) -> EasResult<Attestation> {
        let address = self.address;
        let attestation = self
            .client
            .read("get attestation", |p| async move {
                IEAS::new(address, p).getAttestation(uid).call().await
            })
            .await?;
        if attestation.uid.is_zero() {
            return Err(EasError::AttestationNotFound(uid));
        }
        Ok(attestation)
    }

    /// The contract's own validity check.
    pub async fn is_valid(&self, uid: B256) -> EasResult<bool> {
        let address = self.address;
        Ok(self
            .client
            .read("check attestation validity", |p| async move {
                IEAS::new(address, p).isAttestationValid(uid).call().await
            })
            .await?)
    }

    /// Revoke an attestation after checking it exists, is revocable, and is
    /// not revoked yet.
    pub async fn revoke(&self, uid: B256) -> EasResult<TxOutcome> {
        let attestation = self.get_attestation(uid).await?;
        check_revocable(&attestation)?;

        let eas = self.writer()?;
        let call = eas.revoke(revocation(attestation.schema, uid)).from(self.signer()?);
        let plan = self.client.plan_gas(estimate_call(&call).await?).await?;

        tracing::info!(uid = %uid, gas_limit = plan.gas_limit, "Revoking attestation");
        let tx_hash = send_call(call, Some(&plan)).await?;
        let receipt = self.client.wait_for_confirmation(tx_hash).await?;

        if decode_events::<IEAS::Revoked>(&receipt, self.address).is_empty() {
            return Err(EasError::MissingEvent {
                tx_hash,
                event: "Revoked",
            });
        }
        tracing::info!(uid = %uid, tx_hash = %tx_hash, "Attestation revoked");
        Ok(TxOutcome::from_receipt(&receipt))
    }

    pub async fn estimate_revoke(&self, uid: B256) -> EasResult<GasPlan> {
        let attestation = self.get_attestation(uid).await?;
        check_revocable(&attestation)?;
        let eas = self.writer()?;
        let call = eas.revoke(revocation(attestation.schema, uid)).from(self.signer()?);
        let estimate = estimate_call(&call).await?;
        Ok(self.client.plan_gas(estimate).await?)
    }

    /// Anchor `data` (usually an off-chain UID) with the current block time.
    pub async fn timestamp(&self, data: B256) -> EasResult<(u64, TxOutcome)> {
        let eas = self.writer()?;
        let call = eas.timestamp(data).from(self.signer()?);
        let plan = self.client.plan_gas(estimate_call(&call).await?).await?;

        tracing::info!(data = %data, "Timestamping");
        let tx_hash = send_call(call, Some(&plan)).await?;
        let receipt = self.client.wait_for_confirmation(tx_hash).await?;

        let time = decode_events::<IEAS::Timestamped>(&receipt, self.address)
            .into_iter()
            .next()
            .map(|event| event.timestamp)
            .ok_or(EasError::MissingEvent {
                tx_hash,
                event: "Timestamped",
            })?;
        Ok((time, TxOutcome::from_receipt(&receipt)))
    }

    pub async fn estimate_timestamp(&self, data: B256) -> EasResult<GasPlan> {
        let eas = self.writer()?;
        let estimate = estimate_call(&eas.timestamp(data).from(self.signer()?)).await?;
        Ok(self.client.plan_gas(estimate).await?)
    }

    /// Record the revocation of an off-chain attestation UID.
    pub async fn revoke_offchain(&self, data: B256) -> EasResult<(u64, TxOutcome)> {
        let eas = self.writer()?;
        let call = eas.revokeOffchain(data).from(self.signer()?);
        let plan = self.client.plan_gas(estimate_call(&call).await?).await?;

        tracing::info!(data = %data, "Revoking off-chain attestation");
        let tx_hash = send_call(call, Some(&plan)).await?;
        let receipt = self.client.wait_for_confirmation(tx_hash).await?;

        let time = decode_events::<IEAS::RevokedOffchain>(&receipt, self.address)
            .into_iter()
            .next()
            .map(|event| event.timestamp)
            .ok_or(EasError::MissingEvent {
                tx_hash,
                event: "RevokedOffchain",
            })?;
        Ok((time, TxOutcome::from_receipt(&receipt)))
    }

    pub async fn estimate_revoke_offchain(&self, data: B256) -> EasResult<GasPlan> {
        let eas = self.writer()?;
        let estimate = estimate_call(&eas.revokeOffchain(data).from(self.signer()?)).await?;
        Ok(self.client.plan_gas(estimate).await?)
    }

    /// Time `data` was timestamped, or 0.
    pub async fn get_timestamp(&self, data: B256) -> EasResult<u64> {
        let address = self.address;
        Ok(self
            .client
            .read("get timestamp", |p| async move {
                IEAS::new(address, p).getTimestamp(data).call().await
            })
            .await?)
    }

    /// Time `revoker` revoked `data` off-chain, or 0.
    pub async fn get_revoke_offchain(&self, revoker: Address, data: B256) -> EasResult<u64> {
        let address = self.address;
        Ok(self
            .client
            .read("get off-chain revocation", |p| async move {
                IEAS::new(address, p).getRevokeOffchain(revoker, data).call().await
            })
            .await?)
    }

    /// Contract version, used as the EIP-712 domain version.
    pub async fn version(&self) -> EasResult<String> {
        let address = self.address;
        Ok(self
            .client
            .read("get EAS version", |p| async move {
                IEAS::new(address, p).version().call().await
            })
            .await?)
    }
}

fn revocation(schema: B256, uid: B256) -> RevocationRequest {
    RevocationRequest {
        schema,
        data: RevocationRequestData {
            uid,
            value: U256::ZERO,
        },
    }
}
